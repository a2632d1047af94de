//! Live API tests
//!
//! These tests need real tokens and network access and are ignored by
//! default. Put the tokens into `.env` or export them, then run:
//!
//! `cargo test live_ -- --ignored --nocapture`

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::app::campaign::CampaignSchema;
    use crate::app::client::{
        DirectClient, DirectConfig, HttpConfig, HttpHandler, MetricaClient, MetricaConfig,
    };
    use crate::app::dates::DateRange;
    use crate::auth::Tokens;
    use crate::constants::clients;

    fn init() -> Option<(Tokens, Arc<HttpHandler>)> {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(false)
            .try_init()
            .ok();
        dotenv::dotenv().ok();

        let tokens = match Tokens::from_env() {
            Ok(tokens) => tokens,
            Err(e) => {
                println!("Skipping live test: {}", e);
                return None;
            }
        };
        let handler = HttpHandler::from_config(&HttpConfig::default())
            .expect("Failed to build HTTP handler");
        Some((tokens, Arc::new(handler)))
    }

    #[tokio::test]
    #[ignore] // Requires real Direct token
    async fn live_direct_report() {
        let Some((tokens, transport)) = init() else {
            return;
        };
        let client = DirectClient::new(
            transport,
            tokens.direct,
            DirectConfig::default(),
            CampaignSchema::default(),
        );
        let range = DateRange::last_days(DateRange::today(), 2);
        let logins = vec![clients::EAPTEKA_LOGINS[0].to_string()];

        let table = client.fetch_all(&logins, &range).await;
        println!("Direct: {} rows, columns {:?}", table.len(), table.columns());
        assert!(table.is_empty() || table.column_index("Source").is_some());
    }

    #[tokio::test]
    #[ignore] // Requires real Metrica token
    async fn live_metrica_report() {
        let Some((tokens, transport)) = init() else {
            return;
        };
        let client = MetricaClient::new(
            transport,
            tokens.metrica,
            MetricaConfig::default(),
            CampaignSchema::default(),
        );
        let range = DateRange::last_days(DateRange::today(), 2);

        let table = client
            .fetch_all(clients::EAPTEKA_METRICA_COUNTER, &range)
            .await;
        println!("Metrica: {} rows", table.len());
        for row in table.rows().iter().take(5) {
            println!("  {:?}", row);
        }
    }
}
