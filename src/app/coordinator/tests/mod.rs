//! End-to-end coordinator runs against a scripted transport

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tempfile::TempDir;

use crate::app::cache::{CacheKey, SaveOutcome};
use crate::app::client::tests::ScriptedTransport;
use crate::app::client::ApiResponse;
use crate::app::coordinator::{Coordinator, RunOptions};
use crate::app::dates::parse_date;
use crate::app::models::Source;
use crate::auth::Tokens;
use crate::config::{AppConfig, ClientProfile};
use crate::errors::AppError;

const DIRECT: &str = "https://direct.test";
const METRICA: &str = "https://metrica.test";
const APPMETRICA: &str = "https://appmetrica.test";

const DIRECT_REPORT: &str = "all_reports1\n\
Date\tCampaignName\tCampaignId\tDevice\tImpressions\tClicks\tCost\n\
2024-01-01\tmsk-search-auto\t1\tDESKTOP\t10\t2\t1000000\n\
2024-01-02\tspb-rsya\t2\tMOBILE\t20\t4\t2000000\n\
Total rows: 2\n";

const METRICA_BODY: &str = r#"{"data": [
    {"dimensions": [{"name": "2024-01-02"}, {"name": "msk-search-auto|1"}, {"name": "Smartphones"}],
     "metrics": [2.0, 3000.0]}
]}"#;

const APPMETRICA_BODY: &str =
    r#"{"data": [{"dimensions": [{"name": "2024-01-02"}], "metrics": [500.0, 1.0]}]}"#;

fn tokens() -> Tokens {
    Tokens {
        direct: "d".to_string(),
        metrica: "m".to_string(),
        appmetrica: "a".to_string(),
    }
}

fn profile(name: &str) -> ClientProfile {
    ClientProfile {
        name: name.to_string(),
        logins: vec![format!("{}-login", name)],
        metrica_counter: "100".to_string(),
        appmetrica_app: "200".to_string(),
    }
}

fn test_config(dir: &TempDir, clients: Vec<ClientProfile>) -> AppConfig {
    let mut config = AppConfig::default();
    config.output.folder = dir.path().join("data");
    config.direct.url = format!("{}/json/v5/reports", DIRECT);
    config.direct.account_pace = Duration::ZERO;
    config.direct.days = 2;
    config.metrica.url = format!("{}/stat/v1/data", METRICA);
    config.metrica.days = 2;
    config.appmetrica.url = format!("{}/stat/v1/data", APPMETRICA);
    config.appmetrica.days = 1;
    config.clients = clients;
    config
}

fn scripted() -> Arc<ScriptedTransport> {
    Arc::new(
        ScriptedTransport::new()
            .respond_always(DIRECT, ApiResponse::new(StatusCode::OK, DIRECT_REPORT))
            .respond_always(METRICA, ApiResponse::new(StatusCode::OK, METRICA_BODY))
            .respond_always(APPMETRICA, ApiResponse::new(StatusCode::OK, APPMETRICA_BODY)),
    )
}

fn options() -> RunOptions {
    RunOptions::all(parse_date("2024-01-03").unwrap())
}

#[tokio::test]
async fn test_full_pipeline_writes_three_caches() {
    let dir = TempDir::new().unwrap();
    let transport = scripted();
    let coordinator =
        Coordinator::new(test_config(&dir, vec![profile("acme")]), &tokens(), transport.clone())
            .unwrap();

    let stats = coordinator.run(&options()).await.unwrap();
    assert_eq!(stats.sources.len(), 3);
    assert_eq!(
        stats.sources[0].outcome,
        SaveOutcome::Created { rows: 2 }
    );

    let store = coordinator.store();
    let direct = store
        .load(&CacheKey::new("acme", Source::Direct))
        .unwrap()
        .unwrap();
    assert_eq!(direct.column_values("Cost"), vec!["1.2", "2.4"]);
    assert_eq!(direct.column_values("Source"), vec!["yandex", "yandex"]);

    let metrica = store
        .load(&CacheKey::new("acme", Source::Metrica))
        .unwrap()
        .unwrap();
    assert_eq!(metrica.column_values("Device"), vec!["MOBILE"]);

    // One AppMetrica request per Direct campaign for the single day
    let appmetrica = store
        .load(&CacheKey::new("acme", Source::AppMetrica))
        .unwrap()
        .unwrap();
    assert_eq!(
        appmetrica.column_values("CampaignName"),
        vec!["msk-search-auto", "spb-rsya"]
    );
    assert_eq!(appmetrica.column_values("Revenue"), vec!["500.0", "500.0"]);
    assert_eq!(transport.requests_to(APPMETRICA).len(), 2);
}

#[tokio::test]
async fn test_failed_client_does_not_stop_others() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, vec![profile("broken"), profile("good")]);

    // History without a Date column cannot be merged
    fs::create_dir_all(&config.output.folder).unwrap();
    fs::write(
        config.output.folder.join("broken_direct.csv"),
        "Day;Cost\n2023-01-01;1.0\n",
    )
    .unwrap();

    let coordinator = Coordinator::new(config, &tokens(), scripted()).unwrap();
    match coordinator.run(&options()).await {
        Err(AppError::ClientsFailed { clients }) => assert_eq!(clients, vec!["broken"]),
        other => panic!("Expected ClientsFailed, got {:?}", other),
    }

    let store = coordinator.store();
    assert!(store.path_for(&CacheKey::new("good", Source::AppMetrica)).exists());
    assert!(!store.path_for(&CacheKey::new("broken", Source::Metrica)).exists());
}

#[tokio::test]
async fn test_source_and_client_selection() {
    let dir = TempDir::new().unwrap();
    let transport = scripted();
    let coordinator = Coordinator::new(
        test_config(&dir, vec![profile("a"), profile("b")]),
        &tokens(),
        transport.clone(),
    )
    .unwrap();

    let options = options()
        .with_clients(vec!["b".to_string()])
        .with_sources(vec![Source::Metrica]);
    let stats = coordinator.run(&options).await.unwrap();

    assert_eq!(stats.sources.len(), 1);
    assert_eq!(stats.sources[0].client, "b");
    assert!(transport.requests_to(DIRECT).is_empty());
    assert_eq!(transport.requests_to(METRICA).len(), 1);
}

#[tokio::test]
async fn test_unknown_client_rejected_before_requests() {
    let dir = TempDir::new().unwrap();
    let transport = scripted();
    let coordinator =
        Coordinator::new(test_config(&dir, vec![profile("a")]), &tokens(), transport.clone())
            .unwrap();

    let result = coordinator
        .run(&options().with_clients(vec!["ghost".to_string()]))
        .await;
    assert!(matches!(result, Err(AppError::Config(_))));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_rerun_is_stable() {
    let dir = TempDir::new().unwrap();
    let coordinator =
        Coordinator::new(test_config(&dir, vec![profile("acme")]), &tokens(), scripted())
            .unwrap();

    coordinator.run(&options()).await.unwrap();
    let path = coordinator
        .store()
        .path_for(&CacheKey::new("acme", Source::Direct));
    let first = fs::read(&path).unwrap();

    coordinator.run(&options()).await.unwrap();
    assert_eq!(fs::read(&path).unwrap(), first);
}
