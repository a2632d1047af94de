//! Run completion markers
//!
//! Every run ends with a block of `KEY=value` lines that log collectors parse
//! to tell a finished run from a crashed one. The block always ends with
//! `ENDLOGGING=1`.

use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::info;

use crate::constants::logging;
use crate::errors::AppError;

/// Completion record of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Name of the entry point that ran
    pub function_name: String,
    /// Local start time
    pub started_at: DateTime<Local>,
    /// Wall-clock duration
    pub elapsed: Duration,
    /// Error type and message, if the run failed
    pub error: Option<(String, String)>,
}

impl RunReport {
    pub fn success(
        function_name: impl Into<String>,
        started_at: DateTime<Local>,
        elapsed: Duration,
    ) -> Self {
        Self {
            function_name: function_name.into(),
            started_at,
            elapsed,
            error: None,
        }
    }

    pub fn failure(
        function_name: impl Into<String>,
        started_at: DateTime<Local>,
        elapsed: Duration,
        error: &AppError,
    ) -> Self {
        Self {
            function_name: function_name.into(),
            started_at,
            elapsed,
            error: Some((error.type_name().to_string(), error.to_string())),
        }
    }

    /// Unix seconds of the start time
    pub fn run_id(&self) -> i64 {
        self.started_at.timestamp()
    }

    /// Marker lines in emission order
    pub fn markers(&self) -> Vec<String> {
        let status = if self.error.is_some() { "ERROR" } else { "SUCCESS" };
        let mut lines = vec![
            format!("SCRIPT_FINISHED_STATUS={}", status),
            format!("DATE={}", self.started_at.format("%Y-%m-%d")),
            format!("EXECUTION_TIME={:.3} сек", self.elapsed.as_secs_f64()),
        ];
        if let Some((error_type, message)) = &self.error {
            lines.push(format!("ERROR_TYPE={}", error_type));
            lines.push(format!("ERROR_MESSAGE={}", message));
        }
        lines.push(format!("FUNCTION_NAME={}", self.function_name));
        lines.push(format!("RUN_ID={}", self.run_id()));
        lines.push("ENDLOGGING=1".to_string());
        lines
    }

    /// Emit the markers at info level on the completion target
    pub fn log(&self) {
        for line in self.markers() {
            info!(target: logging::COMPLETION_TARGET, "{}", line);
        }
    }
}
