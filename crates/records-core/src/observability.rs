//! Observability - ログ初期化と集計ビュー
//!
//! ライブラリ側は `tracing` のマクロでイベントを出すだけ。
//! subscriber の設定はバイナリ（records-cli など）が起動時に一度だけ行う。

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// TelemetryError は subscriber の初期化エラー
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter `{filter}`: {source}")]
    Filter {
        filter: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Number of records per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub incomplete: usize,
    pub completed: usize,
}

impl RecordCounts {
    pub fn total(&self) -> usize {
        self.incomplete + self.completed
    }
}

/// Install a stderr `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (e.g. `"info"` or
/// `"records_core=debug,info"`) is used. Fails if a global subscriber is
/// already installed or the filter does not parse.
pub fn init_tracing(default_filter: &str) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(default_filter)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(TelemetryError::Install)
}

fn parse_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|source| TelemetryError::Filter {
        filter: directives.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_filter_is_a_typed_error() {
        let err = parse_filter("records_core=loudest").unwrap_err();
        assert!(matches!(&err, TelemetryError::Filter { filter, .. } if filter == "records_core=loudest"));
        assert!(err.to_string().starts_with("invalid log filter"));

        parse_filter("records_core=debug,info").unwrap();
    }

    #[test]
    fn second_install_is_rejected() {
        // the first call may lose to another test's subscriber; the second never wins
        let _ = init_tracing("warn");
        assert!(matches!(init_tracing("warn"), Err(TelemetryError::Install(_))));
    }

    #[test]
    fn counts_serialize_by_status() {
        let counts = RecordCounts {
            incomplete: 3,
            completed: 2,
        };
        assert_eq!(counts.total(), 5);
        assert_eq!(
            serde_json::to_value(counts).unwrap(),
            serde_json::json!({"incomplete": 3, "completed": 2})
        );
    }
}
