//! Tracing subscriber setup and one-object-per-line JSON output for frame reports.

use crate::config::LogConfig;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber: stdout, JSON lines or plain text, level from RUST_LOG or default.
    /// A second call is a no-op.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let result = if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stdout);
            tracing_subscriber::registry().with(filter).with(fmt).try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .try_init()
        };
        if result.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    }

    pub fn init_from(config: &LogConfig) {
        Self::init(config.json, &config.level);
    }

    /// Write `event` as a single JSON line (ndjson).
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(w, "{}", line)?;
        Ok(())
    }
}
