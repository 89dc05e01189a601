//! Logger setup.
//!
//! Everything in the crate logs through the `log` facade; this module only
//! installs `env_logger` as the backend, once per process.

use std::sync::Once;

use serde::{Deserialize, Serialize};

/// Filter used when neither the config nor `RUST_LOG` sets one. The wgpu
/// stack is very chatty at `info`.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// ANSI coloring for log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl From<ColorMode> for env_logger::WriteStyle {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Auto => env_logger::WriteStyle::Auto,
            ColorMode::Always => env_logger::WriteStyle::Always,
            ColorMode::Never => env_logger::WriteStyle::Never,
        }
    }
}

/// Logger configuration.
///
/// `filter` follows the `env_logger` filter syntax (e.g. `"kiln=debug,wgpu_core=warn"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub color: ColorMode,
}

impl LoggingConfig {
    /// Filter string that will be applied: config first, then `RUST_LOG`,
    /// then [`DEFAULT_FILTER`].
    pub fn resolve_filter(&self, rust_log: Option<String>) -> String {
        self.filter
            .clone()
            .or(rust_log)
            .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
    }
}

static INIT: Once = Once::new();

/// Install the global logger. Later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolve_filter(std::env::var("RUST_LOG").ok());
        env_logger::Builder::new()
            .parse_filters(&filter)
            .write_style(config.color.into())
            .init();
        log::debug!("logging initialized with filter '{filter}'");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_filter_wins_over_env() {
        let config = LoggingConfig {
            filter: Some("kiln=trace".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_filter(Some("warn".into())), "kiln=trace");
    }

    #[test]
    fn env_filter_used_when_config_is_silent() {
        let config = LoggingConfig::default();
        assert_eq!(config.resolve_filter(Some("warn".into())), "warn");
        assert_eq!(config.resolve_filter(None), DEFAULT_FILTER);
    }

    #[test]
    fn color_mode_parses_lowercase() {
        let config: LoggingConfig = serde_json::from_str(r#"{ "color": "never" }"#).unwrap();
        assert_eq!(config.color, ColorMode::Never);
        assert!(config.filter.is_none());
    }
}
