//! `[log]` section
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "json"        # or "console"
//! output = "stderr"      # or "stdout"
//! # extra filter directives, e.g. trace the helpdesk client only
//! directives = ["deskpulse_connectors::client=debug"]
//! ```
//!
//! A `--log-level` flag on the command line replaces `level` but keeps
//! `directives`.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// `console` for people, `json` for log shippers
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

/// Where log lines go; `metrics` and `engineer` print JSON on stdout, so
/// `stderr` keeps the two apart
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Extra `EnvFilter` directives appended after the level
    pub directives: Vec<String>,
}

impl LogConfig {
    /// Filter string for the subscriber
    ///
    /// `cli_level` overrides the configured level when given.
    pub fn filter(&self, cli_level: Option<&str>) -> String {
        let level = cli_level.unwrap_or(self.level.as_str());
        std::iter::once(level)
            .chain(self.directives.iter().map(String::as_str))
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_section_defaults() {
        let config: LogConfig = toml::from_str("").unwrap();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Console);
        assert_eq!(config.output, LogOutput::Stdout);
        assert_eq!(config.filter(None), "info");
    }

    #[test]
    fn test_json_to_stderr_with_directives() {
        let config: LogConfig = toml::from_str(
            r#"
level = "warn"
format = "json"
output = "stderr"
directives = ["deskpulse_connectors::client=debug", "turso=error"]
"#,
        )
        .unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Stderr);
        assert_eq!(
            config.filter(None),
            "warn,deskpulse_connectors::client=debug,turso=error"
        );
    }

    #[test]
    fn test_cli_level_keeps_directives() {
        let config = LogConfig {
            level: LogLevel::Error,
            directives: vec!["turso=warn".into(), " ".into()],
            ..Default::default()
        };
        assert_eq!(config.filter(Some("trace")), "trace,turso=warn");
    }

    #[test]
    fn test_levels_round_trip_names() {
        for name in ["trace", "debug", "info", "warn", "error"] {
            let config: LogConfig = toml::from_str(&format!("level = \"{}\"", name)).unwrap();
            assert_eq!(config.level.as_str(), name);
        }
        assert!(toml::from_str::<LogConfig>("level = \"loud\"").is_err());
        assert!(toml::from_str::<LogConfig>("output = \"/var/log/deskpulse.log\"").is_err());
    }
}
