//! Service configuration.
//!
//! Every option can be given on the command line or through a
//! `CARDIOSCORE_*` environment variable; the command line wins.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::application::ScoringOptions;

/// Boolean switch values accepted from flags and environment variables.
fn parse_bool(value: &str) -> Result<bool, String> {
    match value {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" | "" => Ok(false),
        other => Err(format!("expected true/false, got '{other}'")),
    }
}

/// Where log lines go.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// Stdout; there is no terminal UI to keep clear
    #[default]
    Auto,
    /// Append to the configured log file
    File,
    Stdout,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "cardioscore")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Heart-failure mortality risk scoring service", long_about = None)]
pub struct ServiceConfig {
    /// Address to listen on
    #[arg(long, env = "CARDIOSCORE_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Directory holding classifier.json, scaler.json and feature_names.json
    #[arg(long, env = "CARDIOSCORE_MODEL_DIR", default_value = "models")]
    pub model_dir: PathBuf,

    /// Directory served under /static
    #[arg(long, env = "CARDIOSCORE_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Reject physiologically implausible inputs
    #[arg(
        long,
        env = "CARDIOSCORE_RANGE_VALIDATION",
        value_parser = parse_bool,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub range_validation: bool,

    /// Refuse to load artifacts that lack a manifest.json
    #[arg(
        long,
        env = "CARDIOSCORE_REQUIRE_MANIFEST",
        value_parser = parse_bool,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub require_manifest: bool,

    /// Log destination
    #[arg(long, env = "CARDIOSCORE_LOG_MODE", value_enum, default_value_t = LogMode::Auto)]
    pub log_mode: LogMode,

    /// Log file used when the log mode is `file`
    #[arg(long, env = "CARDIOSCORE_LOG_FILE", default_value = "logs/cardioscore.log")]
    pub log_file: PathBuf,
}

impl ServiceConfig {
    #[must_use]
    pub fn scoring_options(&self) -> ScoringOptions {
        ScoringOptions {
            range_validation: self.range_validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        for v in ["1", "true", "TRUE", "yes", "YES"] {
            assert_eq!(parse_bool(v), Ok(true), "{v}");
        }
        for v in ["0", "false", "no", ""] {
            assert_eq!(parse_bool(v), Ok(false), "{v}");
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_flags() {
        let config = ServiceConfig::try_parse_from([
            "cardioscore",
            "--bind",
            "127.0.0.1:8080",
            "--model-dir",
            "/srv/artifacts",
            "--range-validation",
            "--require-manifest=false",
        ])
        .expect("parse");

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.model_dir, PathBuf::from("/srv/artifacts"));
        assert!(config.range_validation);
        assert!(!config.require_manifest);
        assert!(config.scoring_options().range_validation);
    }

    #[test]
    fn test_log_options() {
        let config = ServiceConfig::try_parse_from([
            "cardioscore",
            "--log-mode",
            "file",
            "--log-file",
            "/var/log/cardioscore/service.log",
        ])
        .expect("parse");
        assert_eq!(config.log_mode, LogMode::File);
        assert_eq!(
            config.log_file,
            PathBuf::from("/var/log/cardioscore/service.log")
        );

        assert!(ServiceConfig::try_parse_from(["cardioscore", "--log-mode", "syslog"]).is_err());
    }

    #[test]
    fn test_log_defaults() {
        let config = ServiceConfig::try_parse_from(["cardioscore"]).expect("parse");
        if std::env::var_os("CARDIOSCORE_LOG_FILE").is_none() {
            assert_eq!(config.log_file, PathBuf::from("logs/cardioscore.log"));
        }
        if std::env::var_os("CARDIOSCORE_LOG_MODE").is_none() {
            assert_eq!(config.log_mode, LogMode::Auto);
        }
    }

    #[test]
    fn test_invalid_bind_is_rejected() {
        assert!(ServiceConfig::try_parse_from(["cardioscore", "--bind", "nowhere"]).is_err());
    }
}
