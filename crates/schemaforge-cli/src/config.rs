use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::atomic::write_bytes_atomic;
use crate::CliResult;

pub const DEFAULT_CONFIG_FILE: &str = "schemaforge.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DeparseTarget {
    Postgres,
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Defaults read from `schemaforge.toml`; command-line flags win over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Input format used when a file's name does not reveal it.
    pub format: Option<String>,
    pub deparse_target: DeparseTarget,
    pub output: OutputFormat,
    pub pretty: bool,
    /// Fail instead of warning when a parser reports errors.
    pub strict: bool,
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            format: None,
            deparse_target: DeparseTarget::Postgres,
            output: OutputFormat::Json,
            pretty: true,
            strict: false,
            log_level: "info".to_string(),
        }
    }
}

/// A missing file yields the defaults; a malformed one is an error.
pub fn load_config(path: &Path) -> CliResult<CliConfig> {
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

pub fn save_config(path: &Path, config: &CliConfig) -> CliResult<()> {
    let encoded = toml::to_string_pretty(config)?;
    write_bytes_atomic(path, encoded.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_means_defaults() {
        let config = load_config(Path::new("/nonexistent/schemaforge.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config: CliConfig = toml::from_str(
            r#"
format = "prisma"
deparse_target = "yaml"
"#,
        )
        .unwrap();
        assert_eq!(config.format.as_deref(), Some("prisma"));
        assert_eq!(config.deparse_target, DeparseTarget::Yaml);
        assert!(config.pretty);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn saved_config_loads_back() {
        let path = std::env::temp_dir()
            .join(format!("schemaforge-config-{}", std::process::id()))
            .join(DEFAULT_CONFIG_FILE);
        let config = CliConfig {
            strict: true,
            output: OutputFormat::Yaml,
            ..CliConfig::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
        if let Some(parent) = path.parent() {
            std::fs::remove_dir_all(parent).unwrap();
        }
    }
}
