use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "config.toml";

const DEFAULT_CONFIG_TOML: &str = r#"# Configuração do dockhand
# refresh_interval_secs: intervalo do modo --watch
# compose_timeout_secs: prazo para chamadas à ferramenta compose
# scan_root: raiz da varredura por arquivos compose (aceita ~)
# log_file: quando definido, logs vão para este arquivo

refresh_interval_secs = 5
compose_timeout_secs = 10
# scan_root = "~/projetos"
# log_file = "dockhand.log"
"#;

pub fn default_config_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".config/dockhand")
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Interval between refreshes in watch mode, seconds.
    pub refresh_interval_secs: u64,
    /// Bound applied to compose tool invocations, seconds.
    pub compose_timeout_secs: u64,
    /// Root directory scanned for declaration files; `~` is expanded.
    pub scan_root: Option<String>,
    /// Optional log file; when absent, logs go to stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 5,
            compose_timeout_secs: 10,
            scan_root: None,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `<config_dir>/config.toml`.
    ///
    /// A missing file yields the defaults; a present but unparsable file is
    /// an error worth surfacing (the operator wrote it).
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(DEFAULT_CONFIG_NAME);
        if !path.exists() {
            debug!("config não encontrada em {:?}, usando padrões", path);
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(&path).with_context(|| format!("lendo config em {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("parse de config em {:?}", path))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn compose_timeout(&self) -> Duration {
        Duration::from_secs(self.compose_timeout_secs)
    }

    /// Scan root with shell expansion applied; defaults to the current tree.
    pub fn resolved_scan_root(&self) -> PathBuf {
        match &self.scan_root {
            Some(raw) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
            None => PathBuf::from("."),
        }
    }
}

/// Writes the default configuration template, keeping an existing file.
pub fn install_default_config(config_dir: &Path) -> Result<()> {
    fs::create_dir_all(config_dir).with_context(|| format!("criando {:?}", config_dir))?;

    let target = config_dir.join(DEFAULT_CONFIG_NAME);
    if target.exists() {
        return Ok(());
    }

    fs::write(&target, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("escrevendo template em {:?}", target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(temp.path()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(DEFAULT_CONFIG_NAME),
            "compose_timeout_secs = 3\n",
        )
        .unwrap();

        let config = AppConfig::load(temp.path()).unwrap();
        assert_eq!(config.compose_timeout(), Duration::from_secs(3));
        assert_eq!(config.refresh_interval_secs, 5);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DEFAULT_CONFIG_NAME), "not = [valid").unwrap();
        assert!(AppConfig::load(temp.path()).is_err());
    }

    #[test]
    fn test_scan_root_expansion() {
        let config = AppConfig {
            scan_root: Some("~/code".into()),
            ..AppConfig::default()
        };
        let resolved = config.resolved_scan_root();
        assert!(!resolved.to_string_lossy().starts_with('~'));

        assert_eq!(AppConfig::default().resolved_scan_root(), PathBuf::from("."));
    }

    #[test]
    fn test_install_default_config_is_idempotent() {
        let temp = TempDir::new().unwrap();
        install_default_config(temp.path()).unwrap();
        let written = fs::read_to_string(temp.path().join(DEFAULT_CONFIG_NAME)).unwrap();
        assert!(written.contains("refresh_interval_secs"));

        // A second install keeps the existing file untouched.
        fs::write(temp.path().join(DEFAULT_CONFIG_NAME), "# edited\n").unwrap();
        install_default_config(temp.path()).unwrap();
        let kept = fs::read_to_string(temp.path().join(DEFAULT_CONFIG_NAME)).unwrap();
        assert_eq!(kept, "# edited\n");
    }
}
