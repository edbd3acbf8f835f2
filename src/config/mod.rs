mod schema;
pub mod validation;

pub use schema::{CategoryConfig, Config, LedgerConfig, Profile};
pub use validation::validate_config;

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/tasting-panel/)
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".config").join("tasting-panel"))
        .unwrap_or_else(|| PathBuf::from(".tasting-panel"))
}

/// Get the default config file path (~/.config/tasting-panel/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Get the default ledger path (~/.config/tasting-panel/ledger.csv)
pub fn get_default_ledger_path() -> PathBuf {
    get_config_dir().join("ledger.csv")
}

/// Ensure the parent directory of `path` exists
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/tasting-panel/config.yaml)
///
/// A missing file at the default path yields the built-in rib tasting panel.
/// A missing file at an explicit path is an error.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly requested config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        tracing::debug!(
            "no config at {}, using built-in panel",
            config_path.display()
        );
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!(
            "Failed to parse config: invalid YAML in {}",
            config_path.display()
        )
    })?;

    Ok(config)
}

/// Write `config` as YAML, atomically replacing any existing file.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    ensure_parent_dir(path)
        .with_context(|| format!("Failed to create directory for {}", path.display()))?;

    let yaml = serde_saphyr::to_string(config).context("Failed to serialize config")?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .context("Failed to write config")?;
    file.commit().context("Failed to save config")?;

    Ok(())
}

/// Resolve where the ledger lives: CLI override, then config, then the default.
pub fn resolve_ledger_path(config: &Config, cli_override: Option<PathBuf>) -> PathBuf {
    cli_override
        .or_else(|| config.ledger.as_ref().map(|l| l.path.clone()))
        .unwrap_or_else(get_default_ledger_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_explicit_missing_config_errors() {
        let path = env::temp_dir().join("tasting_panel_test_missing_config.yaml");
        let _ = fs::remove_file(&path);

        let result = load_config(Some(path));
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = env::temp_dir().join("tasting_panel_test_config_roundtrip.yaml");
        let _ = fs::remove_file(&path);

        let mut config = Config::default();
        config.profile = Profile::Normalized;
        config.samples.truncate(2);

        save_config(&path, &config).unwrap();
        let loaded = load_config(Some(path.clone())).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_yaml_errors() {
        let path = env::temp_dir().join("tasting_panel_test_bad_config.yaml");
        fs::write(&path, "categories: [unterminated").unwrap();

        let err = load_config(Some(path.clone())).unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_ensure_parent_dir_creates_nested() {
        let root = env::temp_dir().join("tasting_panel_test_parent_dir");
        let _ = fs::remove_dir_all(&root);
        let path = root.join("a").join("ledger.csv");

        ensure_parent_dir(&path).unwrap();
        assert!(root.join("a").is_dir());
        // Existing parent is fine
        ensure_parent_dir(&path).unwrap();

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_resolve_ledger_path_precedence() {
        let mut config = Config::default();
        assert_eq!(
            resolve_ledger_path(&config, None),
            get_default_ledger_path()
        );

        config.ledger = Some(LedgerConfig {
            path: PathBuf::from("/tmp/from-config.csv"),
        });
        assert_eq!(
            resolve_ledger_path(&config, None),
            PathBuf::from("/tmp/from-config.csv")
        );

        assert_eq!(
            resolve_ledger_path(&config, Some(PathBuf::from("/tmp/cli.csv"))),
            PathBuf::from("/tmp/cli.csv")
        );
    }
}
