//! Configuration loader with multi-source merging

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::MutatorConfig;

/// Project configuration file name.
pub const CONFIG_FILE_NAME: &str = "mixedversion.toml";

/// Loads [`MutatorConfig`] from, lowest precedence first:
/// 1. Built-in defaults
/// 2. `~/.config/mixedversion/config.toml` (user defaults)
/// 3. `mixedversion.toml` in the project directory
/// 4. Environment variables (`MVT_*`, nested keys separated by `__`)
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "MVT".to_string(),
            user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "MVT")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip the per-user configuration file
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Per-user configuration file, if a home directory can be found
    pub fn user_config_file() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "mixedversion", "mixedversion")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<MutatorConfig> {
        let mut builder = config::Config::builder();

        let defaults = MutatorConfig::default();
        builder = builder.add_source(
            config::Config::try_from(&defaults).context("Failed to serialize defaults")?,
        );

        if self.user_config {
            if let Some(user_file) = Self::user_config_file().filter(|p| p.exists()) {
                debug!(path = %user_file.display(), "loading user config");
                builder = builder.add_source(
                    config::File::from(user_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        let project_file = self.project_dir.join(CONFIG_FILE_NAME);
        if project_file.exists() {
            debug!(path = %project_file.display(), "loading project config");
            builder = builder.add_source(
                config::File::from(project_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;
        let loaded: MutatorConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Surface invalid mutator entries at load time.
        loaded.mutators().context("Invalid mutator configuration")?;

        Ok(loaded)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettingValue;
    use std::fs;
    use tempfile::tempdir;

    fn loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(dir)
            .with_env_prefix("MVT_TEST_UNSET")
            .without_user_config()
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path()).load().expect("Failed to load config");

        assert_eq!(config, MutatorConfig::default());
        assert!(config.preserve_downgrade_option);
        assert!(config.cluster_settings.is_empty());
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_content = r#"
seed = 1234
preserve_downgrade_option = false

[[cluster_settings]]
name = "kv.rangefeed.enabled"
values = [true, false]
min_version = "v23.2.0"
max_changes = 5

[[cluster_settings]]
name = "sql.stats.automatic_collection.enabled"
values = ["on", "off"]
"#;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), config_content)
            .expect("Failed to write config");

        let config = loader(temp_dir.path()).load().expect("Failed to load config");

        assert_eq!(config.seed, Some(1234));
        assert!(!config.preserve_downgrade_option);
        assert_eq!(config.cluster_settings.len(), 2);

        let rangefeed = &config.cluster_settings[0];
        assert_eq!(
            rangefeed.values,
            vec![SettingValue::Bool(true), SettingValue::Bool(false)]
        );
        assert_eq!(rangefeed.min_version, Some("v23.2.0".parse().unwrap()));
        assert_eq!(rangefeed.max_changes, 5);

        let stats = &config.cluster_settings[1];
        assert_eq!(stats.min_version, None);
        assert_eq!(stats.max_changes, crate::DEFAULT_MAX_CHANGES);

        assert_eq!(config.mutators().unwrap().len(), 2);
        assert_eq!(config.rng().1, 1234);
    }

    #[test]
    fn test_invalid_entry_fails_fast() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_content = r#"
[[cluster_settings]]
name = "kv.rangefeed.enabled"
values = []
"#;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), config_content)
            .expect("Failed to write config");

        let result = loader(temp_dir.path()).load();
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_version_is_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_content = r#"
[[cluster_settings]]
name = "kv.rangefeed.enabled"
values = [true]
min_version = "not-a-version"
"#;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), config_content)
            .expect("Failed to write config");

        assert!(loader(temp_dir.path()).load().is_err());
    }
}
