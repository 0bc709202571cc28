//! Mutator configuration.
//!
//! Which mutators run, and how they are parameterized, can be declared in
//! `mixedversion.toml`:
//!
//! ```toml
//! seed = 42
//! preserve_downgrade_option = true
//!
//! [[cluster_settings]]
//! name = "kv.expiration_leases_only.enabled"
//! values = [true, false]
//! min_version = "v23.2.0"
//! max_changes = 5
//! ```
//!
//! See [`ConfigLoader`](crate::ConfigLoader) for the full source
//! precedence.

use mixedversion_types::Version;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mutator::{
    ClusterSettingMutator, DEFAULT_MAX_CHANGES, Mutator, PreserveDowngradeOptionRandomizer,
};
use crate::{SettingValue, SimRng};

/// Top-level mutator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutatorConfig {
    /// Seed for the random source. A fresh seed is drawn when absent.
    pub seed: Option<u64>,
    /// Enables [`PreserveDowngradeOptionRandomizer`].
    pub preserve_downgrade_option: bool,
    /// One [`ClusterSettingMutator`] per entry.
    pub cluster_settings: Vec<ClusterSettingConfig>,
}

impl Default for MutatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            preserve_downgrade_option: true,
            cluster_settings: Vec::new(),
        }
    }
}

/// Configuration of one cluster-setting mutator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSettingConfig {
    pub name: String,
    pub values: Vec<SettingValue>,
    #[serde(default)]
    pub min_version: Option<Version>,
    #[serde(default = "default_max_changes")]
    pub max_changes: usize,
}

fn default_max_changes() -> usize {
    DEFAULT_MAX_CHANGES
}

impl ClusterSettingConfig {
    /// Builds the mutator this entry describes.
    pub fn to_mutator(&self) -> Result<ClusterSettingMutator, ConfigError> {
        let mut builder = ClusterSettingMutator::builder(self.name.clone(), self.values.clone())
            .max_changes(self.max_changes);
        if let Some(min) = self.min_version {
            builder = builder.minimum_version(min);
        }
        builder.build()
    }
}

impl MutatorConfig {
    /// Builds the configured mutators, in a stable order: the
    /// allow-upgrade randomizer first, then cluster settings as listed.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found; nothing is defaulted.
    pub fn mutators(&self) -> Result<Vec<Box<dyn Mutator>>, ConfigError> {
        let mut mutators: Vec<Box<dyn Mutator>> = Vec::new();
        if self.preserve_downgrade_option {
            mutators.push(Box::new(PreserveDowngradeOptionRandomizer::new()));
        }
        for setting in &self.cluster_settings {
            mutators.push(Box::new(setting.to_mutator()?));
        }
        Ok(mutators)
    }

    /// Random source for this configuration, with the seed it uses.
    pub fn rng(&self) -> (SimRng, u64) {
        match self.seed {
            Some(seed) => (SimRng::new(seed), seed),
            None => SimRng::from_entropy(),
        }
    }
}
