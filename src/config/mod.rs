//! Provider configuration: merged YAML files, presets and the write-back
//! seam used when a provider rejects a request shape.

pub mod presets;
pub mod provider;
pub mod store;

pub use presets::{PROVIDER_PRESETS, ProviderPreset, find_preset};
pub use provider::{DEFAULT_DIFF_LEN, ProviderConfig, ProviderStore};
pub use store::{CONFIG_DIR_ENV, Config, YamlConfigStore};

#[cfg(test)]
pub use provider::MockProviderStore;
