//! YAML configuration files under `~/.config/commitgpt`.
//!
//! `config.yml` holds provider endpoints, models and inference settings.
//! `config.local.yml` holds API keys. Entries are merged by provider name,
//! local values overriding main ones.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::commit::CommitFormat;
use crate::error::ConfigError;

use super::presets::PROVIDER_PRESETS;
use super::provider::{DEFAULT_DIFF_LEN, ProviderConfig, ProviderStore};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "AICM_CONFIG_DIR";

pub const MAIN_CONFIG_FILE: &str = "config.yml";
pub const LOCAL_CONFIG_FILE: &str = "config.local.yml";

/// Merged view of both config files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub active_provider: Option<String>,
    #[serde(default)]
    pub commit_format: Option<CommitFormat>,
}

impl Config {
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// The provider named by `active_provider`.
    pub fn active(&self) -> Result<&ProviderConfig, ConfigError> {
        let name = self
            .active_provider
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(ConfigError::NotConfigured)?;

        self.provider(name)
            .ok_or_else(|| ConfigError::UnknownProvider(name.to_string()))
    }
}

#[derive(Serialize)]
struct MainProviderEntry<'a> {
    name: &'a str,
    model: &'a str,
    diff_len: usize,
    base_url: &'a str,
}

#[derive(Serialize)]
struct MainFile<'a> {
    providers: Vec<MainProviderEntry<'a>>,
    active_provider: &'a str,
}

#[derive(Serialize)]
struct LocalProviderEntry<'a> {
    name: &'a str,
    api_key: &'a str,
}

#[derive(Serialize)]
struct LocalFile<'a> {
    providers: Vec<LocalProviderEntry<'a>>,
}

/// Config store backed by the two YAML files in one directory.
#[derive(Debug, Clone)]
pub struct YamlConfigStore {
    dir: PathBuf,
}

impl YamlConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolve the directory from `AICM_CONFIG_DIR`, falling back to
    /// `~/.config/commitgpt`.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(CONFIG_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Ok(Self::new(dir)),
            _ => dirs::home_dir()
                .map(|home| Self::new(home.join(".config").join("commitgpt")))
                .ok_or(ConfigError::NoHomeDirectory),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn main_path(&self) -> PathBuf {
        self.dir.join(MAIN_CONFIG_FILE)
    }

    pub fn local_path(&self) -> PathBuf {
        self.dir.join(LOCAL_CONFIG_FILE)
    }

    pub fn exists(&self) -> bool {
        self.main_path().is_file()
    }

    /// Load and merge both files.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let main_path = self.main_path();
        let main = read_yaml(&main_path)?
            .ok_or_else(|| ConfigError::NotFound(main_path.display().to_string()))?;
        let local = read_yaml(&self.local_path())?.unwrap_or(Value::Null);

        let merged = merge_configs(main, &local);
        serde_yaml::from_value(merged).map_err(|source| ConfigError::ParseFailed {
            path: main_path.display().to_string(),
            source,
        })
    }

    /// The active provider entry, merged with its API key.
    pub fn active_provider(&self) -> Result<ProviderConfig, ConfigError> {
        self.load()?.active().cloned()
    }

    /// Write a skeleton listing every preset with an empty model, plus a
    /// local file with empty API keys. An existing local file is kept.
    pub fn generate_defaults(&self) -> Result<(), ConfigError> {
        let main = MainFile {
            providers: PROVIDER_PRESETS
                .iter()
                .map(|p| MainProviderEntry {
                    name: p.name,
                    model: "",
                    diff_len: DEFAULT_DIFF_LEN,
                    base_url: p.base_url,
                })
                .collect(),
            active_provider: "",
        };
        let text = serde_yaml::to_string(&main).map_err(ConfigError::SerializeFailed)?;
        self.write_atomic(&self.main_path(), &text)?;

        let local_path = self.local_path();
        if !local_path.exists() {
            let local = LocalFile {
                providers: PROVIDER_PRESETS
                    .iter()
                    .map(|p| LocalProviderEntry {
                        name: p.name,
                        api_key: "",
                    })
                    .collect(),
            };
            let text = serde_yaml::to_string(&local).map_err(ConfigError::SerializeFailed)?;
            self.write_atomic(&local_path, &text)?;
        }

        debug!("Generated default config in {}", self.dir.display());
        Ok(())
    }

    /// Persist the default commit format in the main file.
    pub fn set_commit_format(&self, format: CommitFormat) -> Result<(), ConfigError> {
        let path = self.main_path();
        let mut doc = read_yaml(&path)?
            .ok_or_else(|| ConfigError::NotFound(path.display().to_string()))?;

        if !doc.is_mapping() {
            doc = Value::Mapping(Mapping::new());
        }
        if let Some(map) = doc.as_mapping_mut() {
            map.insert(
                Value::from("commit_format"),
                Value::from(format.as_str()),
            );
        }
        self.write_yaml(&path, &doc)
    }

    /// Apply `edit` to one provider entry of the main file and write it back.
    fn update_provider_entry<F>(&self, provider: &str, edit: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Mapping),
    {
        let path = self.main_path();
        let mut doc = read_yaml(&path)?
            .ok_or_else(|| ConfigError::NotFound(path.display().to_string()))?;

        let entry = doc
            .get_mut("providers")
            .and_then(Value::as_sequence_mut)
            .and_then(|providers| {
                providers
                    .iter_mut()
                    .find(|p| p.get("name").and_then(Value::as_str) == Some(provider))
            })
            .and_then(Value::as_mapping_mut)
            .ok_or_else(|| ConfigError::UnknownProvider(provider.to_string()))?;

        edit(entry);
        self.write_yaml(&path, &doc)
    }

    fn write_yaml(&self, path: &Path, doc: &Value) -> Result<(), ConfigError> {
        let text = serde_yaml::to_string(doc).map_err(ConfigError::SerializeFailed)?;
        self.write_atomic(path, &text)
    }

    /// Write through a temp file in the same directory, then rename over
    /// the target so readers never see a partial file.
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), ConfigError> {
        let write_failed = |source: io::Error| ConfigError::WriteFailed {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_failed)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_failed)?;
        tmp.write_all(contents.as_bytes()).map_err(write_failed)?;
        tmp.flush().map_err(write_failed)?;
        tmp.persist(path).map_err(|e| write_failed(e.error))?;
        Ok(())
    }
}

impl ProviderStore for YamlConfigStore {
    fn set_can_disable_reasoning(&self, provider: &str, value: bool) -> Result<(), ConfigError> {
        debug!("Persisting can_disable_reasoning={} for {}", value, provider);
        self.update_provider_entry(provider, |entry| {
            entry.insert(Value::from("can_disable_reasoning"), Value::from(value));
        })
    }

    fn set_max_tokens(&self, provider: &str, value: u32) -> Result<(), ConfigError> {
        debug!("Persisting max_tokens={} for {}", value, provider);
        self.update_provider_entry(provider, |entry| {
            entry.insert(Value::from("max_tokens"), Value::from(value));
        })
    }

    fn load_provider(&self, provider: &str) -> Result<ProviderConfig, ConfigError> {
        self.load()?
            .provider(provider)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProvider(provider.to_string()))
    }
}

/// Read a YAML file. `Ok(None)` when it does not exist; an empty file reads
/// as an empty mapping.
fn read_yaml(path: &Path) -> Result<Option<Value>, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::ReadFailed {
                path: path.display().to_string(),
                source,
            });
        }
    };

    if text.trim().is_empty() {
        return Ok(Some(Value::Mapping(Mapping::new())));
    }

    serde_yaml::from_str(&text)
        .map(Some)
        .map_err(|source| ConfigError::ParseFailed {
            path: path.display().to_string(),
            source,
        })
}

/// Overlay local provider entries onto main ones with the same name.
/// Local entries with no main counterpart are ignored.
fn merge_configs(mut main: Value, local: &Value) -> Value {
    let local_providers = local
        .get("providers")
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if let Some(providers) = main.get_mut("providers").and_then(Value::as_sequence_mut) {
        for entry in providers.iter_mut() {
            let Some(name) = entry.get("name").and_then(Value::as_str).map(str::to_owned) else {
                continue;
            };
            let overrides = local_providers
                .iter()
                .find(|lp| lp.get("name").and_then(Value::as_str) == Some(name.as_str()))
                .and_then(Value::as_mapping);

            if let (Some(target), Some(overrides)) = (entry.as_mapping_mut(), overrides) {
                for (key, value) in overrides {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
    }

    main
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const MAIN_YAML: &str = "\
providers:
  - name: openai
    model: gpt-4o-mini
    diff_len: 16000
    base_url: https://api.openai.com/v1
  - name: ollama
    model: ''
    diff_len: 32768
    base_url: http://127.0.0.1:11434/v1
active_provider: openai
";

    const LOCAL_YAML: &str = "\
providers:
  - name: openai
    api_key: sk-local
  - name: ghost
    api_key: sk-ghost
";

    fn store_with(main: &str, local: Option<&str>) -> (TempDir, YamlConfigStore) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MAIN_CONFIG_FILE), main).unwrap();
        if let Some(local) = local {
            fs::write(dir.path().join(LOCAL_CONFIG_FILE), local).unwrap();
        }
        let store = YamlConfigStore::new(dir.path());
        (dir, store)
    }

    // ============================================
    // Loading and merging
    // ============================================

    #[test]
    fn test_load_merges_local_api_key() {
        let (_dir, store) = store_with(MAIN_YAML, Some(LOCAL_YAML));
        let config = store.load().unwrap();

        assert_eq!(config.providers.len(), 2);
        let openai = config.provider("openai").unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("sk-local"));
        assert_eq!(openai.diff_len, 16000);
        assert!(config.provider("ollama").unwrap().api_key.is_none());
        assert!(config.provider("ghost").is_none());
    }

    #[test]
    fn test_load_without_local_file() {
        let (_dir, store) = store_with(MAIN_YAML, None);
        let provider = store.active_provider().unwrap();
        assert_eq!(provider.name, "openai");
        assert!(provider.api_key().is_none());
    }

    #[test]
    fn test_local_overrides_main_fields() {
        let local = "providers:\n  - name: openai\n    model: gpt-4.1\n";
        let (_dir, store) = store_with(MAIN_YAML, Some(local));
        assert_eq!(store.active_provider().unwrap().model, "gpt-4.1");
    }

    #[test]
    fn test_load_missing_main_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = YamlConfigStore::new(dir.path());
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_yaml_is_parse_error() {
        let (_dir, store) = store_with("providers: [\n", None);
        assert!(matches!(store.load(), Err(ConfigError::ParseFailed { .. })));
    }

    #[test]
    fn test_active_provider_unset() {
        let main = MAIN_YAML.replace("active_provider: openai", "active_provider: ''");
        let (_dir, store) = store_with(&main, None);
        assert!(matches!(store.active_provider(), Err(ConfigError::NotConfigured)));
    }

    #[test]
    fn test_active_provider_unknown() {
        let main = MAIN_YAML.replace("active_provider: openai", "active_provider: mystery");
        let (_dir, store) = store_with(&main, None);
        assert!(matches!(
            store.active_provider(),
            Err(ConfigError::UnknownProvider(name)) if name == "mystery"
        ));
    }

    #[test]
    fn test_commit_format_is_read() {
        let main = format!("{MAIN_YAML}commit_format: gitmoji\n");
        let (_dir, store) = store_with(&main, None);
        assert_eq!(store.load().unwrap().commit_format, Some(CommitFormat::Gitmoji));
    }

    // ============================================
    // Writes
    // ============================================

    #[test]
    fn test_set_can_disable_reasoning_touches_only_that_provider() {
        let (dir, store) = store_with(MAIN_YAML, Some(LOCAL_YAML));

        store.set_can_disable_reasoning("openai", false).unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.provider("openai").unwrap().can_disable_reasoning, Some(false));
        assert_eq!(config.provider("ollama").unwrap().can_disable_reasoning, None);

        // API key stays in the local file only.
        let main = fs::read_to_string(dir.path().join(MAIN_CONFIG_FILE)).unwrap();
        assert!(!main.contains("sk-local"));
        let local = fs::read_to_string(dir.path().join(LOCAL_CONFIG_FILE)).unwrap();
        assert_eq!(local, LOCAL_YAML);
    }

    #[test]
    fn test_set_max_tokens_then_load_provider() {
        let (_dir, store) = store_with(MAIN_YAML, Some(LOCAL_YAML));

        store.set_max_tokens("openai", 4000).unwrap();

        let provider = store.load_provider("openai").unwrap();
        assert_eq!(provider.max_tokens, Some(4000));
        assert_eq!(provider.api_key.as_deref(), Some("sk-local"));
    }

    #[test]
    fn test_set_on_unknown_provider_fails() {
        let (_dir, store) = store_with(MAIN_YAML, None);
        assert!(matches!(
            store.set_max_tokens("ghost", 10),
            Err(ConfigError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let (dir, store) = store_with(MAIN_YAML, None);
        store.set_can_disable_reasoning("ollama", true).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![MAIN_CONFIG_FILE.to_string()]);
    }

    #[test]
    fn test_set_commit_format() {
        let (_dir, store) = store_with(MAIN_YAML, None);
        store.set_commit_format(CommitFormat::Conventional).unwrap();
        assert_eq!(
            store.load().unwrap().commit_format,
            Some(CommitFormat::Conventional)
        );
    }

    // ============================================
    // Defaults
    // ============================================

    #[test]
    fn test_generate_defaults_lists_every_preset() {
        let dir = TempDir::new().unwrap();
        let store = YamlConfigStore::new(dir.path().join("nested"));

        store.generate_defaults().unwrap();

        assert!(store.exists());
        let config = store.load().unwrap();
        assert_eq!(config.providers.len(), PROVIDER_PRESETS.len());
        assert!(config.providers.iter().all(|p| p.model.is_empty()));
        assert!(config.providers.iter().all(|p| p.diff_len == DEFAULT_DIFF_LEN));
        assert!(matches!(config.active(), Err(ConfigError::NotConfigured)));
        assert!(store.local_path().is_file());
    }

    #[test]
    fn test_generate_defaults_keeps_existing_local_file() {
        let (dir, store) = store_with(MAIN_YAML, Some(LOCAL_YAML));
        store.generate_defaults().unwrap();

        let local = fs::read_to_string(dir.path().join(LOCAL_CONFIG_FILE)).unwrap();
        assert_eq!(local, LOCAL_YAML);
    }

    // ============================================
    // Directory resolution
    // ============================================

    #[test]
    #[serial]
    fn test_from_env_override() {
        temp_env::with_var(CONFIG_DIR_ENV, Some("/tmp/aicm-config"), || {
            let store = YamlConfigStore::from_env().unwrap();
            assert_eq!(store.dir(), Path::new("/tmp/aicm-config"));
        });
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_to_home() {
        temp_env::with_var_unset(CONFIG_DIR_ENV, || {
            if let Ok(store) = YamlConfigStore::from_env() {
                assert!(store.dir().ends_with(".config/commitgpt"));
            }
        });
    }
}
