//! Client state assembled by the configuration pipeline
//!
//! Each collaborator slot starts empty and is filled by exactly one pipeline
//! stage. A fully configured context is shared as `Arc<ClientContext>`.

use super::params::FixtureParameters;
use crate::ui::UiProvider;
use anyhow::Context;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Network API client settings
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
}

impl ApiClient {
    pub fn new(server_uri: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(server_uri)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path against the server URI
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

/// Local config values loaded from the fixture's config file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    values: serde_json::Value,
}

impl ConfigStore {
    /// Load a JSON config file; a missing or blank file is an empty config
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };

        let values = if contents.trim().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing {}", path.display()))?
        };

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }
}

/// Secret syncer with a private scratch directory
#[derive(Debug, Clone)]
pub struct SecretSyncer {
    dir: PathBuf,
}

impl SecretSyncer {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Bounded in-memory caches
#[derive(Debug)]
pub struct Caches {
    capacity: usize,
    users: Mutex<HashMap<String, String>>,
}

impl Caches {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            users: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert an entry; returns false when the cache is full
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let mut users = self.users.lock();
        if users.len() >= self.capacity && !users.contains_key(&key) {
            return false;
        }
        users.insert(key, value.into());
        true
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.users.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Merkle tree client pointed at the API server
#[derive(Debug, Clone)]
pub struct MerkleClient {
    root_url: Url,
}

impl MerkleClient {
    pub fn new(api: &ApiClient) -> Result<Self, url::ParseError> {
        Ok(Self {
            root_url: api.endpoint("merkle/root")?,
        })
    }

    pub fn root_url(&self) -> &Url {
        &self.root_url
    }
}

/// Which keyrings the client may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyringUsage {
    pub client_keyring: bool,
    pub gpg_keyring: bool,
}

/// Keyring locations resolved for the client
#[derive(Debug, Clone)]
pub struct Keyrings {
    pub usage: KeyringUsage,
    pub secret_ring: PathBuf,
    pub public_ring: PathBuf,
}

/// Process-wide client state, configured once per fixture
pub struct ClientContext {
    params: FixtureParameters,
    pub(crate) api: Option<ApiClient>,
    pub(crate) config: Option<ConfigStore>,
    pub(crate) secret_syncer: Option<SecretSyncer>,
    pub(crate) caches: Option<Caches>,
    pub(crate) merkle: Option<MerkleClient>,
    pub(crate) ui: Option<Box<dyn UiProvider>>,
    pub(crate) keyrings: Option<Keyrings>,
    pub(crate) configured: bool,
}

impl ClientContext {
    /// Fresh, unconfigured context for the given fixture
    pub fn new(params: FixtureParameters) -> Self {
        Self {
            params,
            api: None,
            config: None,
            secret_syncer: None,
            caches: None,
            merkle: None,
            ui: None,
            keyrings: None,
            configured: false,
        }
    }

    pub fn params(&self) -> &FixtureParameters {
        &self.params
    }

    pub fn api(&self) -> Option<&ApiClient> {
        self.api.as_ref()
    }

    pub fn config(&self) -> Option<&ConfigStore> {
        self.config.as_ref()
    }

    pub fn secret_syncer(&self) -> Option<&SecretSyncer> {
        self.secret_syncer.as_ref()
    }

    pub fn caches(&self) -> Option<&Caches> {
        self.caches.as_ref()
    }

    pub fn merkle(&self) -> Option<&MerkleClient> {
        self.merkle.as_ref()
    }

    pub fn ui(&self) -> Option<&dyn UiProvider> {
        self.ui.as_deref()
    }

    pub fn keyrings(&self) -> Option<&Keyrings> {
        self.keyrings.as_ref()
    }

    /// True once a pipeline run has completed successfully
    pub fn is_configured(&self) -> bool {
        self.configured
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("home", &self.params.home())
            .field("api", &self.api)
            .field("config", &self.config.as_ref().map(|c| c.path()))
            .field("secret_syncer", &self.secret_syncer)
            .field("caches", &self.caches.as_ref().map(|c| c.capacity()))
            .field("merkle", &self.merkle)
            .field("ui", &self.ui.as_ref().map(|ui| ui.mode()))
            .field("keyrings", &self.keyrings)
            .field("configured", &self.configured)
            .finish()
    }
}
