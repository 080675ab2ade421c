use crate::domain::DEFAULT_SERVER_URI;
use std::path::PathBuf;

/// Environment variable overriding where fixture homes are created
pub const TEMP_ROOT_ENV: &str = "CLIENT_TESTKIT_TMPDIR";

/// Environment variable overriding the API server URI
pub const SERVER_URI_ENV: &str = "CLIENT_TESTKIT_SERVER_URI";

const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Settings applied by [`TestFixtureManager`](crate::application::TestFixtureManager)
/// to every fixture it sets up
#[derive(Debug, Clone)]
pub struct FixtureOptions {
    /// Directory under which fixture homes are created
    pub temp_root: PathBuf,
    /// Endpoint handed to the API client
    pub server_uri: String,
    /// Opaque text written verbatim to the fixture's config file
    pub init_config: Option<String>,
    /// Put keyrings in `<home>/.gnupg` instead of `home` itself
    pub separate_gpg_home: bool,
    /// Capacity of the client caches
    pub cache_capacity: usize,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            temp_root: std::env::temp_dir(),
            server_uri: DEFAULT_SERVER_URI.to_string(),
            init_config: None,
            separate_gpg_home: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl FixtureOptions {
    /// Defaults, overridden by `CLIENT_TESTKIT_TMPDIR` and `CLIENT_TESTKIT_SERVER_URI`
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(root) = std::env::var(TEMP_ROOT_ENV) {
            if !root.is_empty() {
                options.temp_root = PathBuf::from(root);
            }
        }

        if let Ok(uri) = std::env::var(SERVER_URI_ENV) {
            if !uri.is_empty() {
                options.server_uri = uri;
            }
        }

        options
    }

    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = root.into();
        self
    }

    pub fn with_server_uri(mut self, uri: impl Into<String>) -> Self {
        self.server_uri = uri.into();
        self
    }

    pub fn with_init_config(mut self, config: impl Into<String>) -> Self {
        self.init_config = Some(config.into());
        self
    }

    pub fn with_separate_gpg_home(mut self, separate: bool) -> Self {
        self.separate_gpg_home = separate;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}
