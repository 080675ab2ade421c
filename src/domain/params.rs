use std::path::{Path, PathBuf};

/// Fixed endpoint handed to the network API client; never dialed by fixtures
pub const DEFAULT_SERVER_URI: &str = "http://localhost:3000";

/// Filename of the config file written into a fixture home
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Conventional secret keyring filename under the gpg home
pub const SECRET_RING_FILE: &str = "secring.gpg";

/// Conventional public keyring filename under the gpg home
pub const PUBLIC_RING_FILE: &str = "pubring.gpg";

/// Immutable parameters describing one fixture's isolated environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureParameters {
    home: PathBuf,
    gpg_home: PathBuf,
    gpg_options: Vec<String>,
    server_uri: String,
    config_file: PathBuf,
}

impl FixtureParameters {
    /// Parameters with gpg home equal to `home`
    pub fn new(home: impl Into<PathBuf>, server_uri: impl Into<String>) -> Self {
        let home = home.into();
        Self::with_gpg_home(home.clone(), home, server_uri)
    }

    /// Parameters with an explicit gpg home
    pub fn with_gpg_home(
        home: impl Into<PathBuf>,
        gpg_home: impl Into<PathBuf>,
        server_uri: impl Into<String>,
    ) -> Self {
        let home = home.into();
        let gpg_home = gpg_home.into();
        let gpg_options = vec![format!("--homedir={}", gpg_home.display())];
        let config_file = home.join(CONFIG_FILE_NAME);

        Self {
            home,
            gpg_home,
            gpg_options,
            server_uri: server_uri.into(),
            config_file,
        }
    }

    /// Replace the config file location
    pub(crate) fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = path.into();
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn gpg_home(&self) -> &Path {
        &self.gpg_home
    }

    /// Options an external gpg binary needs to find the fixture's keyrings
    pub fn gpg_options(&self) -> &[String] {
        &self.gpg_options
    }

    pub fn server_uri(&self) -> &str {
        &self.server_uri
    }

    /// Path handed to the local config store
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn secret_ring_path(&self) -> PathBuf {
        self.gpg_home.join(SECRET_RING_FILE)
    }

    pub fn public_ring_path(&self) -> PathBuf {
        self.gpg_home.join(PUBLIC_RING_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gpg_home_is_home() {
        let params = FixtureParameters::new("/tmp/unit123", DEFAULT_SERVER_URI);

        assert_eq!(params.gpg_home(), params.home());
        assert_eq!(params.gpg_options(), ["--homedir=/tmp/unit123".to_string()]);
        assert_eq!(params.server_uri(), "http://localhost:3000");
        assert_eq!(params.config_file(), Path::new("/tmp/unit123/config.json"));
        assert_eq!(
            params.public_ring_path(),
            PathBuf::from("/tmp/unit123/pubring.gpg")
        );
    }

    #[test]
    fn test_separate_gpg_home() {
        let params =
            FixtureParameters::with_gpg_home("/tmp/unit", "/tmp/unit/.gnupg", DEFAULT_SERVER_URI);

        assert_ne!(params.gpg_home(), params.home());
        assert_eq!(params.gpg_options()[0], "--homedir=/tmp/unit/.gnupg");
    }
}
