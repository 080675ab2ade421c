//! Isolated client environments for tests
//!
//! A [`Fixture`] owns a fresh temp directory and a fully configured
//! [`ClientContext`] that is also published through [`GlobalStateSwapper`].
//! Fixtures hold a process-wide re-entrant lock for their whole lifetime:
//! fixtures on different threads run one at a time, while one thread may
//! nest several.

use super::global_state::{serial_guard, GlobalStateSwapper};
use super::key_generation::KeyBundleGenerator;
use super::pipeline::ConfigurationPipeline;
use crate::config::FixtureOptions;
use crate::domain::{ClientContext, DomainError, DomainResult, FixtureParameters, KeyGenSpec};
use crate::storage::{KeyringPaths, KeyringSerializer};
use parking_lot::ReentrantMutexGuard;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Directory under the fixture home used when gpg gets its own home
const GPG_HOME_DIR: &str = ".gnupg";

/// Creates fixtures with shared options and pipeline
pub struct TestFixtureManager {
    options: FixtureOptions,
    pipeline: ConfigurationPipeline,
}

impl TestFixtureManager {
    /// Manager configured from the environment
    pub fn new() -> Self {
        Self::with_options(FixtureOptions::from_env())
    }

    pub fn with_options(options: FixtureOptions) -> Self {
        let pipeline = ConfigurationPipeline::standard(&options);
        Self { options, pipeline }
    }

    /// Replace the configuration pipeline run for each fixture
    pub fn with_pipeline(mut self, pipeline: ConfigurationPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn options(&self) -> &FixtureOptions {
        &self.options
    }

    /// Set up a fixture whose temp directory is prefixed with `name`
    pub fn setup(&self, name: &str) -> DomainResult<Fixture> {
        self.setup_inner(name, self.options.init_config.as_deref())
    }

    /// Like [`setup`](Self::setup), writing `config` verbatim to a temp file
    /// that becomes the config store's input
    pub fn setup_with_config(&self, name: &str, config: &str) -> DomainResult<Fixture> {
        self.setup_inner(name, Some(config))
    }

    fn setup_inner(&self, name: &str, init_config: Option<&str>) -> DomainResult<Fixture> {
        let serial = serial_guard();

        let root = &self.options.temp_root;
        std::fs::create_dir_all(root).map_err(|e| DomainError::temp_resource(root, e))?;

        // Removed on drop until the pipeline has succeeded
        let temp_dir = tempfile::Builder::new()
            .prefix(&format!("{}_", name))
            .tempdir_in(root)
            .map_err(|e| DomainError::temp_resource(root, e))?;
        let home = temp_dir.path().to_path_buf();

        let gpg_home = if self.options.separate_gpg_home {
            home.join(GPG_HOME_DIR)
        } else {
            home.clone()
        };

        let mut params =
            FixtureParameters::with_gpg_home(&home, gpg_home, self.options.server_uri.as_str());
        if let Some(config) = init_config {
            params = params.with_config_file(write_init_config(&home, config)?);
        }

        let mut ctx = ClientContext::new(params.clone());
        self.pipeline.run(&mut ctx)?;

        let home = temp_dir.keep();
        let context = Arc::new(ctx);
        let previous = GlobalStateSwapper::install(Arc::clone(&context));

        info!(fixture = name, home = %home.display(), "fixture ready");

        Ok(Fixture {
            name: name.to_string(),
            params,
            context,
            previous,
            restored: false,
            _serial: serial,
        })
    }
}

impl Default for TestFixtureManager {
    fn default() -> Self {
        Self::new()
    }
}

fn write_init_config(home: &Path, config: &str) -> DomainResult<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("testconfig")
        .suffix(".json")
        .tempfile_in(home)
        .map_err(|e| DomainError::temp_resource(home, e))?;
    let path = file.path().to_path_buf();

    file.write_all(config.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| DomainError::temp_resource(&path, e))?;
    file.keep()
        .map_err(|e| DomainError::temp_resource(&path, e.error))?;

    Ok(path)
}

/// One isolated client environment.
///
/// The temp directory lives until [`cleanup`](Self::cleanup) or drop.
/// Restoring the previously active context is a separate step,
/// [`restore_global`](Self::restore_global). Not `Send`: a fixture stays on
/// the thread that created it.
pub struct Fixture {
    name: String,
    params: FixtureParameters,
    context: Arc<ClientContext>,
    previous: Option<Arc<ClientContext>>,
    restored: bool,
    _serial: ReentrantMutexGuard<'static, ()>,
}

impl Fixture {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &FixtureParameters {
        &self.params
    }

    pub fn context(&self) -> &Arc<ClientContext> {
        &self.context
    }

    /// Context that was active before this fixture was set up
    pub fn previous_context(&self) -> Option<&Arc<ClientContext>> {
        self.previous.as_ref()
    }

    /// Remove the temp directory tree. Already-absent directories are fine.
    pub fn try_cleanup(&self) -> DomainResult<()> {
        let home = self.params.home();
        match std::fs::remove_dir_all(home) {
            Ok(()) => {
                debug!(fixture = %self.name, home = %home.display(), "removed fixture home");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::temp_resource(home, e)),
        }
    }

    /// [`try_cleanup`](Self::try_cleanup), logging failures instead of returning them
    pub fn cleanup(&self) {
        if let Err(e) = self.try_cleanup() {
            warn!(fixture = %self.name, error = %e, "fixture cleanup failed");
        }
    }

    /// Reactivate the context that was active before setup.
    ///
    /// Returns the context it displaced. Only the first call has an effect.
    pub fn restore_global(&mut self) -> Option<Arc<ClientContext>> {
        if self.restored {
            return None;
        }
        self.restored = true;
        GlobalStateSwapper::restore(self.previous.clone())
    }

    pub fn is_restored(&self) -> bool {
        self.restored
    }

    /// Generate a throwaway key for `identity` and write both keyrings into
    /// the gpg home
    pub fn generate_gpg_keyring(&self, identity: &str) -> DomainResult<KeyringPaths> {
        let spec = KeyGenSpec::throwaway(identity)?;
        let bundle = KeyBundleGenerator::generate(&spec)?;
        let paths = KeyringSerializer::write_rings(&bundle, self.params.gpg_home())?;

        info!(
            fixture = %self.name,
            identity,
            fingerprint = %bundle.fingerprint(),
            "wrote gpg keyrings"
        );

        Ok(paths)
    }
}

impl std::fmt::Debug for Fixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fixture")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("restored", &self.restored)
            .finish()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.cleanup();
    }
}
