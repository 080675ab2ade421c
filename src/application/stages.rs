//! Standard configuration stages for a client context

use crate::domain::{
    ApiClient, Caches, ClientContext, ConfigStore, KeyringUsage, Keyrings, MerkleClient,
    SecretSyncer,
};
use crate::ui::{HeadlessUi, UiProvider};
use anyhow::{bail, Context};
use tracing::warn;

pub const API_STAGE: &str = "api";
pub const CONFIG_STAGE: &str = "config";
pub const SECRET_SYNCER_STAGE: &str = "secret_syncer";
pub const CACHES_STAGE: &str = "caches";
pub const MERKLE_STAGE: &str = "merkle";
pub const UI_STAGE: &str = "ui";
pub const KEYRING_STAGE: &str = "keyring";

/// Directory under the fixture home owned by the secret syncer
const SECRET_SYNCER_DIR: &str = "secret_syncer";

/// One named step that fills part of a [`ClientContext`]
pub trait ConfigStage: Send + Sync {
    fn name(&self) -> &str;

    fn configure(&self, ctx: &mut ClientContext) -> anyhow::Result<()>;

    /// Undo a successful `configure` after a later stage failed
    fn release(&self, _ctx: &mut ClientContext) {}
}

/// Network API client
pub struct ApiStage;

impl ConfigStage for ApiStage {
    fn name(&self) -> &str {
        API_STAGE
    }

    fn configure(&self, ctx: &mut ClientContext) -> anyhow::Result<()> {
        let uri = ctx.params().server_uri().to_string();
        let api = ApiClient::new(&uri).with_context(|| format!("invalid server URI {:?}", uri))?;
        ctx.api = Some(api);
        Ok(())
    }

    fn release(&self, ctx: &mut ClientContext) {
        ctx.api = None;
    }
}

/// Local config store
pub struct ConfigStoreStage;

impl ConfigStage for ConfigStoreStage {
    fn name(&self) -> &str {
        CONFIG_STAGE
    }

    fn configure(&self, ctx: &mut ClientContext) -> anyhow::Result<()> {
        let store = ConfigStore::load(ctx.params().config_file())?;
        ctx.config = Some(store);
        Ok(())
    }

    fn release(&self, ctx: &mut ClientContext) {
        ctx.config = None;
    }
}

/// Secret syncer and its scratch directory
pub struct SecretSyncerStage;

impl ConfigStage for SecretSyncerStage {
    fn name(&self) -> &str {
        SECRET_SYNCER_STAGE
    }

    fn configure(&self, ctx: &mut ClientContext) -> anyhow::Result<()> {
        let dir = ctx.params().home().join(SECRET_SYNCER_DIR);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating {}", dir.display()))?;
        ctx.secret_syncer = Some(SecretSyncer::new(dir));
        Ok(())
    }

    fn release(&self, ctx: &mut ClientContext) {
        if let Some(syncer) = ctx.secret_syncer.take() {
            if let Err(e) = std::fs::remove_dir_all(syncer.dir()) {
                warn!(path = %syncer.dir().display(), error = %e, "failed to remove secret syncer directory");
            }
        }
    }
}

/// In-memory caches
pub struct CacheStage {
    capacity: usize,
}

impl CacheStage {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl ConfigStage for CacheStage {
    fn name(&self) -> &str {
        CACHES_STAGE
    }

    fn configure(&self, ctx: &mut ClientContext) -> anyhow::Result<()> {
        if self.capacity == 0 {
            bail!("cache capacity must be positive");
        }
        ctx.caches = Some(Caches::with_capacity(self.capacity));
        Ok(())
    }

    fn release(&self, ctx: &mut ClientContext) {
        ctx.caches = None;
    }
}

/// Merkle client; needs the API client
pub struct MerkleStage;

impl ConfigStage for MerkleStage {
    fn name(&self) -> &str {
        MERKLE_STAGE
    }

    fn configure(&self, ctx: &mut ClientContext) -> anyhow::Result<()> {
        let Some(api) = ctx.api() else {
            bail!("API client must be configured first");
        };
        let merkle = MerkleClient::new(api)?;
        ctx.merkle = Some(merkle);
        Ok(())
    }

    fn release(&self, ctx: &mut ClientContext) {
        ctx.merkle = None;
    }
}

/// UI capabilities; installs a headless set
pub struct UiStage {
    ui: HeadlessUi,
}

impl UiStage {
    pub fn new(ui: HeadlessUi) -> Self {
        Self { ui }
    }
}

impl Default for UiStage {
    fn default() -> Self {
        Self::new(HeadlessUi::new())
    }
}

impl ConfigStage for UiStage {
    fn name(&self) -> &str {
        UI_STAGE
    }

    fn configure(&self, ctx: &mut ClientContext) -> anyhow::Result<()> {
        let mut ui: Box<dyn UiProvider> = Box::new(self.ui.clone());
        ui.configure()?;
        ctx.ui = Some(ui);
        Ok(())
    }

    fn release(&self, ctx: &mut ClientContext) {
        if let Some(mut ui) = ctx.ui.take() {
            if let Err(e) = ui.shutdown() {
                warn!(error = %e, "UI shutdown failed");
            }
        }
    }
}

/// Keyring locations under the gpg home
pub struct KeyringStage {
    usage: KeyringUsage,
}

impl KeyringStage {
    pub fn new(usage: KeyringUsage) -> Self {
        Self { usage }
    }
}

impl Default for KeyringStage {
    fn default() -> Self {
        Self::new(KeyringUsage {
            client_keyring: true,
            gpg_keyring: false,
        })
    }
}

impl ConfigStage for KeyringStage {
    fn name(&self) -> &str {
        KEYRING_STAGE
    }

    fn configure(&self, ctx: &mut ClientContext) -> anyhow::Result<()> {
        let gpg_home = ctx.params().gpg_home().to_path_buf();
        std::fs::create_dir_all(&gpg_home)
            .with_context(|| format!("creating gpg home {}", gpg_home.display()))?;
        ctx.keyrings = Some(Keyrings {
            usage: self.usage,
            secret_ring: ctx.params().secret_ring_path(),
            public_ring: ctx.params().public_ring_path(),
        });
        Ok(())
    }

    fn release(&self, ctx: &mut ClientContext) {
        ctx.keyrings = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FixtureParameters, DEFAULT_SERVER_URI};
    use tempfile::TempDir;

    fn context(home: &std::path::Path) -> ClientContext {
        ClientContext::new(FixtureParameters::new(home, DEFAULT_SERVER_URI))
    }

    struct MarkerStage;

    impl ConfigStage for MarkerStage {
        fn name(&self) -> &str {
            "marker"
        }

        fn configure(&self, _ctx: &mut ClientContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_release_leaves_context_alone() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());
        ApiStage.configure(&mut ctx).unwrap();

        MarkerStage.configure(&mut ctx).unwrap();
        MarkerStage.release(&mut ctx);

        assert!(ctx.api().is_some());
    }

    #[test]
    fn test_api_stage_rejects_bad_uri() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = ClientContext::new(FixtureParameters::new(temp_dir.path(), "::nope"));

        assert!(ApiStage.configure(&mut ctx).is_err());
        assert!(ctx.api().is_none());
    }

    #[test]
    fn test_merkle_requires_api() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());

        assert!(MerkleStage.configure(&mut ctx).is_err());
        ApiStage.configure(&mut ctx).unwrap();
        MerkleStage.configure(&mut ctx).unwrap();
        assert_eq!(
            ctx.merkle().unwrap().root_url().as_str(),
            "http://localhost:3000/merkle/root"
        );
    }

    #[test]
    fn test_secret_syncer_release_removes_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());

        SecretSyncerStage.configure(&mut ctx).unwrap();
        let dir = ctx.secret_syncer().unwrap().dir().to_path_buf();
        assert!(dir.is_dir());

        SecretSyncerStage.release(&mut ctx);
        assert!(!dir.exists());
        assert!(ctx.secret_syncer().is_none());
    }

    #[test]
    fn test_ui_stage_installs_headless() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());

        UiStage::default().configure(&mut ctx).unwrap();
        assert!(ctx.ui().unwrap().is_headless());

        UiStage::default().release(&mut ctx);
        assert!(ctx.ui().is_none());
    }

    #[test]
    fn test_keyring_stage_paths() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());

        KeyringStage::default().configure(&mut ctx).unwrap();
        let keyrings = ctx.keyrings().unwrap();
        assert!(keyrings.usage.client_keyring);
        assert!(!keyrings.usage.gpg_keyring);
        assert_eq!(keyrings.public_ring, temp_dir.path().join("pubring.gpg"));
        assert_eq!(keyrings.secret_ring, temp_dir.path().join("secring.gpg"));
    }

    #[test]
    fn test_cache_stage_rejects_zero_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());

        assert!(CacheStage::new(0).configure(&mut ctx).is_err());
        CacheStage::new(8).configure(&mut ctx).unwrap();
        assert_eq!(ctx.caches().unwrap().capacity(), 8);
    }
}
