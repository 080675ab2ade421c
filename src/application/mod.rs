pub mod fixture;
pub mod global_state;
pub mod identity_factory;
pub mod key_generation;
pub mod pipeline;
pub mod stages;

// Re-export commonly used items
pub use fixture::{Fixture, TestFixtureManager};
pub use global_state::GlobalStateSwapper;
pub use identity_factory::RandomIdentityFactory;
pub use key_generation::{KeyBundle, KeyBundleGenerator};
pub use pipeline::ConfigurationPipeline;
pub use stages::{
    ApiStage, CacheStage, ConfigStage, ConfigStoreStage, KeyringStage, MerkleStage,
    SecretSyncerStage, UiStage,
};
