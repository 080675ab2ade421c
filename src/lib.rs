// Library exports for test suites exercising the identity client

pub mod application;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod logging;
pub mod storage;
pub mod ui;

// Re-export commonly used items
pub use application::{
    ConfigStage, ConfigurationPipeline, Fixture, GlobalStateSwapper, KeyBundle,
    KeyBundleGenerator, RandomIdentityFactory, TestFixtureManager,
};
pub use config::FixtureOptions;
pub use domain::{
    ClientContext, DomainError, DomainResult, FakeUser, FixtureParameters, KeyGenSpec,
};
pub use logging::init_test_logging;
pub use storage::{Gpg, KeyringPaths, KeyringReader, KeyringSerializer};
pub use ui::{HeadlessUi, OutputProbe, UiProvider};
