pub mod context;
pub mod error;
pub mod fake_user;
pub mod key_spec;
pub mod params;

// Re-export commonly used types
pub use context::{
    ApiClient, Caches, ClientContext, ConfigStore, KeyringUsage, Keyrings, MerkleClient,
    SecretSyncer,
};
pub use error::{DomainError, DomainResult, SerializationError};
pub use fake_user::FakeUser;
pub use key_spec::{KeyGenSpec, MAX_KEY_BITS, MIN_KEY_BITS};
pub use params::{
    FixtureParameters, CONFIG_FILE_NAME, DEFAULT_SERVER_URI, PUBLIC_RING_FILE, SECRET_RING_FILE,
};
