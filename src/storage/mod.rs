pub mod gpg;
pub mod keyring_reader;
pub mod keyring_writer;

// Re-export commonly used items
pub use gpg::Gpg;
pub use keyring_reader::KeyringReader;
pub use keyring_writer::{KeyringPaths, KeyringSerializer};
