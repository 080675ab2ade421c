pub mod openpgp;
pub mod random;

// Re-export commonly used items
pub use random::{random_bytes, random_hex};
