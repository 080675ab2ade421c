use crate::crypto::random_hex;
use crate::domain::{DomainResult, FakeUser};
use secrecy::SecretString;

/// Random bytes behind the username suffix (10 hex chars)
const USERNAME_SUFFIX_BYTES: usize = 5;

/// Random bytes behind the passphrase (24 hex chars)
const PASSPHRASE_BYTES: usize = 12;

/// Generates throwaway users for signup tests
pub struct RandomIdentityFactory;

impl RandomIdentityFactory {
    /// New user named `<prefix>_<10 hex chars>` with a random passphrase
    pub fn new_fake_user(prefix: &str) -> DomainResult<FakeUser> {
        let username = format!("{}_{}", prefix, random_hex(USERNAME_SUFFIX_BYTES)?);
        let passphrase = SecretString::new(random_hex(PASSPHRASE_BYTES)?);
        Ok(FakeUser::new(username, passphrase))
    }
}
