use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Throwaway account credentials for exercising signup and login flows
#[derive(Clone)]
pub struct FakeUser {
    username: String,
    email: String,
    passphrase: SecretString,
}

impl FakeUser {
    pub fn new(username: String, passphrase: SecretString) -> Self {
        let email = format!("{}@email.com", username);
        Self {
            username,
            email,
            passphrase,
        }
    }

    /// `<prefix>_<10 hex chars>`
    pub fn username(&self) -> &str {
        &self.username
    }

    /// `<username>@email.com`
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn passphrase(&self) -> &SecretString {
        &self.passphrase
    }

    /// Borrow the passphrase as plain text
    pub fn passphrase_str(&self) -> &str {
        self.passphrase.expose_secret()
    }
}

impl fmt::Debug for FakeUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_derived_from_username() {
        let user = FakeUser::new(
            "t_0123456789".to_string(),
            SecretString::new("aa".repeat(12)),
        );
        assert_eq!(user.username(), "t_0123456789");
        assert_eq!(user.email(), "t_0123456789@email.com");
        assert_eq!(user.passphrase().expose_secret().len(), 24);
    }

    #[test]
    fn test_debug_redacts_passphrase() {
        let user = FakeUser::new("t_x".to_string(), SecretString::new("hunter2".to_string()));
        let debug = format!("{:?}", user);
        assert!(debug.contains("t_x"));
        assert!(!debug.contains("hunter2"));
    }
}
