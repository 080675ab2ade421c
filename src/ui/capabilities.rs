//! Interactive capabilities the client may request from its host

use crate::domain::DomainResult;
use secrecy::SecretString;

/// Whether a capability set can reach a human
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Interactive,
    Headless,
}

/// Identity verification progress and confirmation
pub trait IdentifyUi: Send + Sync {
    fn start(&self, username: &str);
    fn report_proof(&self, service: &str, verified: bool);
    /// Ask whether to accept (and track) the identified user
    fn confirm(&self, username: &str) -> bool;
    fn finish(&self);
}

pub trait LoginUi: Send + Sync {
    fn get_email_or_username(&self) -> Option<String>;
}

/// Secret entry
pub trait SecretUi: Send + Sync {
    fn get_secret(&self, prompt: &str) -> Option<SecretString>;
    fn get_new_passphrase(&self, prompt: &str) -> Option<SecretString>;
    fn get_account_passphrase(&self, username: &str) -> Option<SecretString>;
}

/// Proof posting
pub trait ProveUi: Send + Sync {
    fn prompt_overwrite(&self, account: &str) -> bool;
    fn output_instructions(&self, instructions: &str, proof: &str);
}

/// Choices around importing keys from a local GPG install
pub trait GpgUi: Send + Sync {
    fn want_to_add_gpg_key(&self) -> bool;
    fn select_key(&self, fingerprints: &[String]) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

pub trait LogUi: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// The full set of capabilities handed to the client
pub trait UiProvider: Send + Sync {
    fn mode(&self) -> UiMode;

    fn identify_ui(&self, username: &str) -> &dyn IdentifyUi;
    fn identify_self_ui(&self) -> &dyn IdentifyUi;
    fn identify_track_ui(&self, username: &str, strict: bool) -> &dyn IdentifyUi;
    fn login_ui(&self) -> &dyn LoginUi;
    fn secret_ui(&self) -> &dyn SecretUi;
    fn prove_ui(&self) -> &dyn ProveUi;
    fn gpg_ui(&self) -> &dyn GpgUi;
    fn log_ui(&self) -> &dyn LogUi;

    /// Free-form question; `secret` hides the answer while typing
    fn prompt(&self, question: &str, secret: bool) -> DomainResult<String>;

    fn configure(&mut self) -> DomainResult<()>;
    fn shutdown(&mut self) -> DomainResult<()>;

    fn is_headless(&self) -> bool {
        self.mode() == UiMode::Headless
    }
}
