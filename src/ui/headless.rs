use super::capabilities::{
    GpgUi, IdentifyUi, LogLevel, LogUi, LoginUi, ProveUi, SecretUi, UiMode, UiProvider,
};
use crate::domain::DomainResult;
use secrecy::SecretString;
use tracing::{debug, error, info, warn};

/// Forwards client log output to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogUi;

impl LogUi for TracingLogUi {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => debug!(target: "client_testkit::ui", "{}", message),
            LogLevel::Info => info!(target: "client_testkit::ui", "{}", message),
            LogLevel::Warn => warn!(target: "client_testkit::ui", "{}", message),
            LogLevel::Error => error!(target: "client_testkit::ui", "{}", message),
        }
    }
}

/// Secret entry that answers every request with one fixed passphrase
#[derive(Clone)]
pub struct StaticSecretUi {
    passphrase: SecretString,
}

impl StaticSecretUi {
    pub fn new(passphrase: SecretString) -> Self {
        Self { passphrase }
    }

    fn answer(&self) -> Option<SecretString> {
        Some(self.passphrase.clone())
    }
}

impl SecretUi for StaticSecretUi {
    fn get_secret(&self, _prompt: &str) -> Option<SecretString> {
        self.answer()
    }

    fn get_new_passphrase(&self, _prompt: &str) -> Option<SecretString> {
        self.answer()
    }

    fn get_account_passphrase(&self, _username: &str) -> Option<SecretString> {
        self.answer()
    }
}

/// Capability set for running without a terminal or a human.
///
/// Every question is declined or left unanswered, except secret entry when a
/// [`StaticSecretUi`] is installed. Log output still reaches `tracing`.
#[derive(Clone, Default)]
pub struct HeadlessUi {
    secret: Option<StaticSecretUi>,
    log: TracingLogUi,
}

impl HeadlessUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret_ui(mut self, secret: StaticSecretUi) -> Self {
        self.secret = Some(secret);
        self
    }
}

impl IdentifyUi for HeadlessUi {
    fn start(&self, _username: &str) {}

    fn report_proof(&self, _service: &str, _verified: bool) {}

    fn confirm(&self, _username: &str) -> bool {
        false
    }

    fn finish(&self) {}
}

impl LoginUi for HeadlessUi {
    fn get_email_or_username(&self) -> Option<String> {
        None
    }
}

impl SecretUi for HeadlessUi {
    fn get_secret(&self, _prompt: &str) -> Option<SecretString> {
        None
    }

    fn get_new_passphrase(&self, _prompt: &str) -> Option<SecretString> {
        None
    }

    fn get_account_passphrase(&self, _username: &str) -> Option<SecretString> {
        None
    }
}

impl ProveUi for HeadlessUi {
    fn prompt_overwrite(&self, _account: &str) -> bool {
        false
    }

    fn output_instructions(&self, _instructions: &str, _proof: &str) {}
}

impl GpgUi for HeadlessUi {
    fn want_to_add_gpg_key(&self) -> bool {
        false
    }

    fn select_key(&self, _fingerprints: &[String]) -> Option<String> {
        None
    }
}

impl UiProvider for HeadlessUi {
    fn mode(&self) -> UiMode {
        UiMode::Headless
    }

    fn identify_ui(&self, _username: &str) -> &dyn IdentifyUi {
        self
    }

    fn identify_self_ui(&self) -> &dyn IdentifyUi {
        self
    }

    fn identify_track_ui(&self, _username: &str, _strict: bool) -> &dyn IdentifyUi {
        self
    }

    fn login_ui(&self) -> &dyn LoginUi {
        self
    }

    fn secret_ui(&self) -> &dyn SecretUi {
        match &self.secret {
            Some(secret) => secret as &dyn SecretUi,
            None => self,
        }
    }

    fn prove_ui(&self) -> &dyn ProveUi {
        self
    }

    fn gpg_ui(&self) -> &dyn GpgUi {
        self
    }

    fn log_ui(&self) -> &dyn LogUi {
        &self.log
    }

    fn prompt(&self, _question: &str, _secret: bool) -> DomainResult<String> {
        Ok(String::new())
    }

    fn configure(&mut self) -> DomainResult<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> DomainResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_headless_declines_everything() {
        let mut ui = HeadlessUi::new();
        assert!(ui.configure().is_ok());

        assert_eq!(ui.mode(), UiMode::Headless);
        assert!(ui.is_headless());
        assert!(!ui.identify_ui("max").confirm("max"));
        assert!(!ui.identify_track_ui("max", true).confirm("max"));
        assert!(ui.login_ui().get_email_or_username().is_none());
        assert!(ui.secret_ui().get_secret("passphrase").is_none());
        assert!(!ui.prove_ui().prompt_overwrite("twitter"));
        assert!(!ui.gpg_ui().want_to_add_gpg_key());
        assert!(ui.gpg_ui().select_key(&["ABCD".to_string()]).is_none());
        assert_eq!(ui.prompt("continue?", false).unwrap(), "");

        ui.log_ui().log(LogLevel::Info, "still observable");
        assert!(ui.shutdown().is_ok());
    }

    #[test]
    fn test_static_secret_ui() {
        let ui = HeadlessUi::new()
            .with_secret_ui(StaticSecretUi::new(SecretString::new("hunter2".to_string())));

        let secret = ui.secret_ui().get_account_passphrase("max").unwrap();
        assert_eq!(secret.expose_secret(), "hunter2");
        let new = ui.secret_ui().get_new_passphrase("choose").unwrap();
        assert_eq!(new.expose_secret(), "hunter2");
        assert!(ui.is_headless());
    }
}
