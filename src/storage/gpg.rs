use crate::domain::{DomainError, DomainResult, FixtureParameters};
use std::process::Command;

/// External GPG binary support
pub struct Gpg;

impl Gpg {
    /// Check for a binary OpenPGP packet header.
    ///
    /// Bit 7 of the first octet is always set; ASCII armor never is.
    pub fn has_binary_packet_header(bytes: &[u8]) -> bool {
        matches!(bytes.first(), Some(0x80..=0xFF))
    }

    /// Check if gpg command is available
    pub fn is_gpg_available() -> bool {
        Command::new("gpg")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// List user ids from the fixture's public keyring using the fixture's
    /// gpg options
    pub fn list_user_ids(params: &FixtureParameters) -> DomainResult<Vec<String>> {
        if !Self::is_gpg_available() {
            return Err(DomainError::GpgTool {
                gpg_error: "GPG is not available. Please install gnupg.".to_string(),
            });
        }

        let output = Command::new("gpg")
            .args(params.gpg_options())
            .args(["--batch", "--no-tty", "--with-colons", "--list-keys"])
            .output()
            .map_err(|e| DomainError::GpgTool {
                gpg_error: format!("Failed to execute gpg: {}", e),
            })?;

        if !output.status.success() {
            return Err(DomainError::GpgTool {
                gpg_error: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self::parse_colon_user_ids(&stdout))
    }

    /// Extract user ids (field 10) from `--with-colons` listing output
    fn parse_colon_user_ids(listing: &str) -> Vec<String> {
        listing
            .lines()
            .filter(|line| line.starts_with("uid:"))
            .filter_map(|line| line.split(':').nth(9))
            .map(|uid| uid.replace("\\x3a", ":"))
            .collect()
    }
}
