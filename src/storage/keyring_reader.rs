use crate::crypto::openpgp::TransferableKey;
use crate::domain::{DomainError, DomainResult};
use crate::storage::gpg::Gpg;
use std::path::Path;

/// Read binary OpenPGP keyrings
pub struct KeyringReader;

impl KeyringReader {
    /// Read a keyring holding exactly one key
    pub fn read_keyring(path: &Path) -> DomainResult<TransferableKey> {
        TransferableKey::parse(&Self::read_bytes(path)?)
    }

    /// Read every key in a keyring
    pub fn read_all(path: &Path) -> DomainResult<Vec<TransferableKey>> {
        TransferableKey::parse_all(&Self::read_bytes(path)?)
    }

    fn read_bytes(path: &Path) -> DomainResult<Vec<u8>> {
        let bytes = std::fs::read(path).map_err(|e| {
            DomainError::invalid_keyring(format!("cannot read {}: {}", path.display(), e))
        })?;

        if !bytes.is_empty() && !Gpg::has_binary_packet_header(&bytes) {
            return Err(DomainError::invalid_keyring(format!(
                "{} is not a binary OpenPGP keyring",
                path.display()
            )));
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file() {
        let err = KeyringReader::read_keyring(Path::new("/nonexistent/pubring.gpg")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidKeyring { .. }));
    }

    #[test]
    fn test_armored_or_text_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "-----BEGIN PGP PUBLIC KEY BLOCK-----").unwrap();

        assert!(KeyringReader::read_keyring(temp_file.path()).is_err());
    }

    #[test]
    fn test_empty_keyring() {
        let temp_file = NamedTempFile::new().unwrap();

        assert!(KeyringReader::read_all(temp_file.path()).unwrap().is_empty());
        assert!(KeyringReader::read_keyring(temp_file.path()).is_err());
    }
}
