//! Keyring file writing

use crate::application::KeyBundle;
use crate::crypto::openpgp::{encode_packets, Packet, TransferableKey};
use crate::domain::{DomainError, DomainResult, SerializationError, PUBLIC_RING_FILE, SECRET_RING_FILE};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Paths of a written secret/public keyring pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyringPaths {
    pub secret_ring: PathBuf,
    pub public_ring: PathBuf,
}

/// Write key bundles as binary OpenPGP transferable keyrings
pub struct KeyringSerializer;

impl KeyringSerializer {
    /// Write the secret ring: unprotected secret key packets plus all
    /// self-signatures. Test-only; the output is not passphrase protected.
    pub fn write_secret_ring(bundle: &KeyBundle, path: &Path) -> DomainResult<()> {
        Self::write_secret_key(bundle.transferable_key(), path)
    }

    /// Write the public ring: public key packets plus all self-signatures
    pub fn write_public_ring(bundle: &KeyBundle, path: &Path) -> DomainResult<()> {
        Self::write_public_key(bundle.transferable_key(), path)
    }

    /// Write `secring.gpg` and `pubring.gpg` into `gpg_home`.
    ///
    /// The secret ring is removed again if the public ring cannot be written.
    pub fn write_rings(bundle: &KeyBundle, gpg_home: &Path) -> DomainResult<KeyringPaths> {
        let paths = KeyringPaths {
            secret_ring: gpg_home.join(SECRET_RING_FILE),
            public_ring: gpg_home.join(PUBLIC_RING_FILE),
        };
        Self::write_secret_ring(bundle, &paths.secret_ring)?;

        if let Err(e) = Self::write_public_ring(bundle, &paths.public_ring) {
            if let Err(remove_err) = std::fs::remove_file(&paths.secret_ring) {
                warn!(
                    path = %paths.secret_ring.display(),
                    error = %remove_err,
                    "failed to remove secret ring after public ring error"
                );
            }
            return Err(e);
        }

        Ok(paths)
    }

    pub fn write_secret_key(key: &TransferableKey, path: &Path) -> DomainResult<()> {
        let packets = key.secret_packets().map_err(|reason| DomainError::Serialization {
            path: path.to_path_buf(),
            source: SerializationError::Encoding(reason),
        })?;
        Self::write_packets(&packets, path)?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| Self::io_error(path, e))?;
        }

        Ok(())
    }

    pub fn write_public_key(key: &TransferableKey, path: &Path) -> DomainResult<()> {
        Self::write_packets(&key.public_packets(), path)
    }

    fn write_packets(packets: &[Packet], path: &Path) -> DomainResult<()> {
        let bytes = encode_packets(packets);

        // File is closed on drop on every path
        let file = File::create(path).map_err(|e| Self::io_error(path, e))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes).map_err(|e| Self::io_error(path, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| Self::io_error(path, e.into_error()))?;
        file.sync_all().map_err(|e| Self::io_error(path, e))?;

        debug!(path = %path.display(), packets = packets.len(), bytes = bytes.len(), "wrote keyring");
        Ok(())
    }

    fn io_error(path: &Path, e: std::io::Error) -> DomainError {
        DomainError::Serialization {
            path: path.to_path_buf(),
            source: SerializationError::Io(e),
        }
    }
}
