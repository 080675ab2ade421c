use super::error::{DomainError, DomainResult};

/// Smallest RSA modulus accepted for throwaway test keys.
///
/// Far too small for anything but tests.
pub const MIN_KEY_BITS: usize = 1024;

/// Largest RSA modulus accepted; keeps MPI bit counts and key packet
/// lengths within their 16-bit fields
pub const MAX_KEY_BITS: usize = 16384;

/// Parameters for generating an OpenPGP key bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGenSpec {
    /// Primary (certify + sign) key modulus size in bits
    pub primary_bits: usize,
    /// Encryption subkey modulus size in bits
    pub subkey_bits: usize,
    /// User IDs to self-certify, in order; the first is marked primary
    pub identities: Vec<String>,
}

impl KeyGenSpec {
    /// Create a spec, validating bit lengths and identities
    pub fn new(
        primary_bits: usize,
        subkey_bits: usize,
        identities: Vec<String>,
    ) -> DomainResult<Self> {
        let spec = Self {
            primary_bits,
            subkey_bits,
            identities,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Spec with the minimum bit lengths and a single identity
    pub fn throwaway(identity: impl Into<String>) -> DomainResult<Self> {
        Self::new(MIN_KEY_BITS, MIN_KEY_BITS, vec![identity.into()])
    }

    /// Check these parameters can produce a usable bundle
    pub fn validate(&self) -> DomainResult<()> {
        for (role, bits) in [("primary", self.primary_bits), ("subkey", self.subkey_bits)] {
            if bits < MIN_KEY_BITS {
                return Err(DomainError::KeyGeneration(format!(
                    "{} key size {} is below the minimum of {} bits",
                    role, bits, MIN_KEY_BITS
                )));
            }
            if bits > MAX_KEY_BITS {
                return Err(DomainError::KeyGeneration(format!(
                    "{} key size {} is above the maximum of {} bits",
                    role, bits, MAX_KEY_BITS
                )));
            }
        }

        if self.identities.is_empty() {
            return Err(DomainError::KeyGeneration(
                "at least one identity is required".to_string(),
            ));
        }

        if let Some(pos) = self.identities.iter().position(|uid| uid.trim().is_empty()) {
            return Err(DomainError::KeyGeneration(format!(
                "identity #{} is empty",
                pos
            )));
        }

        Ok(())
    }
}
