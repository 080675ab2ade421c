use crate::crypto::openpgp::signature::{
    SIG_POSITIVE_CERTIFICATION, SIG_SUBKEY_BINDING, KEY_FLAG_CERTIFY, KEY_FLAG_ENCRYPT_COMMS,
    KEY_FLAG_ENCRYPT_STORAGE, KEY_FLAG_SIGN,
};
use crate::crypto::openpgp::{
    BoundSubkey, CertifiedUserId, Fingerprint, KeyPacket, PublicKey, SecretKey, SignatureBuilder,
    TransferableKey,
};
use crate::domain::{DomainError, DomainResult, KeyGenSpec};
use chrono::Utc;
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use tracing::debug;

/// A freshly generated OpenPGP entity: certify/sign primary key, one
/// encryption subkey, and a self-certification per identity.
///
/// Secret material is held unprotected; never persist outside tests.
#[derive(Debug, Clone)]
pub struct KeyBundle {
    key: TransferableKey,
}

impl KeyBundle {
    pub fn fingerprint(&self) -> Fingerprint {
        self.key.fingerprint()
    }

    pub fn transferable_key(&self) -> &TransferableKey {
        &self.key
    }

    pub fn user_ids(&self) -> Vec<&str> {
        self.key.user_ids.iter().map(|uid| uid.user_id.as_str()).collect()
    }
}

/// Key bundle generation use case
pub struct KeyBundleGenerator;

impl KeyBundleGenerator {
    /// Generate a new bundle; every call yields different key material
    pub fn generate(spec: &KeyGenSpec) -> DomainResult<KeyBundle> {
        spec.validate()?;

        let created = u32::try_from(Utc::now().timestamp())
            .map_err(|_| DomainError::KeyGeneration("clock outside the OpenPGP epoch".to_string()))?;

        debug!(
            primary_bits = spec.primary_bits,
            subkey_bits = spec.subkey_bits,
            identities = spec.identities.len(),
            "generating key bundle"
        );

        let primary_rsa = Self::generate_rsa(spec.primary_bits)?;
        let subkey_rsa = Self::generate_rsa(spec.subkey_bits)?;

        let primary = KeyPacket {
            public: PublicKey::from_rsa(&primary_rsa.to_public_key(), created),
            secret: Some(SecretKey::from_rsa(&primary_rsa)?),
        };
        let subkey = KeyPacket {
            public: PublicKey::from_rsa(&subkey_rsa.to_public_key(), created),
            secret: Some(SecretKey::from_rsa(&subkey_rsa)?),
        };

        let user_ids = spec
            .identities
            .iter()
            .enumerate()
            .map(|(index, user_id)| -> DomainResult<CertifiedUserId> {
                let mut builder = SignatureBuilder::new(SIG_POSITIVE_CERTIFICATION, created)
                    .key_flags(KEY_FLAG_CERTIFY | KEY_FLAG_SIGN)
                    .algorithm_preferences();
                if index == 0 {
                    builder = builder.primary_user_id();
                }
                let certification = builder.sign_user_id(&primary_rsa, &primary.public, user_id)?;
                Ok(CertifiedUserId {
                    user_id: user_id.clone(),
                    certifications: vec![certification],
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let binding = SignatureBuilder::new(SIG_SUBKEY_BINDING, created)
            .key_flags(KEY_FLAG_ENCRYPT_COMMS | KEY_FLAG_ENCRYPT_STORAGE)
            .sign_subkey_binding(&primary_rsa, &primary.public, &subkey.public)?;

        let key = TransferableKey {
            primary,
            user_ids,
            subkeys: vec![BoundSubkey {
                key: subkey,
                bindings: vec![binding],
            }],
        };
        debug!(fingerprint = %key.fingerprint(), "generated key bundle");

        Ok(KeyBundle { key })
    }

    fn generate_rsa(bits: usize) -> DomainResult<RsaPrivateKey> {
        RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| {
            DomainError::KeyGeneration(format!("RSA-{} generation failed: {}", bits, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_single_identity() {
        let spec = KeyGenSpec::new(1024, 1024, vec!["alice".to_string()]).unwrap();
        let bundle = KeyBundleGenerator::generate(&spec).unwrap();

        assert_eq!(bundle.user_ids(), vec!["alice"]);
        let key = bundle.transferable_key();
        assert!(key.is_secret());
        assert_eq!(key.primary.public.bits(), 1024);
        assert_eq!(key.subkeys.len(), 1);
        assert!(key.verify_self_signatures().is_ok());

        let uid_sig = &key.user_ids[0].certifications[0];
        assert!(uid_sig.is_primary_user_id());
        assert_eq!(uid_sig.key_flags(), Some(KEY_FLAG_CERTIFY | KEY_FLAG_SIGN));

        let binding = &key.subkeys[0].bindings[0];
        assert_ne!(binding.key_flags().unwrap() & KEY_FLAG_ENCRYPT_COMMS, 0);
    }

    #[test]
    fn test_generate_multiple_identities() {
        let spec = KeyGenSpec::new(
            1024,
            1024,
            vec!["alice".to_string(), "Alice <alice@email.com>".to_string()],
        )
        .unwrap();
        let bundle = KeyBundleGenerator::generate(&spec).unwrap();
        let key = bundle.transferable_key();

        assert_eq!(bundle.user_ids(), vec!["alice", "Alice <alice@email.com>"]);
        assert!(key.user_ids[0].certifications[0].is_primary_user_id());
        assert!(!key.user_ids[1].certifications[0].is_primary_user_id());
        assert_eq!(key.certified_user_ids().len(), 2);
    }

    #[test]
    fn test_generation_is_not_deterministic() {
        let spec = KeyGenSpec::throwaway("carol").unwrap();
        let first = KeyBundleGenerator::generate(&spec).unwrap();
        let second = KeyBundleGenerator::generate(&spec).unwrap();

        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_invalid_spec_rejected() {
        let spec = KeyGenSpec {
            primary_bits: 1024,
            subkey_bits: 1024,
            identities: vec![],
        };
        assert!(matches!(
            KeyBundleGenerator::generate(&spec),
            Err(DomainError::KeyGeneration(_))
        ));
    }
}
