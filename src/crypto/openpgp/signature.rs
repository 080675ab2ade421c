//! Version 4 self-signatures (RFC 4880 §5.2)

use super::key::{Fingerprint, PublicKey, PUBKEY_ALGO_RSA};
use super::packet::{take_array, take_slice, take_u32, take_u8, Mpi, Packet, Tag};
use crate::domain::{DomainError, DomainResult};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};

const SIG_VERSION: u8 = 4;

pub const SIG_POSITIVE_CERTIFICATION: u8 = 0x13;
pub const SIG_SUBKEY_BINDING: u8 = 0x18;

pub const HASH_ALGO_SHA256: u8 = 8;
const HASH_ALGO_SHA512: u8 = 10;

pub const KEY_FLAG_CERTIFY: u8 = 0x01;
pub const KEY_FLAG_SIGN: u8 = 0x02;
pub const KEY_FLAG_ENCRYPT_COMMS: u8 = 0x04;
pub const KEY_FLAG_ENCRYPT_STORAGE: u8 = 0x08;

/// Signature subpacket types
pub mod subpacket {
    pub const CREATION_TIME: u8 = 2;
    pub const PREFERRED_SYMMETRIC: u8 = 11;
    pub const ISSUER: u8 = 16;
    pub const PREFERRED_HASH: u8 = 21;
    pub const PREFERRED_COMPRESSION: u8 = 22;
    pub const PRIMARY_USER_ID: u8 = 25;
    pub const KEY_FLAGS: u8 = 27;
    pub const FEATURES: u8 = 30;
    pub const ISSUER_FINGERPRINT: u8 = 33;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subpacket {
    pub kind: u8,
    pub data: Vec<u8>,
}

impl Subpacket {
    pub fn new(kind: u8, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let len = self.data.len() + 1;
        if len < 192 {
            out.push(len as u8);
        } else if len < 16320 {
            let adjusted = len - 192;
            out.push(((adjusted >> 8) as u8) + 192);
            out.push((adjusted & 0xFF) as u8);
        } else {
            out.push(0xFF);
            out.extend_from_slice(&(len as u32).to_be_bytes());
        }
        out.push(self.kind);
        out.extend_from_slice(&self.data);
    }

    fn decode_area(mut area: &[u8]) -> DomainResult<Vec<Self>> {
        let mut subpackets = Vec::new();
        while !area.is_empty() {
            let first = take_u8(&mut area)? as usize;
            let len = match first {
                0..=191 => first,
                192..=254 => ((first - 192) << 8) + take_u8(&mut area)? as usize + 192,
                _ => take_u32(&mut area)? as usize,
            };
            if len == 0 {
                return Err(DomainError::invalid_keyring("empty signature subpacket"));
            }
            let body = take_slice(&mut area, len)?;
            // Bit 7 is the critical flag
            subpackets.push(Self::new(body[0] & 0x7F, &body[1..]));
        }
        Ok(subpackets)
    }
}

fn encode_area(subpackets: &[Subpacket]) -> Vec<u8> {
    let mut area = Vec::new();
    for subpacket in subpackets {
        subpacket.encode(&mut area);
    }
    area
}

/// A v4 RSA signature packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub sig_type: u8,
    pub hash_algo: u8,
    pub hashed_area: Vec<u8>,
    pub unhashed_area: Vec<u8>,
    pub digest_prefix: [u8; 2],
    pub value: Mpi,
}

impl Signature {
    pub fn to_packet(&self) -> Packet {
        let mut body = self.header();
        body.extend_from_slice(&(self.unhashed_area.len() as u16).to_be_bytes());
        body.extend_from_slice(&self.unhashed_area);
        body.extend_from_slice(&self.digest_prefix);
        self.value.encode(&mut body);
        Packet::new(Tag::Signature, body)
    }

    pub fn decode(body: &[u8]) -> DomainResult<Self> {
        let mut input = body;
        let version = take_u8(&mut input)?;
        if version != SIG_VERSION {
            return Err(DomainError::invalid_keyring(format!(
                "unsupported signature version {}",
                version
            )));
        }
        let sig_type = take_u8(&mut input)?;
        let pk_algo = take_u8(&mut input)?;
        if pk_algo != PUBKEY_ALGO_RSA {
            return Err(DomainError::invalid_keyring(format!(
                "unsupported signature algorithm {}",
                pk_algo
            )));
        }
        let hash_algo = take_u8(&mut input)?;
        let hashed_len = u16::from_be_bytes(take_array(&mut input)?) as usize;
        let hashed_area = take_slice(&mut input, hashed_len)?.to_vec();
        let unhashed_len = u16::from_be_bytes(take_array(&mut input)?) as usize;
        let unhashed_area = take_slice(&mut input, unhashed_len)?.to_vec();
        let digest_prefix = take_array(&mut input)?;
        let value = Mpi::decode(&mut input)?;

        Ok(Self {
            sig_type,
            hash_algo,
            hashed_area,
            unhashed_area,
            digest_prefix,
            value,
        })
    }

    /// Version through hashed subpackets: the part covered by the digest
    fn header(&self) -> Vec<u8> {
        let mut header = vec![SIG_VERSION, self.sig_type, PUBKEY_ALGO_RSA, self.hash_algo];
        header.extend_from_slice(&(self.hashed_area.len() as u16).to_be_bytes());
        header.extend_from_slice(&self.hashed_area);
        header
    }

    fn digest(&self, signed_data: &[u8]) -> DomainResult<Vec<u8>> {
        if self.hash_algo != HASH_ALGO_SHA256 {
            return Err(DomainError::invalid_keyring(format!(
                "unsupported hash algorithm {}",
                self.hash_algo
            )));
        }
        let header = self.header();
        let mut hasher = Sha256::new();
        hasher.update(signed_data);
        hasher.update(&header);
        hasher.update([SIG_VERSION, 0xFF]);
        hasher.update((header.len() as u32).to_be_bytes());
        Ok(hasher.finalize().to_vec())
    }

    pub fn hashed_subpackets(&self) -> DomainResult<Vec<Subpacket>> {
        Subpacket::decode_area(&self.hashed_area)
    }

    fn hashed_subpacket(&self, kind: u8) -> Option<Vec<u8>> {
        self.hashed_subpackets()
            .ok()?
            .into_iter()
            .find(|sp| sp.kind == kind)
            .map(|sp| sp.data)
    }

    pub fn created(&self) -> Option<u32> {
        let data = self.hashed_subpacket(subpacket::CREATION_TIME)?;
        Some(u32::from_be_bytes(data.get(..4)?.try_into().ok()?))
    }

    pub fn key_flags(&self) -> Option<u8> {
        self.hashed_subpacket(subpacket::KEY_FLAGS)?.first().copied()
    }

    pub fn is_primary_user_id(&self) -> bool {
        self.hashed_subpacket(subpacket::PRIMARY_USER_ID)
            .map_or(false, |data| data.first() == Some(&1))
    }

    pub fn issuer_fingerprint(&self) -> Option<Fingerprint> {
        let data = self.hashed_subpacket(subpacket::ISSUER_FINGERPRINT)?;
        if data.len() != 21 || data[0] != 4 {
            return None;
        }
        let mut fp = [0u8; 20];
        fp.copy_from_slice(&data[1..]);
        Some(Fingerprint(fp))
    }

    /// Check a certification of `user_id` made by `primary`
    pub fn verify_user_id(&self, primary: &PublicKey, user_id: &str) -> DomainResult<()> {
        if !(0x10..=0x13).contains(&self.sig_type) {
            return Err(DomainError::invalid_keyring(format!(
                "signature type 0x{:02x} is not a certification",
                self.sig_type
            )));
        }
        self.verify(primary, &user_id_signed_data(primary, user_id))
    }

    /// Check a binding of `subkey` to `primary`
    pub fn verify_subkey_binding(&self, primary: &PublicKey, subkey: &PublicKey) -> DomainResult<()> {
        if self.sig_type != SIG_SUBKEY_BINDING {
            return Err(DomainError::invalid_keyring(format!(
                "signature type 0x{:02x} is not a subkey binding",
                self.sig_type
            )));
        }
        self.verify(primary, &subkey_signed_data(primary, subkey))
    }

    fn verify(&self, signer: &PublicKey, signed_data: &[u8]) -> DomainResult<()> {
        let digest = self.digest(signed_data)?;
        if digest[..2] != self.digest_prefix {
            return Err(DomainError::invalid_keyring("signature digest prefix mismatch"));
        }
        let key = signer.to_rsa()?;
        key.verify(
            Pkcs1v15Sign::new::<Sha256>(),
            &digest,
            &self.value.to_padded(key.size()),
        )
        .map_err(|e| DomainError::invalid_keyring(format!("bad signature: {}", e)))
    }
}

fn user_id_signed_data(primary: &PublicKey, user_id: &str) -> Vec<u8> {
    let mut data = primary.hash_prefix();
    data.push(0xB4);
    data.extend_from_slice(&(user_id.len() as u32).to_be_bytes());
    data.extend_from_slice(user_id.as_bytes());
    data
}

fn subkey_signed_data(primary: &PublicKey, subkey: &PublicKey) -> Vec<u8> {
    let mut data = primary.hash_prefix();
    data.extend_from_slice(&subkey.hash_prefix());
    data
}

/// Builds and signs self-signatures issued by a primary key
pub struct SignatureBuilder {
    sig_type: u8,
    hashed: Vec<Subpacket>,
}

impl SignatureBuilder {
    pub fn new(sig_type: u8, created: u32) -> Self {
        Self {
            sig_type,
            hashed: vec![Subpacket::new(
                subpacket::CREATION_TIME,
                created.to_be_bytes(),
            )],
        }
    }

    pub fn key_flags(mut self, flags: u8) -> Self {
        self.hashed.push(Subpacket::new(subpacket::KEY_FLAGS, [flags]));
        self
    }

    pub fn primary_user_id(mut self) -> Self {
        self.hashed.push(Subpacket::new(subpacket::PRIMARY_USER_ID, [1]));
        self
    }

    /// Algorithm preferences advertised on user id certifications
    pub fn algorithm_preferences(mut self) -> Self {
        // AES256, AES192, AES128
        self.hashed.push(Subpacket::new(subpacket::PREFERRED_SYMMETRIC, [9, 8, 7]));
        self.hashed.push(Subpacket::new(
            subpacket::PREFERRED_HASH,
            [HASH_ALGO_SHA256, HASH_ALGO_SHA512],
        ));
        // ZLIB, BZip2, ZIP
        self.hashed.push(Subpacket::new(subpacket::PREFERRED_COMPRESSION, [2, 3, 1]));
        // Modification detection
        self.hashed.push(Subpacket::new(subpacket::FEATURES, [0x01]));
        self
    }

    pub fn sign_user_id(
        self,
        signer: &RsaPrivateKey,
        primary: &PublicKey,
        user_id: &str,
    ) -> DomainResult<Signature> {
        self.sign(signer, primary, &user_id_signed_data(primary, user_id))
    }

    pub fn sign_subkey_binding(
        self,
        signer: &RsaPrivateKey,
        primary: &PublicKey,
        subkey: &PublicKey,
    ) -> DomainResult<Signature> {
        self.sign(signer, primary, &subkey_signed_data(primary, subkey))
    }

    fn sign(
        mut self,
        signer: &RsaPrivateKey,
        primary: &PublicKey,
        signed_data: &[u8],
    ) -> DomainResult<Signature> {
        let fingerprint = primary.fingerprint();
        let mut issuer_fp = vec![4u8];
        issuer_fp.extend_from_slice(&fingerprint.0);
        self.hashed
            .push(Subpacket::new(subpacket::ISSUER_FINGERPRINT, issuer_fp));

        let mut signature = Signature {
            sig_type: self.sig_type,
            hash_algo: HASH_ALGO_SHA256,
            hashed_area: encode_area(&self.hashed),
            unhashed_area: encode_area(&[Subpacket::new(
                subpacket::ISSUER,
                fingerprint.key_id(),
            )]),
            digest_prefix: [0, 0],
            value: Mpi::from_be_bytes(&[]),
        };

        let digest = signature.digest(signed_data)?;
        let raw = signer
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| DomainError::KeyGeneration(format!("signing failed: {}", e)))?;

        signature.digest_prefix = [digest[0], digest[1]];
        signature.value = Mpi::from_be_bytes(&raw);
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn primary() -> (RsaPrivateKey, PublicKey) {
        let key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let public = PublicKey::from_rsa(&key.to_public_key(), 1_700_000_000);
        (key, public)
    }

    #[test]
    fn test_user_id_certification_verifies() {
        let (key, public) = primary();
        let sig = SignatureBuilder::new(SIG_POSITIVE_CERTIFICATION, 1_700_000_000)
            .key_flags(KEY_FLAG_CERTIFY | KEY_FLAG_SIGN)
            .algorithm_preferences()
            .primary_user_id()
            .sign_user_id(&key, &public, "alice")
            .unwrap();

        assert!(sig.verify_user_id(&public, "alice").is_ok());
        assert!(sig.verify_user_id(&public, "mallory").is_err());
        assert!(sig.verify_subkey_binding(&public, &public).is_err());

        assert_eq!(sig.created(), Some(1_700_000_000));
        assert_eq!(sig.key_flags(), Some(KEY_FLAG_CERTIFY | KEY_FLAG_SIGN));
        assert!(sig.is_primary_user_id());
        assert_eq!(sig.issuer_fingerprint(), Some(public.fingerprint()));
    }

    #[test]
    fn test_subkey_binding_verifies() {
        let (key, public) = primary();
        let (_, subkey) = primary();
        let sig = SignatureBuilder::new(SIG_SUBKEY_BINDING, 1_700_000_000)
            .key_flags(KEY_FLAG_ENCRYPT_COMMS | KEY_FLAG_ENCRYPT_STORAGE)
            .sign_subkey_binding(&key, &public, &subkey)
            .unwrap();

        assert!(sig.verify_subkey_binding(&public, &subkey).is_ok());
        assert!(sig.verify_subkey_binding(&subkey, &public).is_err());
        assert!(!sig.is_primary_user_id());
    }

    #[test]
    fn test_packet_decode_matches() {
        let (key, public) = primary();
        let sig = SignatureBuilder::new(SIG_POSITIVE_CERTIFICATION, 7)
            .sign_user_id(&key, &public, "bob")
            .unwrap();

        let packet = sig.to_packet();
        assert_eq!(packet.tag, Tag::Signature);
        let decoded = Signature::decode(&packet.body).unwrap();
        assert_eq!(decoded, sig);
        assert!(decoded.verify_user_id(&public, "bob").is_ok());
    }

    #[test]
    fn test_subpacket_lengths() {
        let long = Subpacket::new(subpacket::FEATURES, vec![0u8; 300]);
        let area = encode_area(&[Subpacket::new(subpacket::KEY_FLAGS, [1]), long.clone()]);
        let decoded = Subpacket::decode_area(&area).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1], long);
    }
}
