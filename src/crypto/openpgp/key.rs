//! Version 4 RSA key packets (RFC 4880 §5.5)

use super::packet::{take_array, take_u32, take_u8, Mpi, Packet, Tag};
use crate::domain::{DomainError, DomainResult};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use std::fmt;

const KEY_VERSION: u8 = 4;

/// RSA (Encrypt or Sign)
pub const PUBKEY_ALGO_RSA: u8 = 1;

/// S2K usage octet for unprotected secret material
const S2K_UNPROTECTED: u8 = 0;

/// V4 key fingerprint (SHA-1)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 20]);

impl Fingerprint {
    /// Low 64 bits, as used in issuer subpackets
    pub fn key_id(&self) -> [u8; 8] {
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.0[12..]);
        id
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

/// Public half of an RSA key packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub created: u32,
    pub n: Mpi,
    pub e: Mpi,
}

impl PublicKey {
    pub fn from_rsa(key: &RsaPublicKey, created: u32) -> Self {
        Self {
            created,
            n: Mpi::from_be_bytes(&key.n().to_bytes_be()),
            e: Mpi::from_be_bytes(&key.e().to_bytes_be()),
        }
    }

    pub fn to_rsa(&self) -> DomainResult<RsaPublicKey> {
        RsaPublicKey::new(
            BigUint::from_bytes_be(self.n.as_bytes()),
            BigUint::from_bytes_be(self.e.as_bytes()),
        )
        .map_err(|e| DomainError::invalid_keyring(format!("unusable RSA public key: {}", e)))
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.n.bits()
    }

    /// Public key packet body
    pub fn body(&self) -> Vec<u8> {
        let mut body = vec![KEY_VERSION];
        body.extend_from_slice(&self.created.to_be_bytes());
        body.push(PUBKEY_ALGO_RSA);
        self.n.encode(&mut body);
        self.e.encode(&mut body);
        body
    }

    /// The `0x99 || len || body` framing hashed by fingerprints and signatures
    pub fn hash_prefix(&self) -> Vec<u8> {
        let body = self.body();
        let mut framed = Vec::with_capacity(body.len() + 3);
        framed.push(0x99);
        framed.extend_from_slice(&(body.len() as u16).to_be_bytes());
        framed.extend_from_slice(&body);
        framed
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint(Sha1::digest(self.hash_prefix()).into())
    }

    fn decode(input: &mut &[u8]) -> DomainResult<Self> {
        let version = take_u8(input)?;
        if version != KEY_VERSION {
            return Err(DomainError::invalid_keyring(format!(
                "unsupported key version {}",
                version
            )));
        }
        let created = take_u32(input)?;
        let algo = take_u8(input)?;
        if algo != PUBKEY_ALGO_RSA {
            return Err(DomainError::invalid_keyring(format!(
                "unsupported public key algorithm {}",
                algo
            )));
        }
        Ok(Self {
            created,
            n: Mpi::decode(input)?,
            e: Mpi::decode(input)?,
        })
    }
}

/// Unprotected RSA secret parameters, with p < q and u = p^-1 mod q
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    pub d: Mpi,
    pub p: Mpi,
    pub q: Mpi,
    pub u: Mpi,
}

impl SecretKey {
    pub fn from_rsa(key: &RsaPrivateKey) -> DomainResult<Self> {
        let primes = key.primes();
        if primes.len() != 2 {
            return Err(DomainError::KeyGeneration(format!(
                "expected a two-prime RSA key, got {} primes",
                primes.len()
            )));
        }

        let (p, q) = if primes[0] < primes[1] {
            (&primes[0], &primes[1])
        } else {
            (&primes[1], &primes[0])
        };
        // q is prime, so p^(q-2) == p^-1 (mod q)
        let u = p.modpow(&(q - &BigUint::from(2u32)), q);

        Ok(Self {
            d: Mpi::from_be_bytes(&key.d().to_bytes_be()),
            p: Mpi::from_be_bytes(&p.to_bytes_be()),
            q: Mpi::from_be_bytes(&q.to_bytes_be()),
            u: Mpi::from_be_bytes(&u.to_bytes_be()),
        })
    }

    /// Rebuild a signing key from packet material
    pub fn to_rsa(&self, public: &PublicKey) -> DomainResult<RsaPrivateKey> {
        let to_uint = |mpi: &Mpi| BigUint::from_bytes_be(mpi.as_bytes());
        RsaPrivateKey::from_components(
            to_uint(&public.n),
            to_uint(&public.e),
            to_uint(&self.d),
            vec![to_uint(&self.p), to_uint(&self.q)],
        )
        .map_err(|e| DomainError::invalid_keyring(format!("unusable RSA secret key: {}", e)))
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let mut material = Vec::new();
        for mpi in [&self.d, &self.p, &self.q, &self.u] {
            mpi.encode(&mut material);
        }
        out.push(S2K_UNPROTECTED);
        out.extend_from_slice(&material);
        out.extend_from_slice(&checksum(&material).to_be_bytes());
    }

    fn decode(input: &mut &[u8]) -> DomainResult<Self> {
        let usage = take_u8(input)?;
        if usage != S2K_UNPROTECTED {
            return Err(DomainError::invalid_keyring(
                "passphrase-protected secret keys are not supported",
            ));
        }

        let start = *input;
        let d = Mpi::decode(input)?;
        let p = Mpi::decode(input)?;
        let q = Mpi::decode(input)?;
        let u = Mpi::decode(input)?;
        let material = &start[..start.len() - input.len()];

        let expected = u16::from_be_bytes(take_array(input)?);
        if checksum(material) != expected {
            return Err(DomainError::invalid_keyring("secret key checksum mismatch"));
        }

        Ok(Self { d, p, q, u })
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

fn checksum(material: &[u8]) -> u16 {
    material
        .iter()
        .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)))
}

/// A key packet: public material plus optional unprotected secret material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPacket {
    pub public: PublicKey,
    pub secret: Option<SecretKey>,
}

impl KeyPacket {
    pub fn fingerprint(&self) -> Fingerprint {
        self.public.fingerprint()
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Public-only packet with the given tag (public key or public subkey)
    pub fn to_public_packet(&self, tag: Tag) -> Packet {
        Packet::new(tag, self.public.body())
    }

    /// Secret packet with the given tag; fails when no secret material is held
    pub fn to_secret_packet(&self, tag: Tag) -> Result<Packet, String> {
        let secret = self
            .secret
            .as_ref()
            .ok_or_else(|| format!("key {} has no secret material", self.fingerprint()))?;
        let mut body = self.public.body();
        secret.encode(&mut body);
        Ok(Packet::new(tag, body))
    }

    /// Decode a public or secret key packet body
    pub fn decode(tag: Tag, body: &[u8]) -> DomainResult<Self> {
        let mut input = body;
        let public = PublicKey::decode(&mut input)?;
        let secret = match tag {
            Tag::SecretKey | Tag::SecretSubkey => Some(SecretKey::decode(&mut input)?),
            _ => None,
        };
        if !input.is_empty() {
            return Err(DomainError::invalid_keyring(format!(
                "{} trailing bytes in key packet",
                input.len()
            )));
        }
        Ok(Self { public, secret })
    }
}
