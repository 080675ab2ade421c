//! Transferable keys: a primary key with its user ids and subkeys

use super::key::{Fingerprint, KeyPacket};
use super::packet::{parse_packets, Packet, Tag};
use super::signature::Signature;
use crate::domain::{DomainError, DomainResult};
use std::convert::Infallible;

/// A user id together with its certifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertifiedUserId {
    pub user_id: String,
    pub certifications: Vec<Signature>,
}

/// A subkey together with its binding signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSubkey {
    pub key: KeyPacket,
    pub bindings: Vec<Signature>,
}

/// One OpenPGP entity in transferable form (RFC 4880 §11.1, §11.2)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferableKey {
    pub primary: KeyPacket,
    pub user_ids: Vec<CertifiedUserId>,
    pub subkeys: Vec<BoundSubkey>,
}

impl TransferableKey {
    pub fn fingerprint(&self) -> Fingerprint {
        self.primary.fingerprint()
    }

    /// True when the primary and every subkey carry secret material
    pub fn is_secret(&self) -> bool {
        self.primary.has_secret() && self.subkeys.iter().all(|sk| sk.key.has_secret())
    }

    /// Packet sequence of the public transferable key
    pub fn public_packets(&self) -> Vec<Packet> {
        let packets = self.packets::<Infallible>(
            self.primary.to_public_packet(Tag::PublicKey),
            |subkey| Ok(subkey.to_public_packet(Tag::PublicSubkey)),
        );
        match packets {
            Ok(packets) => packets,
            Err(never) => match never {},
        }
    }

    /// Packet sequence of the secret transferable key, secret material unprotected
    pub fn secret_packets(&self) -> Result<Vec<Packet>, String> {
        self.packets(self.primary.to_secret_packet(Tag::SecretKey)?, |subkey| {
            subkey.to_secret_packet(Tag::SecretSubkey)
        })
    }

    fn packets<E>(
        &self,
        primary: Packet,
        subkey_packet: impl Fn(&KeyPacket) -> Result<Packet, E>,
    ) -> Result<Vec<Packet>, E> {
        let mut packets = vec![primary];
        for uid in &self.user_ids {
            packets.push(Packet::new(Tag::UserId, uid.user_id.as_bytes().to_vec()));
            packets.extend(uid.certifications.iter().map(Signature::to_packet));
        }
        for subkey in &self.subkeys {
            packets.push(subkey_packet(&subkey.key)?);
            packets.extend(subkey.bindings.iter().map(Signature::to_packet));
        }
        Ok(packets)
    }

    /// Parse a keyring holding exactly one entity
    pub fn parse(bytes: &[u8]) -> DomainResult<Self> {
        let mut keys = Self::parse_all(bytes)?;
        match keys.len() {
            1 => Ok(keys.remove(0)),
            n => Err(DomainError::invalid_keyring(format!(
                "expected exactly one key, found {}",
                n
            ))),
        }
    }

    /// Parse every entity in a keyring
    pub fn parse_all(bytes: &[u8]) -> DomainResult<Vec<Self>> {
        let mut keys: Vec<Self> = Vec::new();

        for packet in parse_packets(bytes)? {
            match packet.tag {
                Tag::PublicKey | Tag::SecretKey => keys.push(Self {
                    primary: KeyPacket::decode(packet.tag, &packet.body)?,
                    user_ids: Vec::new(),
                    subkeys: Vec::new(),
                }),
                Tag::UserId => {
                    let user_id = String::from_utf8(packet.body).map_err(|_| {
                        DomainError::invalid_keyring("user id is not valid UTF-8")
                    })?;
                    current(&mut keys)?.user_ids.push(CertifiedUserId {
                        user_id,
                        certifications: Vec::new(),
                    });
                }
                Tag::PublicSubkey | Tag::SecretSubkey => {
                    let key = KeyPacket::decode(packet.tag, &packet.body)?;
                    current(&mut keys)?.subkeys.push(BoundSubkey {
                        key,
                        bindings: Vec::new(),
                    });
                }
                Tag::Signature => {
                    let signature = Signature::decode(&packet.body)?;
                    let key = current(&mut keys)?;
                    // A signature belongs to the most recent subkey, else user id
                    if let Some(subkey) = key.subkeys.last_mut() {
                        subkey.bindings.push(signature);
                    } else if let Some(uid) = key.user_ids.last_mut() {
                        uid.certifications.push(signature);
                    }
                    // Direct-key signatures on the primary are not retained
                }
                // Trust and other auxiliary packets
                Tag::Other(_) => {}
            }
        }

        Ok(keys)
    }

    /// Verify every certification and subkey binding against the primary
    pub fn verify_self_signatures(&self) -> DomainResult<()> {
        for uid in &self.user_ids {
            if uid.certifications.is_empty() {
                return Err(DomainError::invalid_keyring(format!(
                    "user id {:?} is not certified",
                    uid.user_id
                )));
            }
            for sig in &uid.certifications {
                sig.verify_user_id(&self.primary.public, &uid.user_id)?;
            }
        }
        for subkey in &self.subkeys {
            if subkey.bindings.is_empty() {
                return Err(DomainError::invalid_keyring(format!(
                    "subkey {} is not bound",
                    subkey.key.fingerprint()
                )));
            }
            for sig in &subkey.bindings {
                sig.verify_subkey_binding(&self.primary.public, &subkey.key.public)?;
            }
        }
        Ok(())
    }

    /// User ids whose certifications all verify
    pub fn certified_user_ids(&self) -> Vec<&str> {
        self.user_ids
            .iter()
            .filter(|uid| {
                !uid.certifications.is_empty()
                    && uid
                        .certifications
                        .iter()
                        .all(|sig| sig.verify_user_id(&self.primary.public, &uid.user_id).is_ok())
            })
            .map(|uid| uid.user_id.as_str())
            .collect()
    }
}

fn current(keys: &mut [TransferableKey]) -> DomainResult<&mut TransferableKey> {
    keys.last_mut()
        .ok_or_else(|| DomainError::invalid_keyring("packet found before any primary key"))
}

/// Concatenate encoded packets
pub fn encode_packets(packets: &[Packet]) -> Vec<u8> {
    let mut out = Vec::new();
    for packet in packets {
        packet.encode(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphan_packets_rejected() {
        let mut bytes = Vec::new();
        Packet::new(Tag::UserId, b"alice".to_vec()).encode(&mut bytes);

        assert!(TransferableKey::parse(&bytes).is_err());
    }

    #[test]
    fn test_empty_keyring_has_no_key() {
        assert!(TransferableKey::parse_all(&[]).unwrap().is_empty());
        assert!(TransferableKey::parse(&[]).is_err());
    }
}
