//! OpenPGP packet framing and multiprecision integers (RFC 4880 §3.2, §4)

use crate::domain::{DomainError, DomainResult};

/// Packet tags used in transferable keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Signature,
    SecretKey,
    PublicKey,
    SecretSubkey,
    UserId,
    PublicSubkey,
    Other(u8),
}

impl Tag {
    pub fn from_u8(value: u8) -> Self {
        match value {
            2 => Self::Signature,
            5 => Self::SecretKey,
            6 => Self::PublicKey,
            7 => Self::SecretSubkey,
            13 => Self::UserId,
            14 => Self::PublicSubkey,
            other => Self::Other(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Signature => 2,
            Self::SecretKey => 5,
            Self::PublicKey => 6,
            Self::SecretSubkey => 7,
            Self::UserId => 13,
            Self::PublicSubkey => 14,
            Self::Other(value) => value,
        }
    }
}

/// A raw packet: tag plus undecoded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub tag: Tag,
    pub body: Vec<u8>,
}

impl Packet {
    pub fn new(tag: Tag, body: Vec<u8>) -> Self {
        Self { tag, body }
    }

    /// Append the packet with a new-format header
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(0xC0 | self.tag.as_u8());
        encode_length(self.body.len(), out);
        out.extend_from_slice(&self.body);
    }
}

fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 192 {
        out.push(len as u8);
    } else if len < 8384 {
        let adjusted = len - 192;
        out.push(((adjusted >> 8) as u8) + 192);
        out.push((adjusted & 0xFF) as u8);
    } else {
        out.push(0xFF);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
}

/// Split a binary keyring into packets; accepts old- and new-format headers
pub fn parse_packets(mut input: &[u8]) -> DomainResult<Vec<Packet>> {
    let mut packets = Vec::new();

    while !input.is_empty() {
        let ctb = take_u8(&mut input)?;
        if ctb & 0x80 == 0 {
            return Err(DomainError::invalid_keyring(format!(
                "invalid packet header byte 0x{:02x}",
                ctb
            )));
        }

        let (tag, len) = if ctb & 0x40 != 0 {
            let tag = ctb & 0x3F;
            let first = take_u8(&mut input)? as usize;
            let len = match first {
                0..=191 => first,
                192..=223 => {
                    let second = take_u8(&mut input)? as usize;
                    ((first - 192) << 8) + second + 192
                }
                255 => take_u32(&mut input)? as usize,
                _ => {
                    return Err(DomainError::invalid_keyring(
                        "partial body lengths are not valid in a keyring",
                    ))
                }
            };
            (tag, len)
        } else {
            let tag = (ctb >> 2) & 0x0F;
            let len = match ctb & 0x03 {
                0 => take_u8(&mut input)? as usize,
                1 => u16::from_be_bytes(take_array(&mut input)?) as usize,
                2 => take_u32(&mut input)? as usize,
                _ => input.len(),
            };
            (tag, len)
        };

        let body = take_slice(&mut input, len)?;
        packets.push(Packet::new(Tag::from_u8(tag), body.to_vec()));
    }

    Ok(packets)
}

pub(crate) fn take_u8(input: &mut &[u8]) -> DomainResult<u8> {
    Ok(take_array::<1>(input)?[0])
}

pub(crate) fn take_u32(input: &mut &[u8]) -> DomainResult<u32> {
    Ok(u32::from_be_bytes(take_array(input)?))
}

pub(crate) fn take_array<const N: usize>(input: &mut &[u8]) -> DomainResult<[u8; N]> {
    let bytes = take_slice(input, N)?;
    let mut array = [0u8; N];
    array.copy_from_slice(bytes);
    Ok(array)
}

pub(crate) fn take_slice<'a>(input: &mut &'a [u8], len: usize) -> DomainResult<&'a [u8]> {
    if input.len() < len {
        return Err(DomainError::invalid_keyring(format!(
            "truncated data: need {} bytes, have {}",
            len,
            input.len()
        )));
    }
    let (head, tail) = input.split_at(len);
    *input = tail;
    Ok(head)
}

/// Big-endian unsigned integer with a bit-count prefix
#[derive(Clone, PartialEq, Eq)]
pub struct Mpi(Vec<u8>);

impl Mpi {
    /// Build from big-endian bytes, dropping leading zeros
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        Self(bytes[start..].to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Significant bits
    pub fn bits(&self) -> usize {
        match self.0.first() {
            Some(&first) => (self.0.len() - 1) * 8 + (8 - first.leading_zeros() as usize),
            None => 0,
        }
    }

    /// Value left-padded with zeros to exactly `len` bytes
    pub fn to_padded(&self, len: usize) -> Vec<u8> {
        let mut padded = vec![0u8; len.saturating_sub(self.0.len())];
        padded.extend_from_slice(&self.0);
        padded
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.bits() as u16).to_be_bytes());
        out.extend_from_slice(&self.0);
    }

    pub fn decode(input: &mut &[u8]) -> DomainResult<Self> {
        let bits = u16::from_be_bytes(take_array(input)?) as usize;
        let bytes = take_slice(input, (bits + 7) / 8)?;
        Ok(Self::from_be_bytes(bytes))
    }
}

impl std::fmt::Debug for Mpi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mpi({} bits)", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_format_lengths() {
        for len in [0usize, 191, 192, 8383, 8384, 70000] {
            let mut out = Vec::new();
            Packet::new(Tag::UserId, vec![0xAB; len]).encode(&mut out);

            let packets = parse_packets(&out).unwrap();
            assert_eq!(packets.len(), 1, "len {}", len);
            assert_eq!(packets[0].tag, Tag::UserId);
            assert_eq!(packets[0].body.len(), len);
        }
    }

    #[test]
    fn test_old_format_header() {
        // Old-format user id packet (tag 13), one-octet length
        let bytes = [0xB4, 0x03, b'b', b'o', b'b'];
        let packets = parse_packets(&bytes).unwrap();
        assert_eq!(packets[0].tag, Tag::UserId);
        assert_eq!(packets[0].body, b"bob");

        // Old-format public key (tag 6), two-octet length
        let mut bytes = vec![0x99, 0x00, 0x02, 0x04, 0x00];
        bytes.extend_from_slice(&[0xB4, 0x00]);
        let packets = parse_packets(&bytes).unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].tag, Tag::PublicKey);
        assert!(packets[1].body.is_empty());
    }

    #[test]
    fn test_rejects_garbage_and_truncation() {
        assert!(parse_packets(b"plain text").is_err());
        assert!(parse_packets(&[0xCD, 0x05, b'a']).is_err());
    }

    #[test]
    fn test_mpi_encoding() {
        let mpi = Mpi::from_be_bytes(&[0x00, 0x00, 0x01, 0x00, 0x01]);
        assert_eq!(mpi.bits(), 17);
        assert_eq!(mpi.as_bytes(), &[0x01, 0x00, 0x01]);

        let mut out = Vec::new();
        mpi.encode(&mut out);
        assert_eq!(out, vec![0x00, 0x11, 0x01, 0x00, 0x01]);

        let mut input = out.as_slice();
        assert_eq!(Mpi::decode(&mut input).unwrap(), mpi);
        assert!(input.is_empty());

        assert_eq!(mpi.to_padded(5), vec![0, 0, 1, 0, 1]);
        assert_eq!(Mpi::from_be_bytes(&[0, 0]).bits(), 0);
    }
}
