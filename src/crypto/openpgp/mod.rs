//! Minimal OpenPGP (RFC 4880) codec for RSA transferable keys

pub mod cert;
pub mod key;
pub mod packet;
pub mod signature;

pub use cert::{encode_packets, BoundSubkey, CertifiedUserId, TransferableKey};
pub use key::{Fingerprint, KeyPacket, PublicKey, SecretKey};
pub use packet::{parse_packets, Mpi, Packet, Tag};
pub use signature::{Signature, SignatureBuilder};
