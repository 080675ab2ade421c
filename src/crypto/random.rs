use crate::domain::DomainResult;
use rand::rngs::OsRng;
use rand::RngCore;

/// Fill a buffer of `len` bytes from the operating system's CSPRNG
pub fn random_bytes(len: usize) -> DomainResult<Vec<u8>> {
    let mut buf = vec![0u8; len];
    OsRng.try_fill_bytes(&mut buf)?;
    Ok(buf)
}

/// `len` random bytes, lowercase hex encoded (2 * len characters)
pub fn random_hex(len: usize) -> DomainResult<String> {
    Ok(hex::encode(random_bytes(len)?))
}
