#![forbid(unsafe_code)]

//! PKCS#12 key derivation (RFC 7292 Appendix B) and MAC verification.
//!
//! Only the integrity MAC key comes from this KDF.  Bag encryption uses
//! PBES2, which `pkcs8` decrypts on its own.

use digest::core_api::BlockSizeUser;
use digest::{Digest, FixedOutputReset};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use solna_core::Error;
use zeroize::Zeroizing;

/// KDF diversifier for MAC keys (RFC 7292 B.3).
pub const ID_MAC: u8 = 3;

/// Derive `output_len` bytes with the PKCS#12 KDF over hash `D`.
///
/// `password` is BMP-encoded (see [`password_to_bmp`]).
pub fn pkcs12_kdf<D>(
    id: u8,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
) -> Zeroizing<Vec<u8>>
where
    D: Digest + FixedOutputReset + BlockSizeUser,
{
    let u = <D as Digest>::output_size();
    let v = D::block_size();

    let diversifier = vec![id; v];
    let mut input = extend_to_multiple(salt, v);
    input.extend_from_slice(&extend_to_multiple(password, v));
    let mut input = Zeroizing::new(input);

    let blocks = output_len.div_ceil(u);
    let mut out = Zeroizing::new(Vec::with_capacity(blocks * u));
    let mut hasher = <D as Digest>::new();

    for block in 0..blocks {
        Digest::update(&mut hasher, &diversifier);
        Digest::update(&mut hasher, input.as_slice());
        let mut a = Digest::finalize_reset(&mut hasher);
        for _ in 1..iterations {
            Digest::update(&mut hasher, &a);
            a = Digest::finalize_reset(&mut hasher);
        }
        out.extend_from_slice(&a);

        if block + 1 < blocks {
            let b = extend_to_multiple(&a, v);
            for chunk in input.chunks_mut(v) {
                add_one_plus_b(chunk, &b);
            }
        }
    }
    out.truncate(output_len);
    out
}

/// Repeat `data` until its length is a multiple of `v`; empty stays empty.
fn extend_to_multiple(data: &[u8], v: usize) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }
    let len = data.len().div_ceil(v) * v;
    data.iter().copied().cycle().take(len).collect()
}

/// `block = (block + b + 1) mod 2^(8 * block.len())`
fn add_one_plus_b(block: &mut [u8], b: &[u8]) {
    let mut carry: u16 = 1;
    for (x, y) in block.iter_mut().zip(b).rev() {
        let sum = u16::from(*x) + u16::from(*y) + carry;
        *x = sum as u8;
        carry = sum >> 8;
    }
}

/// UTF-16BE with a two-byte terminator, as RFC 7292 B.1 encodes passwords.
pub fn password_to_bmp(password: &str) -> Zeroizing<Vec<u8>> {
    let mut bmp = Zeroizing::new(Vec::with_capacity(password.len() * 2 + 2));
    if password.is_empty() {
        return bmp;
    }
    for unit in password.encode_utf16() {
        bmp.extend_from_slice(&unit.to_be_bytes());
    }
    bmp.extend_from_slice(&[0, 0]);
    bmp
}

/// Check an HMAC-SHA256 integrity MAC over `data`.
pub fn verify_hmac_sha256(
    password: &str,
    salt: &[u8],
    iterations: u32,
    data: &[u8],
    expected: &[u8],
) -> Result<(), Error> {
    let bmp = password_to_bmp(password);
    let key = pkcs12_kdf::<Sha256>(ID_MAC, &bmp, salt, iterations, 32);
    let mut mac = Hmac::<Sha256>::new_from_slice(&key)
        .map_err(|e| Error::Crypto(format!("HMAC key: {e}")))?;
    mac.update(data);
    mac.verify_slice(expected)
        .map_err(|_| Error::Credential("PKCS#12 MAC verification failed (wrong password?)".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_to_bmp() {
        assert!(password_to_bmp("").is_empty());
        assert_eq!(password_to_bmp("A").as_slice(), &[0x00, 0x41, 0x00, 0x00]);
        assert_eq!(
            password_to_bmp("é€").as_slice(),
            &[0x00, 0xE9, 0x20, 0xAC, 0x00, 0x00]
        );
    }

    #[test]
    fn test_kdf_diversifies_by_id() {
        let password = password_to_bmp("secret123");
        let mac_key = pkcs12_kdf::<Sha256>(ID_MAC, &password, b"saltsalt", 2048, 32);
        let again = pkcs12_kdf::<Sha256>(ID_MAC, &password, b"saltsalt", 2048, 32);
        let other = pkcs12_kdf::<Sha256>(1, &password, b"saltsalt", 2048, 32);
        assert_eq!(mac_key.len(), 32);
        assert_eq!(mac_key, again);
        assert_ne!(mac_key, other);
    }

    #[test]
    fn test_kdf_multi_block_prefix() {
        let password = password_to_bmp("pw");
        let short = pkcs12_kdf::<Sha256>(ID_MAC, &password, b"salt", 3, 32);
        let long = pkcs12_kdf::<Sha256>(ID_MAC, &password, b"salt", 3, 80);
        assert_eq!(long.len(), 80);
        assert_eq!(&long[..32], short.as_slice());
    }

    #[test]
    fn test_add_one_plus_b_carries() {
        let mut block = [0x00, 0xFF, 0xFF];
        add_one_plus_b(&mut block, &[0x00, 0x00, 0x00]);
        assert_eq!(block, [0x01, 0x00, 0x00]);

        let mut wrap = [0xFF, 0xFF];
        add_one_plus_b(&mut wrap, &[0x00, 0x01]);
        assert_eq!(wrap, [0x00, 0x01]);
    }

    #[test]
    fn test_extend_to_multiple() {
        assert_eq!(extend_to_multiple(b"abc", 4), b"abca");
        assert_eq!(extend_to_multiple(b"abcd", 4), b"abcd");
        assert!(extend_to_multiple(b"", 4).is_empty());
    }
}
