#![forbid(unsafe_code)]

//! DER walk over PKCS#12 (PFX) structures (RFC 7292).

use crate::kdf;
use crate::Pkcs12Contents;
use der::asn1::{AnyRef, ContextSpecific, ObjectIdentifier, OctetStringRef};
use der::{Reader, SliceReader, Tag, TagNumber};
use pkcs8::pkcs5::EncryptionScheme;
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo};
use solna_core::Error;
use spki::AlgorithmIdentifierRef;
use std::borrow::Cow;
use zeroize::Zeroizing;

// ── OIDs ─────────────────────────────────────────────────────────────

const OID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
const OID_ENCRYPTED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.6");

const OID_KEY_BAG: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.12.10.1.1");
const OID_PKCS8_SHROUDED_KEY_BAG: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.12.10.1.2");
const OID_CERT_BAG: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.12.10.1.3");
const OID_X509_CERTIFICATE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.22.1");

/// Parent arc of the legacy `pbeWithSHAAnd...` schemes.
const OID_PKCS12_PBE_IDS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.12.1");

const OID_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
const OID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");

// ── Decoded structures ───────────────────────────────────────────────

struct ContentInfo<'a> {
    content_type: ObjectIdentifier,
    content: Option<AnyRef<'a>>,
}

struct MacData<'a> {
    algorithm: ObjectIdentifier,
    digest: &'a [u8],
    salt: &'a [u8],
    iterations: u32,
}

struct SafeBag<'a> {
    bag_id: ObjectIdentifier,
    value: AnyRef<'a>,
}

fn malformed(what: &str) -> impl FnOnce(der::Error) -> Error + '_ {
    move |e| Error::Credential(format!("malformed PKCS#12 {what}: {e}"))
}

// ── Top level ────────────────────────────────────────────────────────

pub fn parse_pfx(data: &[u8], password: &str) -> Result<Pkcs12Contents, Error> {
    let (auth_safe, mac) = decode_pfx(data).map_err(malformed("PFX"))?;
    if auth_safe.content_type != OID_DATA {
        return Err(Error::Credential(format!(
            "PKCS#12 authSafe has content type {}, expected data",
            auth_safe.content_type
        )));
    }
    let auth_safe_data = data_octets(&auth_safe).map_err(malformed("authSafe"))?;

    match mac {
        Some(mac) => verify_mac(&mac, auth_safe_data, password)?,
        None => return Err(Error::Credential("PKCS#12 file has no integrity MAC".into())),
    }

    let mut private_keys = Vec::new();
    let mut certificates = Vec::new();

    for info in decode_authenticated_safe(auth_safe_data).map_err(malformed("authSafe"))? {
        let bags_data: Cow<'_, [u8]> = if info.content_type == OID_DATA {
            Cow::Borrowed(data_octets(&info).map_err(malformed("safe contents"))?)
        } else if info.content_type == OID_ENCRYPTED_DATA {
            Cow::Owned(decrypt_encrypted_data(&info, password)?)
        } else {
            // Enveloped (public-key) safes are never written for password containers.
            return Err(Error::UnsupportedAlgorithm(format!(
                "PKCS#12 safe content type {}",
                info.content_type
            )));
        };

        for bag in decode_safe_bags(&bags_data).map_err(malformed("SafeContents"))? {
            if bag.bag_id == OID_PKCS8_SHROUDED_KEY_BAG {
                private_keys.push(decrypt_key_bag(bag.value, password)?);
            } else if bag.bag_id == OID_KEY_BAG {
                let info: PrivateKeyInfo<'_> =
                    bag.value.decode_as().map_err(malformed("KeyBag"))?;
                let der = der::Encode::to_der(&info).map_err(malformed("KeyBag"))?;
                private_keys.push(Zeroizing::new(der));
            } else if bag.bag_id == OID_CERT_BAG {
                if let Some(cert) = decode_cert_bag(bag.value).map_err(malformed("CertBag"))? {
                    certificates.push(cert.to_vec());
                }
            }
        }
    }

    Ok(Pkcs12Contents {
        private_keys,
        certificates,
    })
}

// ── Structure decoding ───────────────────────────────────────────────

/// `PFX ::= SEQUENCE { version INTEGER, authSafe ContentInfo, macData MacData OPTIONAL }`
fn decode_pfx(data: &[u8]) -> der::Result<(ContentInfo<'_>, Option<MacData<'_>>)> {
    let mut reader = SliceReader::new(data)?;
    let pfx = reader.sequence(|r| {
        let version: u8 = r.decode()?;
        if version != 3 {
            return Err(Tag::Integer.value_error());
        }
        let auth_safe = content_info(r)?;
        let mac = if r.is_finished() {
            None
        } else {
            Some(mac_data(r)?)
        };
        Ok((auth_safe, mac))
    })?;
    reader.finish(pfx)
}

/// `ContentInfo ::= SEQUENCE { contentType OID, content [0] EXPLICIT ANY OPTIONAL }`
fn content_info<'a, R: Reader<'a>>(r: &mut R) -> der::Result<ContentInfo<'a>> {
    r.sequence(|r| {
        let content_type = r.decode()?;
        let content = ContextSpecific::<AnyRef<'a>>::decode_explicit(r, TagNumber::N0)?
            .map(|field| field.value);
        Ok(ContentInfo {
            content_type,
            content,
        })
    })
}

/// `MacData ::= SEQUENCE { mac DigestInfo, macSalt OCTET STRING, iterations INTEGER DEFAULT 1 }`
fn mac_data<'a, R: Reader<'a>>(r: &mut R) -> der::Result<MacData<'a>> {
    r.sequence(|r| {
        let (algorithm, digest) = r.sequence(|r| {
            let algorithm: AlgorithmIdentifierRef<'a> = r.decode()?;
            let digest: OctetStringRef<'a> = r.decode()?;
            Ok((algorithm.oid, digest.as_bytes()))
        })?;
        let salt: OctetStringRef<'a> = r.decode()?;
        let iterations = if r.is_finished() { 1 } else { r.decode()? };
        Ok(MacData {
            algorithm,
            digest,
            salt: salt.as_bytes(),
            iterations,
        })
    })
}

/// The OCTET STRING payload of a `data` ContentInfo.
fn data_octets<'a>(info: &ContentInfo<'a>) -> der::Result<&'a [u8]> {
    let content = info
        .content
        .ok_or_else(|| Tag::OctetString.value_error())?;
    let octets: OctetStringRef<'a> = content.decode_as()?;
    Ok(octets.as_bytes())
}

/// `AuthenticatedSafe ::= SEQUENCE OF ContentInfo`
fn decode_authenticated_safe(data: &[u8]) -> der::Result<Vec<ContentInfo<'_>>> {
    let mut reader = SliceReader::new(data)?;
    let infos = reader.sequence(|r| {
        let mut infos = Vec::new();
        while !r.is_finished() {
            infos.push(content_info(r)?);
        }
        Ok(infos)
    })?;
    reader.finish(infos)
}

/// `SafeContents ::= SEQUENCE OF SafeBag`, where
/// `SafeBag ::= SEQUENCE { bagId OID, bagValue [0] EXPLICIT ANY, bagAttributes SET OPTIONAL }`.
fn decode_safe_bags<'a>(data: &'a [u8]) -> der::Result<Vec<SafeBag<'a>>> {
    let mut reader = SliceReader::new(data)?;
    let bags = reader.sequence(|r| {
        let mut bags = Vec::new();
        while !r.is_finished() {
            bags.push(r.sequence(|r| {
                let bag_id = r.decode()?;
                let value = ContextSpecific::<AnyRef<'a>>::decode_explicit(r, TagNumber::N0)?
                    .ok_or_else(|| Tag::Sequence.value_error())?
                    .value;
                if !r.is_finished() {
                    r.tlv_bytes()?;
                }
                Ok(SafeBag { bag_id, value })
            })?);
        }
        Ok(bags)
    })?;
    reader.finish(bags)
}

/// `CertBag ::= SEQUENCE { certId OID, certValue [0] EXPLICIT ANY }`.
///
/// Returns `None` for certificate types other than X.509.
fn decode_cert_bag<'a>(value: AnyRef<'a>) -> der::Result<Option<&'a [u8]>> {
    value.sequence(|r| {
        let cert_id: ObjectIdentifier = r.decode()?;
        let cert = ContextSpecific::<AnyRef<'a>>::decode_explicit(r, TagNumber::N0)?
            .ok_or_else(|| Tag::OctetString.value_error())?
            .value;
        if cert_id != OID_X509_CERTIFICATE {
            return Ok(None);
        }
        let octets: OctetStringRef<'a> = cert.decode_as()?;
        Ok(Some(octets.as_bytes()))
    })
}

// ── Integrity and decryption ─────────────────────────────────────────

fn verify_mac(mac: &MacData<'_>, auth_safe_data: &[u8], password: &str) -> Result<(), Error> {
    if mac.algorithm == OID_SHA256 {
        kdf::verify_hmac_sha256(password, mac.salt, mac.iterations, auth_safe_data, mac.digest)
    } else if mac.algorithm == OID_SHA1 {
        Err(Error::UnsupportedAlgorithm(
            "PKCS#12 MAC digest SHA-1 (legacy container; re-export it without -legacy)".into(),
        ))
    } else {
        Err(Error::UnsupportedAlgorithm(format!(
            "PKCS#12 MAC digest {}",
            mac.algorithm
        )))
    }
}

fn reject_legacy_pbe(algorithm: ObjectIdentifier) -> Result<(), Error> {
    if algorithm.parent() == Some(OID_PKCS12_PBE_IDS) {
        return Err(Error::UnsupportedAlgorithm(format!(
            "legacy PKCS#12 encryption {algorithm} (re-export the container without -legacy)"
        )));
    }
    Ok(())
}

/// `EncryptedData ::= SEQUENCE { version INTEGER, encryptedContentInfo EncryptedContentInfo }`,
/// `EncryptedContentInfo ::= SEQUENCE { contentType OID, contentEncryptionAlgorithm
/// AlgorithmIdentifier, encryptedContent [0] IMPLICIT OCTET STRING OPTIONAL }`.
fn decrypt_encrypted_data(info: &ContentInfo<'_>, password: &str) -> Result<Vec<u8>, Error> {
    let content = info
        .content
        .ok_or_else(|| Error::Credential("PKCS#12 encryptedData has no content".into()))?;
    let (algorithm, ciphertext) = content
        .sequence(|r| {
            let _version: u8 = r.decode()?;
            let encrypted = r.sequence(|r| {
                let _content_type: ObjectIdentifier = r.decode()?;
                let algorithm: AlgorithmIdentifierRef<'_> = r.decode()?;
                let ciphertext =
                    ContextSpecific::<OctetStringRef<'_>>::decode_implicit(r, TagNumber::N0)?
                        .map(|field| field.value.as_bytes())
                        .unwrap_or_default();
                Ok((algorithm, ciphertext))
            })?;
            if !r.is_finished() {
                r.tlv_bytes()?;
            }
            Ok(encrypted)
        })
        .map_err(malformed("encryptedData"))?;

    let oid = algorithm.oid;
    reject_legacy_pbe(oid)?;
    let scheme = EncryptionScheme::try_from(algorithm)
        .map_err(|e| Error::UnsupportedAlgorithm(format!("PKCS#12 safe encryption {oid}: {e}")))?;
    scheme
        .decrypt(password.as_bytes(), ciphertext)
        .map_err(|_| Error::Credential("failed to decrypt PKCS#12 certificate safe".into()))
}

/// A `pkcs8ShroudedKeyBag` holds an `EncryptedPrivateKeyInfo`.
fn decrypt_key_bag(value: AnyRef<'_>, password: &str) -> Result<Zeroizing<Vec<u8>>, Error> {
    let algorithm = value
        .sequence(|r| {
            let algorithm: AlgorithmIdentifierRef<'_> = r.decode()?;
            r.tlv_bytes()?;
            Ok(algorithm.oid)
        })
        .map_err(malformed("shrouded key bag"))?;
    reject_legacy_pbe(algorithm)?;

    let encrypted: EncryptedPrivateKeyInfo<'_> = value
        .decode_as()
        .map_err(malformed("shrouded key bag"))?;
    let document = encrypted
        .decrypt(password)
        .map_err(|_| Error::Credential("failed to decrypt PKCS#12 private key".into()))?;
    Ok(Zeroizing::new(document.as_bytes().to_vec()))
}
