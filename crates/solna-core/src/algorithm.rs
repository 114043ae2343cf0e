#![forbid(unsafe_code)]

//! Algorithm and token-profile URIs that appear in the security header.
//!
//! Only one signature suite is supported: exclusive C14N without comments,
//! SHA-256 digests and RSA PKCS#1 v1.5 signatures over SHA-256.

// ── Canonicalization ─────────────────────────────────────────────────

pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

// ── Digest ───────────────────────────────────────────────────────────

pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

// ── Signature ────────────────────────────────────────────────────────

pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";

// ── WS-Security X.509 token profile ──────────────────────────────────

pub const X509_V3_TOKEN: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-x509-token-profile-1.0#X509v3";
pub const BASE64_BINARY: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";
