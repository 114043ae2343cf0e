#![forbid(unsafe_code)]

//! Cryptographic primitives used by WS-Security signing.
//!
//! Only the algorithm pair the decision service accepts is implemented:
//! SHA-256 for reference digests and RSA PKCS#1 v1.5 over SHA-256 for the
//! signature value.  Both are selected by their XML-DSig URIs so that the
//! verifier can reject anything else with a precise error.

pub mod digest;
pub mod sign;

pub use digest::DigestMethod;
pub use sign::SignatureMethod;
