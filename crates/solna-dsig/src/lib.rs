#![forbid(unsafe_code)]

//! WS-Security signing for SOAP envelopes.
//!
//! [`sign`] turns an unsigned envelope into the exact bytes to transmit:
//! a `wsse:Security` header carrying the X.509 token and a `ds:Signature`
//! over the SOAP Body (exclusive C14N, SHA-256, RSA-SHA256).  [`verify`]
//! checks such an envelope the way the receiving service does.

pub mod header;
pub mod sign;
pub mod verify;

pub use sign::{sign, SignedEnvelope};
pub use verify::{verify, VerifyResult};

/// `wsu:Id` given to the SOAP Body.
pub const BODY_ID: &str = "Body";

/// `wsu:Id` given to the BinarySecurityToken.
pub const TOKEN_ID: &str = "X509Token";
