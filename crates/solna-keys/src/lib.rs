#![forbid(unsafe_code)]

//! Credential material for the Solna signed-SOAP client.
//!
//! A [`Credential`] bundles the private key, its decoded form and the
//! certificate chain.  The same credential authenticates the TLS channel
//! and signs the XML, so it is loaded once and shared.  Loading is behind
//! the [`CredentialStore`] trait: [`PemBundleStore`] reads a PEM bundle,
//! [`Pkcs12Store`] a `.p12`/`.pfx` container, and [`open`] picks between
//! them for a given file.

pub mod key;
pub mod loader;
pub mod store;
pub mod x509;

pub use key::{Credential, KeyData};
pub use loader::{load_pem_bundle, load_pkcs12};
pub use store::{open, CredentialStore, PemBundleStore, Pkcs12Store};
