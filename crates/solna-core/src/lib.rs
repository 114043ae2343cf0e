#![forbid(unsafe_code)]

//! Core types for the Solna signed SOAP client.
//!
//! Everything here is shared by the other workspace crates: the single
//! [`Error`] enum, namespace URIs and element names of the envelope, and
//! the algorithm identifiers used in the WS-Security header.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
