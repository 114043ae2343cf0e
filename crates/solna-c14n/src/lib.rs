#![forbid(unsafe_code)]

//! Exclusive XML Canonicalization 1.0 (without comments, empty
//! InclusiveNamespaces prefix list) over `uppsala::Document` subtrees.
//!
//! Canonicalization is a pure function of a subtree plus an explicit
//! [`NamespaceContext`]; nothing is read from the surrounding document.

pub mod escape;
pub mod exclusive;
pub mod render;

pub use exclusive::{canonicalize, canonicalize_with, NamespaceContext};

use solna_core::algorithm;

/// True when `uri` names the canonicalization implemented here.
pub fn is_supported(uri: &str) -> bool {
    uri == algorithm::EXC_C14N
}
