#![forbid(unsafe_code)]

//! XML tree support for the Solna signed-SOAP client.
//!
//! A thin layer over `uppsala`: the mutable [`Document`] used to build
//! envelopes, the layout freeze that turns it into a [`FrozenDocument`],
//! byte-faithful serialization and a parser for received bytes.

pub mod document;
pub mod reader;
pub mod writer;

use std::borrow::Cow;

pub use document::{Document, FrozenDocument, Layout};
pub use reader::parse;
pub use uppsala::{Element, NodeId, NodeKind, QName};

/// The XML declaration written at the top of every serialized document.
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// A prefixed name bound to `namespace_uri`.
pub fn qname(
    prefix: impl Into<Cow<'static, str>>,
    namespace_uri: impl Into<Cow<'static, str>>,
    local_name: impl Into<Cow<'static, str>>,
) -> QName<'static> {
    QName::full(prefix, namespace_uri, local_name)
}
