#![forbid(unsafe_code)]

//! Namespace declarations and attributes as they appear in canonical output.
//!
//! The derived orderings are the canonical ones: the empty prefix (default
//! namespace) sorts before every other prefix, and un-namespaced attributes
//! (empty URI) sort before namespaced ones.

use crate::escape::escape_attr;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NsDecl {
    pub prefix: String,
    pub uri: String,
}

impl NsDecl {
    pub fn write_to(&self, out: &mut String) {
        if self.prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(&self.prefix);
            out.push_str("=\"");
        }
        out.push_str(&escape_attr(&self.uri));
        out.push('"');
    }
}

/// Sort key first (`ns_uri`, `local_name`), then the rendered form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Attr {
    pub ns_uri: String,
    pub local_name: String,
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn write_to(&self, out: &mut String) {
        out.push(' ');
        out.push_str(&self.qualified_name);
        out.push_str("=\"");
        out.push_str(&escape_attr(&self.value));
        out.push('"');
    }
}
