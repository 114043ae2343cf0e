#![forbid(unsafe_code)]

//! Serialization of a [`Document`] to the exact bytes that go on the wire.
//!
//! Output is the fixed [`DECLARATION`], a newline, the root element
//! rendered compactly by `uppsala` and a trailing newline.  Layout
//! whitespace lives in the tree as text nodes; nothing is added here.

use crate::document::Document;
use crate::DECLARATION;
use uppsala::NodeId;

pub fn serialize(doc: &Document) -> Vec<u8> {
    let body = doc.node_to_xml(doc.root_element());
    let mut out = String::with_capacity(DECLARATION.len() + body.len() + 2);
    out.push_str(DECLARATION);
    out.push('\n');
    out.push_str(&body);
    out.push('\n');
    out.into_bytes()
}

/// Serialize one subtree with no declaration.
pub fn serialize_node(doc: &Document, id: NodeId) -> String {
    doc.node_to_xml(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{qname, QName};

    #[test]
    fn test_serialize_escapes() {
        let mut doc = Document::new(QName::local("a"));
        let root = doc.root_element();
        doc.set_attribute(root, QName::local("v"), "x\"<&>\t\n\r").unwrap();
        doc.append_text(root, "1 < 2 & 3 > 2\r");
        let out = String::from_utf8(serialize(&doc)).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <a v=\"x&quot;&lt;&amp;&gt;&#x9;&#xA;&#xD;\">1 &lt; 2 &amp; 3 &gt; 2&#xD;</a>\n"
        );
    }

    #[test]
    fn test_serialize_node_subtree() {
        let mut doc = Document::new(qname("s", "urn:s", "Envelope"));
        let root = doc.root_element();
        doc.declare_namespace(root, "s", "urn:s").unwrap();
        let body = doc.append_element(root, qname("s", "urn:s", "Body"));
        doc.append_text_element(body, QName::local("x"), "1");
        assert_eq!(serialize_node(&doc, body), "<s:Body><x>1</x></s:Body>");
    }
}
