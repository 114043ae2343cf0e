#![forbid(unsafe_code)]

//! Rebuild a [`Document`] from received bytes.
//!
//! The `uppsala` parser keeps every whitespace text node and records each
//! namespace declaration on the element that wrote it, so a received
//! envelope can be canonicalized exactly as its sender did.  Document
//! type declarations are refused outright.

use crate::document::Document;
use solna_core::Error;

/// Parse UTF-8 XML into a [`Document`].
pub fn parse(data: &[u8]) -> Result<Document, Error> {
    let xml = std::str::from_utf8(data)
        .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))?;
    let tree = uppsala::Parser::new()
        .with_forbid_dtd(true)
        .parse(xml)
        .map_err(|e| Error::XmlParse(e.to_string()))?
        .into_static();
    Document::from_tree(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::serialize;
    use uppsala::NodeKind;

    #[test]
    fn test_parse_keeps_whitespace_and_declarations() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                   <s:Envelope xmlns:s=\"urn:s\">\n  <s:Body Id=\"b\">text</s:Body>\n</s:Envelope>\n";
        let doc = parse(xml.as_bytes()).unwrap();
        let root = doc.root_element();
        let envelope = doc.element(root).unwrap();
        assert_eq!(envelope.name.prefixed_name(), "s:Envelope");
        assert_eq!(envelope.name.namespace_uri.as_deref(), Some("urn:s"));
        assert_eq!(doc.declared_namespace(root, "s"), Some("urn:s"));
        assert!(envelope.attributes.is_empty());

        let kinds: Vec<bool> = doc
            .children_iter(root)
            .map(|c| matches!(doc.node_kind(c), Some(NodeKind::Text(_))))
            .collect();
        assert_eq!(kinds, [true, false, true]);

        let body = doc.find_child(root, "Body").unwrap();
        assert_eq!(doc.element(body).unwrap().get_attribute("Id"), Some("b"));
        assert_eq!(doc.text(body), "text");
        assert_eq!(doc.declared_namespace(body, "s"), None);
    }

    #[test]
    fn test_parse_serialize_is_stable() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                   <a xmlns=\"urn:a\" x=\"1&amp;2&#xA;\"><b/>x &lt; y<c>z</c></a>\n";
        let doc = parse(xml.as_bytes()).unwrap();
        assert_eq!(String::from_utf8(serialize(&doc)).unwrap(), xml);
    }

    #[test]
    fn test_parse_unescapes() {
        let doc = parse(b"<a v=\"&quot;q&quot;\">&lt;&amp;&gt;<![CDATA[<raw>]]></a>").unwrap();
        let root = doc.root_element();
        assert_eq!(doc.element(root).unwrap().get_attribute("v"), Some("\"q\""));
        assert_eq!(doc.text(root), "<&><raw>");
    }

    #[test]
    fn test_parse_normalizes_line_endings() {
        let doc = parse(b"<a v=\"1\t2\">x\r\ny\rz</a>").unwrap();
        let root = doc.root_element();
        assert_eq!(doc.element(root).unwrap().get_attribute("v"), Some("1 2"));
        assert_eq!(doc.text(root), "x\ny\nz");
    }

    #[test]
    fn test_parse_rejects_doctype() {
        let xml = b"<!DOCTYPE a [<!ENTITY e \"x\">]><a>&e;</a>";
        assert!(matches!(parse(xml), Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse(b"<a><b></a>").is_err());
        assert!(parse(b"<a>").is_err());
        assert!(parse(b"").is_err());
        assert!(parse(b"<a/><b/>").is_err());
        assert!(parse(b"<p:a/>").is_err());
    }
}
