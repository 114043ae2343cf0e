#![forbid(unsafe_code)]

//! WS-Security envelope signing.
//!
//! The pipeline is strictly ordered; each step consumes the exact output
//! of the one before it:
//!
//! 1. mark the Body with `wsu:Id`
//! 2. declare every prefix the Body needs inside the Body
//! 3. build the security header with empty DigestValue / SignatureValue
//! 4. freeze the layout (two-space indentation)
//! 5. digest the canonical Body
//! 6. sign the canonical SignedInfo
//! 7. serialize the frozen tree

use crate::header::{insert_security_header, SignatureSlots};
use crate::{BODY_ID, TOKEN_ID};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use solna_c14n::{canonicalize, NamespaceContext};
use solna_core::ns::{attr, node, prefix};
use solna_core::{ns, Error};
use solna_crypto::{DigestMethod, SignatureMethod};
use solna_keys::Credential;
use solna_xml::{qname, Document, FrozenDocument, Layout, NodeId};
use std::collections::BTreeSet;

/// A signed envelope and the bytes that must be transmitted verbatim.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    document: FrozenDocument,
    bytes: Vec<u8>,
}

impl SignedEnvelope {
    pub fn document(&self) -> &Document {
        self.document.document()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Sign an unsigned SOAP envelope with the credential's RSA key and leaf certificate.
pub fn sign(mut doc: Document, credential: &Credential) -> Result<SignedEnvelope, Error> {
    let private_key = credential.rsa_private_key()?;
    let token = STANDARD.encode(credential.leaf_certificate()?);

    let envelope = doc.root_element();
    let body = doc
        .find_child(envelope, node::BODY)
        .ok_or_else(|| Error::Signing("SOAP Body not found".into()))?;
    let header = match doc.find_child(envelope, node::HEADER) {
        Some(header) => header,
        None => doc.prepend_element(envelope, qname(prefix::SOAP_ENV, ns::SOAP_ENV, node::HEADER)),
    };
    if doc.find_by_id(BODY_ID)?.is_some_and(|taken| taken != body) {
        return Err(Error::Signing(format!("Id \"{BODY_ID}\" is already in use")));
    }
    if doc.find_by_id(TOKEN_ID)?.is_some() {
        return Err(Error::Signing(format!("Id \"{TOKEN_ID}\" is already in use")));
    }

    // 1 + 2
    doc.remove_attribute(body, attr::ID)?;
    localize_namespaces(&mut doc, body)?;
    doc.declare_namespace(body, prefix::WSU, ns::WSU)?;
    doc.set_attribute(body, qname(prefix::WSU, ns::WSU, attr::ID), BODY_ID)?;

    // 3
    let slots = insert_security_header(&mut doc, header, &token, &format!("#{BODY_ID}"))?;
    let security = doc
        .find_child(header, node::SECURITY)
        .ok_or_else(|| Error::Signing("security header not inserted".into()))?;
    for p in [prefix::WSSE, prefix::WSU, prefix::DSIG] {
        if !prefix_used_outside(&doc, envelope, &[body, security], p) {
            doc.remove_namespace(envelope, p)?;
        }
    }

    // 4
    let mut frozen = doc.freeze(Layout::Indented(2));

    // 5 + 6
    let SignatureSlots {
        signed_info,
        digest_value,
        signature_value,
    } = slots;
    let digest = DigestMethod::Sha256.digest(&canonicalize(&frozen, body)?);
    frozen.fill_text(digest_value, &STANDARD.encode(&digest))?;

    let signed_info_c14n = canonicalize(&frozen, signed_info)?;
    let signature = SignatureMethod::RsaSha256.sign(private_key, &signed_info_c14n)?;
    frozen.fill_text(signature_value, &STANDARD.encode(&signature))?;

    // 7
    let bytes = frozen.to_bytes();
    tracing::debug!(
        digest = %STANDARD.encode(&digest),
        signature_len = signature.len(),
        envelope_len = bytes.len(),
        "envelope signed"
    );
    Ok(SignedEnvelope {
        document: frozen,
        bytes,
    })
}

/// Make the subtree at `root` self-contained: any prefix used inside it
/// but bound only on an ancestor is re-declared on the element where it
/// is first used.
fn localize_namespaces(doc: &mut Document, root: NodeId) -> Result<(), Error> {
    let outer = NamespaceContext::inherited(doc, root);
    let mut pending = vec![(root, BTreeSet::<String>::new())];

    while let Some((id, mut declared)) = pending.pop() {
        let Some(elem) = doc.element(id) else { continue };
        declared.extend(elem.namespace_declarations.iter().map(|(p, _)| p.to_string()));

        let mut used: BTreeSet<String> = BTreeSet::new();
        used.insert(elem.name.prefix.as_deref().unwrap_or("").to_owned());
        used.extend(
            elem.attributes
                .iter()
                .filter_map(|a| a.name.prefix.as_deref().map(str::to_owned)),
        );

        for p in used {
            if p == prefix::XML || declared.contains(&p) {
                continue;
            }
            match outer.get(&p) {
                Some(uri) => {
                    let uri = uri.to_owned();
                    doc.declare_namespace(id, &p, &uri)?;
                    declared.insert(p);
                }
                None if p.is_empty() => {}
                None => {
                    return Err(Error::Signing(format!(
                        "namespace prefix \"{p}\" is not bound"
                    )));
                }
            }
        }

        let children: Vec<NodeId> = doc.child_elements(id).collect();
        for child in children.into_iter().rev() {
            pending.push((child, declared.clone()));
        }
    }
    Ok(())
}

/// Whether an element outside the `skip` subtrees uses `prefix` in its
/// own name or in one of its attribute names.
fn prefix_used_outside(doc: &Document, root: NodeId, skip: &[NodeId], prefix: &str) -> bool {
    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
        if skip.contains(&id) {
            continue;
        }
        let Some(elem) = doc.element(id) else { continue };
        let uses = elem.name.prefix.as_deref() == Some(prefix)
            || elem
                .attributes
                .iter()
                .any(|a| a.name.prefix.as_deref() == Some(prefix));
        if uses {
            return true;
        }
        pending.extend(doc.child_elements(id));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::{verify, VerifyResult};
    use solna_keys::load_pem_bundle;
    use solna_xml::QName;

    fn credential(name: &str) -> Credential {
        let path = format!("{}/../../test-data/keys/{name}", env!("CARGO_MANIFEST_DIR"));
        let data = std::fs::read(&path).unwrap();
        load_pem_bundle(&data, None).unwrap()
    }

    fn soap(local: &'static str) -> QName<'static> {
        qname(prefix::SOAP_ENV, ns::SOAP_ENV, local)
    }

    fn cybs(local: &'static str) -> QName<'static> {
        qname(prefix::CYBS, ns::CYBS, local)
    }

    fn envelope() -> Document {
        let mut doc = Document::new(soap(node::ENVELOPE));
        let root = doc.root_element();
        doc.declare_namespace(root, prefix::SOAP_ENV, ns::SOAP_ENV).unwrap();
        doc
    }

    fn unsigned() -> Document {
        let mut doc = envelope();
        let root = doc.root_element();
        doc.declare_namespace(root, prefix::CYBS, ns::CYBS).unwrap();
        doc.declare_namespace(root, prefix::DSIG, ns::DSIG).unwrap();
        doc.append_element(root, soap(node::HEADER));
        let body = doc.append_element(root, soap(node::BODY));
        let msg = doc.append_element(body, cybs("requestMessage"));
        doc.append_text_element(msg, cybs("merchantID"), "test_merchant");
        doc.append_text_element(msg, cybs("merchantReferenceCode"), "ORDER-1");
        doc
    }

    #[test]
    fn test_sign_and_verify() {
        let signed = sign(unsigned(), &credential("rsa-2048-bundle.pem")).unwrap();
        assert_eq!(verify(signed.as_bytes()).unwrap(), VerifyResult::Valid);
    }

    #[test]
    fn test_signed_layout() {
        let signed = sign(unsigned(), &credential("rsa-2048-bundle.pem")).unwrap();
        let text = String::from_utf8(signed.as_bytes().to_vec()).unwrap();

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<SOAP-ENV:Envelope"));
        assert!(text.ends_with("</SOAP-ENV:Envelope>\n"));
        assert!(text.contains("\n  <SOAP-ENV:Header>\n    <wsse:Security"));
        assert!(text.contains(
            "<SOAP-ENV:Body xmlns:SOAP-ENV=\"http://schemas.xmlsoap.org/soap/envelope/\" \
             xmlns:wsu=\"http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd\" \
             wsu:Id=\"Body\">"
        ));
        assert!(text.contains(
            "<ns1:requestMessage xmlns:ns1=\"urn:schemas-cybersource-com:transaction-data-1.111\">"
        ));

        let doc = signed.document();
        let root = doc.root_element();
        assert_eq!(doc.declared_namespace(root, prefix::DSIG), None);
        assert_eq!(doc.declared_namespace(root, prefix::SOAP_ENV), Some(ns::SOAP_ENV));
    }

    #[test]
    fn test_bytes_match_document() {
        let signed = sign(unsigned(), &credential("rsa-2048-bundle.pem")).unwrap();
        let rendered = solna_xml::writer::serialize(signed.document());
        assert_eq!(rendered, signed.as_bytes());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let cred = credential("rsa-2048-bundle.pem");
        let first = sign(unsigned(), &cred).unwrap();
        let second = sign(unsigned(), &cred).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signed = sign(unsigned(), &credential("rsa-2048-bundle.pem")).unwrap();
        let text = String::from_utf8(signed.into_bytes()).unwrap();
        let tampered = text.replace("ORDER-1", "ORDER-2");
        assert_ne!(text, tampered);
        match verify(tampered.as_bytes()).unwrap() {
            VerifyResult::Invalid { reason } => assert!(reason.contains("digest")),
            VerifyResult::Valid => panic!("tampered envelope verified"),
        }
    }

    #[test]
    fn test_missing_header_is_created() {
        let mut doc = envelope();
        let root = doc.root_element();
        doc.append_element(root, soap(node::BODY));
        let signed = sign(doc, &credential("rsa-2048-bundle.pem")).unwrap();

        let first = signed.document().child_elements(root).next().unwrap();
        assert_eq!(signed.document().element(first).unwrap().name.local_name, node::HEADER);
        assert_eq!(verify(signed.as_bytes()).unwrap(), VerifyResult::Valid);
    }

    #[test]
    fn test_missing_body() {
        let doc = envelope();
        let err = sign(doc, &credential("rsa-2048-bundle.pem")).unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }

    #[test]
    fn test_non_rsa_key() {
        let err = sign(unsigned(), &credential("ec-p256-bundle.pem")).unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }

    #[test]
    fn test_missing_private_key() {
        let cred = credential("rsa-2048-bundle.pem");
        let cert_only = Credential::certificate_only(cred.chain().to_vec());
        assert!(matches!(sign(unsigned(), &cert_only), Err(Error::Signing(_))));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut doc = unsigned();
        let header = doc.find_child(doc.root_element(), node::HEADER).unwrap();
        let other = doc.append_element(header, qname("x", "urn:x", "Other"));
        doc.declare_namespace(other, "x", "urn:x").unwrap();
        doc.set_attribute(other, QName::local(attr::ID), BODY_ID).unwrap();
        let err = sign(doc, &credential("rsa-2048-bundle.pem")).unwrap_err();
        assert!(err.to_string().contains("already in use"));
    }

    #[test]
    fn test_unbound_prefix_in_body() {
        let mut doc = unsigned();
        let body = doc.find_child(doc.root_element(), node::BODY).unwrap();
        doc.append_element(body, qname("nowhere", "urn:nowhere", "element"));
        let err = sign(doc, &credential("rsa-2048-bundle.pem")).unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }

    #[test]
    fn test_envelope_declarations_kept_when_used_in_header() {
        let mut doc = unsigned();
        let root = doc.root_element();
        doc.declare_namespace(root, prefix::WSU, ns::WSU).unwrap();
        let header = doc.find_child(root, node::HEADER).unwrap();
        let stamp = doc.append_element(header, qname(prefix::WSU, ns::WSU, "Timestamp"));
        doc.append_text_element(stamp, qname(prefix::WSU, ns::WSU, "Created"), "2024-01-01T00:00:00Z");

        let signed = sign(doc, &credential("rsa-2048-bundle.pem")).unwrap();
        let doc = signed.document();
        assert_eq!(doc.declared_namespace(root, prefix::WSU), Some(ns::WSU));
        assert_eq!(doc.declared_namespace(root, prefix::DSIG), None);

        let text = String::from_utf8(signed.as_bytes().to_vec()).unwrap();
        assert!(text.contains("<wsu:Timestamp>"), "{text}");
        solna_xml::parse(signed.as_bytes()).unwrap();
        assert_eq!(verify(signed.as_bytes()).unwrap(), VerifyResult::Valid);
    }

    #[test]
    fn test_envelope_declarations_kept_when_used_on_envelope() {
        let mut doc = unsigned();
        let root = doc.root_element();
        doc.declare_namespace(root, prefix::WSU, ns::WSU).unwrap();
        doc.set_attribute(root, qname(prefix::WSU, ns::WSU, "Created"), "now").unwrap();

        let signed = sign(doc, &credential("rsa-2048-bundle.pem")).unwrap();
        assert_eq!(signed.document().declared_namespace(root, prefix::WSU), Some(ns::WSU));
        assert_eq!(verify(signed.as_bytes()).unwrap(), VerifyResult::Valid);
    }
}
