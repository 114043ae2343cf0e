#![forbid(unsafe_code)]

//! WS-Security signature verification.
//!
//! Checks a signed envelope the way the receiving service does: subtrees
//! are canonicalized with the namespace bindings in scope at their root in
//! the received document, references are resolved through `wsu:Id`, and the
//! key comes from the BinarySecurityToken that KeyInfo points at.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use solna_c14n::{canonicalize_with, NamespaceContext};
use solna_core::ns::{attr, node};
use solna_core::{algorithm, Error};
use solna_crypto::{DigestMethod, SignatureMethod};
use solna_keys::x509;
use solna_xml::{Document, NodeId};

/// Result of signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid,
    Invalid { reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid)
    }

    fn invalid(reason: impl Into<String>) -> Self {
        VerifyResult::Invalid {
            reason: reason.into(),
        }
    }
}

/// Verify a signed SOAP envelope.
pub fn verify(xml: &[u8]) -> Result<VerifyResult, Error> {
    let doc = solna_xml::parse(xml)?;

    let envelope = doc.root_element();
    let header = required_child(&doc, envelope, node::HEADER)?;
    let security = required_child(&doc, header, node::SECURITY)?;
    let signature = required_child(&doc, security, node::SIGNATURE)?;
    let signed_info = required_child(&doc, signature, node::SIGNED_INFO)?;

    let c14n_method = required_child(&doc, signed_info, node::CANONICALIZATION_METHOD)?;
    let c14n_uri = algorithm_of(&doc, c14n_method)?;
    if !solna_c14n::is_supported(c14n_uri) {
        return Err(Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")));
    }
    let sig_method = required_child(&doc, signed_info, node::SIGNATURE_METHOD)?;
    let sig_method = SignatureMethod::from_uri(algorithm_of(&doc, sig_method)?)?;

    let references: Vec<NodeId> = doc
        .child_elements(signed_info)
        .filter(|&c| local_name(&doc, c) == Some(node::REFERENCE))
        .collect();
    if references.is_empty() {
        return Ok(VerifyResult::invalid("SignedInfo has no Reference"));
    }

    for reference in references {
        if let VerifyResult::Invalid { reason } = check_reference(&doc, reference)? {
            return Ok(VerifyResult::invalid(reason));
        }
    }

    let token = match resolve_token(&doc, signature)? {
        Some(token) => token,
        None => return Ok(VerifyResult::invalid("security token not found")),
    };
    let cert_der = decode_base64(&doc.text(token))?;
    let public_key = x509::rsa_public_key(&cert_der)?;

    let sig_value = required_child(&doc, signature, node::SIGNATURE_VALUE)?;
    let sig_bytes = decode_base64(&doc.text(sig_value))?;

    let signed_info_c14n = canonicalize_in_place(&doc, signed_info)?;
    if sig_method.verify(&public_key, &signed_info_c14n, &sig_bytes)? {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::invalid("signature value does not match SignedInfo"))
    }
}

fn check_reference(doc: &Document, reference: NodeId) -> Result<VerifyResult, Error> {
    let uri = doc
        .element(reference)
        .and_then(|e| e.get_attribute(attr::URI))
        .unwrap_or("");
    let Some(id) = uri.strip_prefix('#') else {
        return Ok(VerifyResult::invalid(format!(
            "unsupported reference URI \"{uri}\""
        )));
    };
    let Some(target) = doc.find_by_id(id)? else {
        return Ok(VerifyResult::invalid(format!("reference {uri} not found")));
    };

    if let Some(transforms) = doc.find_child(reference, node::TRANSFORMS) {
        for transform in doc.child_elements(transforms) {
            let transform_uri = algorithm_of(doc, transform)?;
            if !solna_c14n::is_supported(transform_uri) {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "transform: {transform_uri}"
                )));
            }
        }
    }

    let digest_method = required_child(doc, reference, node::DIGEST_METHOD)?;
    let digest_method = DigestMethod::from_uri(algorithm_of(doc, digest_method)?)?;
    let digest_value = required_child(doc, reference, node::DIGEST_VALUE)?;
    let expected = decode_base64(&doc.text(digest_value))?;

    let actual = digest_method.digest(&canonicalize_in_place(doc, target)?);
    if actual == expected {
        Ok(VerifyResult::Valid)
    } else {
        tracing::debug!(reference = uri, "digest mismatch");
        Ok(VerifyResult::invalid(format!("digest mismatch for reference {uri}")))
    }
}

/// KeyInfo/SecurityTokenReference/Reference → the BinarySecurityToken it names.
fn resolve_token(doc: &Document, signature: NodeId) -> Result<Option<NodeId>, Error> {
    let uri = doc
        .find_child(signature, node::KEY_INFO)
        .and_then(|ki| doc.find_child(ki, node::SECURITY_TOKEN_REFERENCE))
        .and_then(|str_ref| doc.find_child(str_ref, node::REFERENCE))
        .and_then(|r| doc.element(r))
        .and_then(|e| e.get_attribute(attr::URI))
        .and_then(|uri| uri.strip_prefix('#'));
    let Some(id) = uri else { return Ok(None) };
    Ok(doc
        .find_by_id(id)?
        .filter(|&n| local_name(doc, n) == Some(node::BINARY_SECURITY_TOKEN)))
}

fn canonicalize_in_place(doc: &Document, node: NodeId) -> Result<Vec<u8>, Error> {
    canonicalize_with(doc, node, &NamespaceContext::inherited(doc, node))
}

fn local_name(doc: &Document, id: NodeId) -> Option<&str> {
    doc.element(id).map(|e| e.name.local_name.as_ref())
}

fn required_child(doc: &Document, parent: NodeId, local: &str) -> Result<NodeId, Error> {
    doc.find_child(parent, local)
        .ok_or_else(|| Error::XmlStructure(format!("missing <{local}>")))
}

fn algorithm_of(doc: &Document, id: NodeId) -> Result<&str, Error> {
    let elem = doc
        .element(id)
        .ok_or_else(|| Error::XmlStructure("expected an element".into()))?;
    elem.get_attribute(attr::ALGORITHM).ok_or_else(|| {
        Error::XmlStructure(format!(
            "missing Algorithm on <{}>",
            elem.name.prefixed_name()
        ))
    })
}

fn decode_base64(text: &str) -> Result<Vec<u8>, Error> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| Error::Base64(e.to_string()))
}
