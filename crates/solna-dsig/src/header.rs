#![forbid(unsafe_code)]

//! `wsse:Security` header assembly.
//!
//! Every element of the header declares the prefixes it needs on itself or
//! an ancestor inside the header, so `ds:SignedInfo` canonicalizes on its
//! own.

use crate::TOKEN_ID;
use solna_core::ns::{attr, node, prefix};
use solna_core::{algorithm, ns, Error};
use solna_xml::{qname, Document, NodeId, QName};

/// Elements filled in after the layout is frozen.
#[derive(Debug, Clone, Copy)]
pub struct SignatureSlots {
    pub signed_info: NodeId,
    pub digest_value: NodeId,
    pub signature_value: NodeId,
}

fn ds(local: &'static str) -> QName<'static> {
    qname(prefix::DSIG, ns::DSIG, local)
}

fn wsse(local: &'static str) -> QName<'static> {
    qname(prefix::WSSE, ns::WSSE, local)
}

/// Insert a `wsse:Security` header as the first child of `header`.
///
/// `token` is the base64 DER leaf certificate; `reference_uri` is the
/// `#id` of the signed subtree.
pub fn insert_security_header(
    doc: &mut Document,
    header: NodeId,
    token: &str,
    reference_uri: &str,
) -> Result<SignatureSlots, Error> {
    let security = doc.prepend_element(header, wsse(node::SECURITY));
    doc.declare_namespace(security, prefix::WSSE, ns::WSSE)?;

    let bst = doc.append_element(security, wsse(node::BINARY_SECURITY_TOKEN));
    doc.declare_namespace(bst, prefix::WSU, ns::WSU)?;
    doc.set_attribute(bst, QName::local(attr::VALUE_TYPE), algorithm::X509_V3_TOKEN)?;
    doc.set_attribute(bst, QName::local(attr::ENCODING_TYPE), algorithm::BASE64_BINARY)?;
    doc.set_attribute(bst, qname(prefix::WSU, ns::WSU, attr::ID), TOKEN_ID)?;
    doc.append_text(bst, token);

    let signature = doc.append_element(security, ds(node::SIGNATURE));
    doc.declare_namespace(signature, prefix::DSIG, ns::DSIG)?;

    let signed_info = doc.append_element(signature, ds(node::SIGNED_INFO));
    doc.declare_namespace(signed_info, prefix::DSIG, ns::DSIG)?;

    let c14n = doc.append_element(signed_info, ds(node::CANONICALIZATION_METHOD));
    doc.set_attribute(c14n, QName::local(attr::ALGORITHM), algorithm::EXC_C14N)?;
    let method = doc.append_element(signed_info, ds(node::SIGNATURE_METHOD));
    doc.set_attribute(method, QName::local(attr::ALGORITHM), algorithm::RSA_SHA256)?;

    let reference = doc.append_element(signed_info, ds(node::REFERENCE));
    doc.set_attribute(reference, QName::local(attr::URI), reference_uri)?;
    let transforms = doc.append_element(reference, ds(node::TRANSFORMS));
    let transform = doc.append_element(transforms, ds(node::TRANSFORM));
    doc.set_attribute(transform, QName::local(attr::ALGORITHM), algorithm::EXC_C14N)?;
    let digest_method = doc.append_element(reference, ds(node::DIGEST_METHOD));
    doc.set_attribute(digest_method, QName::local(attr::ALGORITHM), algorithm::SHA256)?;
    let digest_value = doc.append_element(reference, ds(node::DIGEST_VALUE));

    let signature_value = doc.append_element(signature, ds(node::SIGNATURE_VALUE));

    let key_info = doc.append_element(signature, ds(node::KEY_INFO));
    let token_ref = doc.append_element(key_info, wsse(node::SECURITY_TOKEN_REFERENCE));
    let token_uri = doc.append_element(token_ref, wsse(node::REFERENCE));
    doc.set_attribute(token_uri, QName::local(attr::URI), &format!("#{TOKEN_ID}"))?;

    Ok(SignatureSlots {
        signed_info,
        digest_value,
        signature_value,
    })
}
