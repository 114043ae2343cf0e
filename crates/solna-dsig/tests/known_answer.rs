//! Known-answer test for the signer.
//!
//! The expected canonical Body, DigestValue and SignatureValue were
//! produced outside this workspace: the Body and SignedInfo subtrees were
//! canonicalized with `xmllint --exc-c14n`, digested with
//! `openssl dgst -sha256` and signed with
//! `openssl dgst -sha256 -sign test-data/keys/rsa-2048-key.pem`.
//! RSA PKCS#1 v1.5 signatures are deterministic, so the values are fixed.

use solna_c14n::canonicalize;
use solna_core::ns::{self, node, prefix};
use solna_dsig::{sign, verify, SignedEnvelope, VerifyResult};
use solna_keys::load_pem_bundle;
use solna_xml::{qname, Document};

/// Text exercising every escaping rule of canonical text nodes.
const COMMENTS: &str = "Tom & Jerry <b> \"quoted\" 'single'\r\n\ttabbed caf\u{e9} \u{2603} ]]> end";

const CANONICAL_BODY: &str = "<SOAP-ENV:Body \
xmlns:SOAP-ENV=\"http://schemas.xmlsoap.org/soap/envelope/\" \
xmlns:wsu=\"http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd\" \
wsu:Id=\"Body\">
    <ns1:requestMessage xmlns:ns1=\"urn:schemas-cybersource-com:transaction-data-1.111\">
      <ns1:merchantID>kat_merchant</ns1:merchantID>
      <ns1:merchantReferenceCode>KAT-0001</ns1:merchantReferenceCode>
      <ns1:comments>Tom &amp; Jerry &lt;b&gt; \"quoted\" 'single'&#xD;
\ttabbed caf\u{e9} \u{2603} ]]&gt; end</ns1:comments>
    </ns1:requestMessage>
  </SOAP-ENV:Body>";

const DIGEST_VALUE: &str = "5sEl8MOBHWW0UB5Io2h1oAucs/hXs8lu35Ehk8KUYXc=";

const SIGNATURE_VALUE: &str = "Pje7SXpMru8ArOGMxSqd9byuy6EFDo7nDhdx+dHjbZSRE5SZCS4+ODIoaiyyKqKgufxGHBXgdgdEVov9jIyAcKD5OBpJfHr0tzppprQHlNbw3UxZLr8ru9XXiEwbyzzZ2CNqYN1Tm06ATCWW1P6QbMVyuTiCwF1Rkj9VRknEIKzaNfUvQgXd9WorK7jpQN3CTkAR6iaKsHDry8HthpbqAnQDj6VmdjFQyBLF4Tqw6w75mSDw/Jp5ANd7TN8+9cD6WJaIyk0ejyPwvitQBzlT80aHYB0Fo6j7y/ZxE1KJaViW0Ay7xewBq72wluCphbVA9T0F/d5NjINpCljItrRpqw==";

fn request() -> Document {
    let soap = |local| qname(prefix::SOAP_ENV, ns::SOAP_ENV, local);
    let cybs = |local| qname(prefix::CYBS, ns::CYBS, local);

    let mut doc = Document::new(soap(node::ENVELOPE));
    let root = doc.root_element();
    doc.declare_namespace(root, prefix::SOAP_ENV, ns::SOAP_ENV).unwrap();
    doc.declare_namespace(root, prefix::CYBS, ns::CYBS).unwrap();
    doc.append_element(root, soap(node::HEADER));
    let body = doc.append_element(root, soap(node::BODY));
    let msg = doc.append_element(body, cybs(node::REQUEST_MESSAGE));
    doc.append_text_element(msg, cybs("merchantID"), "kat_merchant");
    doc.append_text_element(msg, cybs("merchantReferenceCode"), "KAT-0001");
    doc.append_text_element(msg, cybs("comments"), COMMENTS);
    doc
}

fn signed() -> SignedEnvelope {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../test-data/keys/rsa-2048-bundle.pem");
    let credential = load_pem_bundle(&std::fs::read(path).unwrap(), None).unwrap();
    sign(request(), &credential).unwrap()
}

fn element_text<'a>(xml: &'a str, tag: &str) -> &'a str {
    let open = format!("<{tag}>");
    let start = xml.find(&open).unwrap() + open.len();
    let end = start + xml[start..].find('<').unwrap();
    &xml[start..end]
}

fn signed_text() -> String {
    String::from_utf8(signed().into_bytes()).unwrap()
}

fn reason(result: VerifyResult) -> String {
    match result {
        VerifyResult::Invalid { reason } => reason,
        VerifyResult::Valid => panic!("tampered envelope verified"),
    }
}

#[test]
fn test_canonical_body_matches_reference() {
    let envelope = signed();
    let doc = envelope.document();
    let body = doc.find_child(doc.root_element(), node::BODY).unwrap();
    let c14n = String::from_utf8(canonicalize(doc, body).unwrap()).unwrap();
    assert_eq!(c14n, CANONICAL_BODY);
}

#[test]
fn test_digest_and_signature_values() {
    let text = signed_text();
    assert_eq!(element_text(&text, "ds:DigestValue"), DIGEST_VALUE);
    assert_eq!(element_text(&text, "ds:SignatureValue"), SIGNATURE_VALUE);
}

#[test]
fn test_signing_is_deterministic() {
    assert_eq!(signed().as_bytes(), signed().as_bytes());
}

#[test]
fn test_wire_bytes_verify() {
    let text = signed_text();
    assert!(text.contains("&#xD;"));
    assert!(text.contains("caf\u{e9} \u{2603}"));
    assert!(text.contains("]]&gt;"));
    assert_eq!(verify(text.as_bytes()).unwrap(), VerifyResult::Valid);
}

#[test]
fn test_equivalent_character_reference_still_verifies() {
    let text = signed_text().replacen("Tom &amp; Jerry", "Tom &#38; Jerry", 1);
    assert_eq!(verify(text.as_bytes()).unwrap(), VerifyResult::Valid);
}

#[test]
fn test_body_text_tampered() {
    let text = signed_text();
    let tampered = text.replacen("caf\u{e9}", "cafe", 1);
    assert_ne!(tampered, text);
    assert!(reason(verify(tampered.as_bytes()).unwrap()).contains("digest mismatch"));
}

#[test]
fn test_body_carriage_return_unescaped() {
    let text = signed_text();
    let tampered = text.replacen("&#xD;", "\r", 1);
    assert_ne!(tampered, text);
    assert!(reason(verify(tampered.as_bytes()).unwrap()).contains("digest mismatch"));
}

#[test]
fn test_signed_info_whitespace_tampered() {
    let text = signed_text();
    let tampered = text.replacen(
        "\n          <ds:CanonicalizationMethod",
        "\n           <ds:CanonicalizationMethod",
        1,
    );
    assert_ne!(tampered, text);
    assert!(reason(verify(tampered.as_bytes()).unwrap()).contains("signature value"));
}

#[test]
fn test_signed_info_reference_attribute_tampered() {
    let text = signed_text();
    let tampered = text.replacen(
        "<ds:Reference URI=\"#Body\">",
        "<ds:Reference URI=\"#Body\" Id=\"ref-1\">",
        1,
    );
    assert_ne!(tampered, text);
    assert!(reason(verify(tampered.as_bytes()).unwrap()).contains("signature value"));
}

#[test]
fn test_signed_info_digest_value_swapped() {
    let text = signed_text();
    let other = "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=";
    let tampered = text.replacen(DIGEST_VALUE, other, 1);
    assert_ne!(tampered, text);
    assert!(reason(verify(tampered.as_bytes()).unwrap()).contains("digest mismatch"));
}
