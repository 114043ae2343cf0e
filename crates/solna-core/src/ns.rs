#![forbid(unsafe_code)]

//! XML namespace constants and the prefixes they are bound to on the wire.

/// SOAP 1.1 envelope namespace
pub const SOAP_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// WS-Security extension namespace
pub const WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// WS-Security utility namespace (carries `wsu:Id`)
pub const WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// CyberSource transaction data schema
pub const CYBS: &str = "urn:schemas-cybersource-com:transaction-data-1.111";

/// XML namespace, implicitly bound to `xml`
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

// ── Prefixes ─────────────────────────────────────────────────────────

pub mod prefix {
    pub const SOAP_ENV: &str = "SOAP-ENV";
    pub const WSSE: &str = "wsse";
    pub const WSU: &str = "wsu";
    pub const DSIG: &str = "ds";
    pub const CYBS: &str = "ns1";
    pub const XML: &str = "xml";
}

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // SOAP
    pub const ENVELOPE: &str = "Envelope";
    pub const HEADER: &str = "Header";
    pub const BODY: &str = "Body";
    pub const FAULT: &str = "Fault";
    pub const FAULT_CODE: &str = "faultcode";
    pub const FAULT_STRING: &str = "faultstring";

    // WS-Security
    pub const SECURITY: &str = "Security";
    pub const BINARY_SECURITY_TOKEN: &str = "BinarySecurityToken";
    pub const SECURITY_TOKEN_REFERENCE: &str = "SecurityTokenReference";
    pub const REFERENCE: &str = "Reference";

    // DSig
    pub const SIGNATURE: &str = "Signature";
    pub const SIGNED_INFO: &str = "SignedInfo";
    pub const CANONICALIZATION_METHOD: &str = "CanonicalizationMethod";
    pub const SIGNATURE_METHOD: &str = "SignatureMethod";
    pub const SIGNATURE_VALUE: &str = "SignatureValue";
    pub const TRANSFORMS: &str = "Transforms";
    pub const TRANSFORM: &str = "Transform";
    pub const DIGEST_METHOD: &str = "DigestMethod";
    pub const DIGEST_VALUE: &str = "DigestValue";
    pub const KEY_INFO: &str = "KeyInfo";

    // CyberSource request / reply
    pub const REQUEST_MESSAGE: &str = "requestMessage";
    pub const REPLY_MESSAGE: &str = "replyMessage";
    pub const AFS_REPLY: &str = "afsReply";
}

// ── Attribute names ──────────────────────────────────────────────────

pub mod attr {
    pub const ID: &str = "Id";
    pub const URI: &str = "URI";
    pub const ALGORITHM: &str = "Algorithm";
    pub const VALUE_TYPE: &str = "ValueType";
    pub const ENCODING_TYPE: &str = "EncodingType";
}
