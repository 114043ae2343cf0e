#![forbid(unsafe_code)]

//! Unsigned `runTransaction` envelope construction.
//!
//! Child order inside `ns1:requestMessage` follows the service schema's
//! sequence, so it is fixed here and does not depend on how the request
//! was populated.

use crate::card;
use crate::model::{BillTo, Card, Item, PurchaseTotals, RiskAnalysisRequest};
use solna_core::ns::{node, prefix};
use solna_core::{ns, Error};
use solna_xml::{qname, Document, NodeId, QName};
use std::collections::BTreeMap;
use std::num::NonZeroU32;

/// `clientLibrary` value sent with every request.
pub const CLIENT_LIBRARY: &str = "Rust";

/// `clientLibraryVersion` value sent with every request.
pub const CLIENT_LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the unsigned SOAP envelope for a risk analysis request.
pub fn build(request: &RiskAnalysisRequest, merchant_id: &str) -> Result<Document, Error> {
    let mut doc = Document::new(soap(node::ENVELOPE));
    let envelope = doc.root_element();
    doc.declare_namespace(envelope, prefix::SOAP_ENV, ns::SOAP_ENV)?;
    doc.declare_namespace(envelope, prefix::CYBS, ns::CYBS)?;
    doc.append_element(envelope, soap(node::HEADER));
    let body = doc.append_element(envelope, soap(node::BODY));

    let message = doc.append_element(body, Message::name(node::REQUEST_MESSAGE));
    let mut msg = Message {
        doc: &mut doc,
        parent: message,
    };

    msg.text("merchantID", merchant_id);
    msg.text("merchantReferenceCode", &request.merchant_reference_code);
    msg.text("clientLibrary", CLIENT_LIBRARY);
    msg.text("clientLibraryVersion", CLIENT_LIBRARY_VERSION);
    msg.text("clientEnvironment", std::env::consts::OS);

    if let Some(bill_to) = &request.bill_to {
        bill_to_block(&mut msg, bill_to);
    }
    for (index, item) in request.items.iter().enumerate() {
        item_block(&mut msg, index, item)?;
    }
    if let Some(totals) = &request.purchase_totals {
        totals_block(&mut msg, totals);
    }
    if let Some(card) = &request.card {
        card_block(&mut msg, card);
    }
    if !request.merchant_defined_data.is_empty() {
        merchant_defined_block(&mut msg, &request.merchant_defined_data);
    }

    let afs = msg.element("afsService");
    msg.doc.set_attribute(afs, QName::local("run"), "true")?;

    msg.optional("deviceFingerprintID", request.device_fingerprint_id.as_deref());

    tracing::debug!(
        merchant_reference_code = %request.merchant_reference_code,
        items = request.items.len(),
        "request built"
    );
    Ok(doc)
}

fn soap(local: &'static str) -> QName<'static> {
    qname(prefix::SOAP_ENV, ns::SOAP_ENV, local)
}

/// Appends `ns1:` children to one parent element.
struct Message<'a> {
    doc: &'a mut Document,
    parent: NodeId,
}

impl Message<'_> {
    fn name(local: &str) -> QName<'static> {
        qname(prefix::CYBS, ns::CYBS, local.to_owned())
    }

    fn element(&mut self, local: &str) -> NodeId {
        self.doc.append_element(self.parent, Self::name(local))
    }

    fn text(&mut self, local: &str, value: &str) {
        self.doc
            .append_text_element(self.parent, Self::name(local), value);
    }

    /// Skips absent and empty values.
    fn optional(&mut self, local: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.text(local, value);
        }
    }

    fn child(&mut self, local: &str) -> Message<'_> {
        let parent = self.element(local);
        Message {
            doc: &mut *self.doc,
            parent,
        }
    }
}

fn bill_to_block(msg: &mut Message<'_>, bill_to: &BillTo) {
    let mut b = msg.child("billTo");
    b.text("firstName", &bill_to.first_name);
    b.text("lastName", &bill_to.last_name);
    b.optional("street1", bill_to.street1.as_deref());
    b.optional("city", bill_to.city.as_deref());
    b.optional("state", bill_to.state.as_deref());
    b.optional("postalCode", bill_to.postal_code.as_deref());
    b.optional("country", bill_to.country.as_deref());
    b.optional("phoneNumber", bill_to.phone_number.as_deref());
    b.optional("email", bill_to.email.as_deref());
    b.optional("ipAddress", bill_to.ip_address.as_deref());
    b.optional("customerID", bill_to.customer_id.as_deref());
}

fn item_block(msg: &mut Message<'_>, index: usize, item: &Item) -> Result<(), Error> {
    let mut i = msg.child("item");
    i.doc.set_attribute(i.parent, QName::local("id"), &index.to_string())?;
    i.text("unitPrice", &item.unit_price);
    i.text("quantity", &item.quantity.to_string());
    i.optional("productCode", item.product_code.as_deref());
    i.text("productName", &item.product_name);
    i.optional("productSKU", item.product_sku.as_deref());
    Ok(())
}

fn totals_block(msg: &mut Message<'_>, totals: &PurchaseTotals) {
    let mut t = msg.child("purchaseTotals");
    t.text("currency", &totals.currency);
    t.text("grandTotalAmount", &totals.grand_total_amount);
}

fn card_block(msg: &mut Message<'_>, card: &Card) {
    let explicit = card.card_type.as_deref().filter(|t| !t.is_empty());
    let card_type = explicit.or_else(|| card::classify(&card.number).map(|b| b.code()));

    let mut c = msg.child("card");
    c.text("accountNumber", &card.number);
    c.text("expirationMonth", &card.expiration_month);
    c.text("expirationYear", &card.expiration_year);
    c.optional("cardType", card_type);
    c.optional("bin", card::bin(&card.number));
}

fn merchant_defined_block(msg: &mut Message<'_>, fields: &BTreeMap<NonZeroU32, String>) {
    let mut m = msg.child("merchantDefinedData");
    for (key, value) in fields {
        m.text(&format!("field{key}"), value);
    }
}
