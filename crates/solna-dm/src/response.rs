#![forbid(unsafe_code)]

//! `runTransaction` reply parsing.
//!
//! Elements are matched by local name so the parser does not depend on
//! the prefixes the service happens to choose.

use crate::model::{
    Decision, FraudScore, Outcome, RemoteFault, RiskAnalysisResponse, RiskDecision,
};
use roxmltree::Node;
use solna_core::ns::node;
use solna_core::Error;

/// Parse a response body into a decision or a fault.
///
/// Any failure is an [`Error::Protocol`] carrying `status` and the raw bytes.
pub fn parse(body: &[u8], status: u16) -> Result<Outcome, Error> {
    parse_outcome(body).map_err(|reason| Error::Protocol {
        reason,
        status,
        body: body.to_vec(),
    })
}

/// Apply the status policy to one HTTP exchange.
///
/// A 2xx body must parse. A non-2xx body is accepted only when it is a SOAP
/// fault; anything else becomes [`Error::Transport`] with status and body.
pub fn interpret(status: u16, body: Vec<u8>) -> Result<RiskAnalysisResponse, Error> {
    let outcome = if (200..300).contains(&status) {
        parse(&body, status)?
    } else {
        match parse_outcome(&body) {
            Ok(fault @ Outcome::Fault(_)) => fault,
            _ => {
                return Err(Error::Transport {
                    message: format!("unexpected HTTP status {status}"),
                    status: Some(status),
                    body: Some(body),
                })
            }
        }
    };

    match &outcome {
        Outcome::Decision(d) => tracing::info!(
            status,
            decision = %d.decision,
            reason_code = d.reason_code,
            request_id = d.request_id.as_deref().unwrap_or(""),
            "decision received"
        ),
        Outcome::Fault(f) => tracing::warn!(status, code = %f.code, "SOAP fault received"),
    }
    Ok(RiskAnalysisResponse {
        status,
        body,
        outcome,
    })
}

fn parse_outcome(body: &[u8]) -> Result<Outcome, String> {
    let text = std::str::from_utf8(body).map_err(|e| format!("response is not UTF-8: {e}"))?;
    let doc = roxmltree::Document::parse(text).map_err(|e| format!("invalid XML: {e}"))?;

    let envelope = doc.root_element();
    if envelope.tag_name().name() != node::ENVELOPE {
        return Err(format!(
            "expected Envelope, found <{}>",
            envelope.tag_name().name()
        ));
    }
    let body = child(envelope, node::BODY).ok_or("Envelope has no Body")?;

    if let Some(fault) = child(body, node::FAULT) {
        return Ok(Outcome::Fault(RemoteFault {
            code: text_of(fault, node::FAULT_CODE).unwrap_or_default(),
            message: text_of(fault, node::FAULT_STRING).unwrap_or_default(),
        }));
    }

    let reply = child(body, node::REPLY_MESSAGE).ok_or("Body has neither replyMessage nor Fault")?;
    let decision = text_of(reply, "decision").ok_or("replyMessage has no decision")?;
    let reason_code = number_of(reply, "reasonCode")?.ok_or("replyMessage has no reasonCode")?;
    let fraud_score = child(reply, node::AFS_REPLY).map(fraud_score);

    Ok(Outcome::Decision(RiskDecision {
        merchant_reference_code: text_of(reply, "merchantReferenceCode"),
        request_id: text_of(reply, "requestID"),
        decision: Decision::from(decision.as_str()),
        reason_code,
        request_token: text_of(reply, "requestToken"),
        fraud_score,
    }))
}

/// The score block is advisory: a field that is not a number is logged
/// and dropped rather than failing the decision.
fn fraud_score(afs: Node<'_, '_>) -> FraudScore {
    FraudScore {
        reason_code: advisory_number(afs, "reasonCode"),
        score: advisory_number(afs, "afsResult"),
        host_severity: advisory_number(afs, "hostSeverity"),
        factor_codes: text_of(afs, "afsFactorCode")
            .map(|codes| {
                codes
                    .split('^')
                    .filter(|c| !c.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default(),
        address_info_code: text_of(afs, "addressInfoCode"),
        ip_country: text_of(afs, "ipCountry"),
        ip_state: text_of(afs, "ipState"),
        ip_city: text_of(afs, "ipCity"),
        score_model_used: text_of(afs, "scoreModelUsed"),
        bin_country: text_of(afs, "binCountry"),
        card_scheme: text_of(afs, "cardScheme"),
        card_issuer: text_of(afs, "cardIssuer"),
    }
}

fn child<'a, 'input>(parent: Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    parent
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == local)
}

/// Trimmed text of a child element; `None` when absent or blank.
fn text_of(parent: Node<'_, '_>, local: &str) -> Option<String> {
    let node = child(parent, local)?;
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

fn number_of(parent: Node<'_, '_>, local: &str) -> Result<Option<u32>, String> {
    text_of(parent, local)
        .map(|s| {
            s.parse()
                .map_err(|_| format!("<{local}> is not a number: \"{s}\""))
        })
        .transpose()
}

fn advisory_number(parent: Node<'_, '_>, local: &str) -> Option<u32> {
    number_of(parent, local).unwrap_or_else(|reason| {
        tracing::warn!(field = local, %reason, "ignoring fraud score field");
        None
    })
}
