#![forbid(unsafe_code)]

//! Request and reply types for a risk analysis call.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

/// A risk analysis request as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAnalysisRequest {
    pub merchant_reference_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_to: Option<BillTo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_totals: Option<PurchaseTotals>,
    /// Custom fields, emitted as `field<N>` in ascending key order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub merchant_defined_data: BTreeMap<NonZeroU32, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_fingerprint_id: Option<String>,
}

/// Billing contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillTo {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

/// Payment card.
///
/// `Debug` shows only the last four digits of the number.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub number: String,
    pub expiration_month: String,
    pub expiration_year: String,
    /// Explicit card type code; derived from the number when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
}

impl Card {
    /// The number with everything but the last four digits masked.
    pub fn masked_number(&self) -> String {
        let digits: Vec<char> = self.number.chars().collect();
        let masked = digits.len().saturating_sub(4);
        let tail: String = digits[masked..].iter().collect();
        format!("{}{tail}", "*".repeat(masked))
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("number", &self.masked_number())
            .field("expiration_month", &self.expiration_month)
            .field("expiration_year", &self.expiration_year)
            .field("card_type", &self.card_type)
            .finish()
    }
}

/// One order line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub unit_price: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_sku: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseTotals {
    pub currency: String,
    pub grand_total_amount: String,
}

// -- Reply -------------------------------------------------------------------

/// Everything the service sent back for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAnalysisResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body, kept for diagnostics.
    pub body: Vec<u8>,
    pub outcome: Outcome,
}

/// A parsed reply: either a decision or an explicit rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Decision(RiskDecision),
    Fault(RemoteFault),
}

impl Outcome {
    pub fn decision(&self) -> Option<&RiskDecision> {
        match self {
            Self::Decision(d) => Some(d),
            Self::Fault(_) => None,
        }
    }

    pub fn fault(&self) -> Option<&RemoteFault> {
        match self {
            Self::Fault(f) => Some(f),
            Self::Decision(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskDecision {
    pub merchant_reference_code: Option<String>,
    pub request_id: Option<String>,
    pub decision: Decision,
    pub reason_code: u32,
    pub request_token: Option<String>,
    /// Scoring details; `None` when the reply carries no `afsReply`.
    pub fraud_score: Option<FraudScore>,
}

/// Decision string returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Decision {
    Accept,
    Review,
    Reject,
    Error,
    Other(String),
}

impl Decision {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Review => "REVIEW",
            Self::Reject => "REJECT",
            Self::Error => "ERROR",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for Decision {
    fn from(s: &str) -> Self {
        match s.trim() {
            "ACCEPT" => Self::Accept,
            "REVIEW" => Self::Review,
            "REJECT" => Self::Reject,
            "ERROR" => Self::Error,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Decision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Contents of `afsReply`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FraudScore {
    pub reason_code: Option<u32>,
    /// `afsResult`, the total fraud score.
    pub score: Option<u32>,
    pub host_severity: Option<u32>,
    /// `afsFactorCode`, split on `^`.
    pub factor_codes: Vec<String>,
    pub address_info_code: Option<String>,
    pub ip_country: Option<String>,
    pub ip_state: Option<String>,
    pub ip_city: Option<String>,
    pub score_model_used: Option<String>,
    pub bin_country: Option<String>,
    pub card_scheme: Option<String>,
    pub card_issuer: Option<String>,
}

/// A SOAP fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFault {
    pub code: String,
    pub message: String,
}

impl fmt::Display for RemoteFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
