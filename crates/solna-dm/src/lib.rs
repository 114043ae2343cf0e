#![forbid(unsafe_code)]

//! Decision Manager risk analysis over signed SOAP.
//!
//! A [`RiskAnalysisRequest`] is turned into a `runTransaction` envelope
//! ([`builder`]), signed with the merchant credential ([`solna_dsig`]),
//! posted over mutually authenticated TLS ([`transport`]) and the reply is
//! parsed into an [`Outcome`] ([`response`]).  [`DecisionClient`] runs the
//! whole chain.

pub mod builder;
pub mod card;
pub mod client;
pub mod config;
pub mod model;
pub mod response;
pub mod transport;

pub use card::{classify, CardBrand};
pub use client::DecisionClient;
pub use config::{Config, Environment};
pub use model::{
    BillTo, Card, Decision, FraudScore, Item, Outcome, PurchaseTotals, RemoteFault,
    RiskAnalysisRequest, RiskAnalysisResponse, RiskDecision,
};
