#![forbid(unsafe_code)]

//! Card brand detection from the leading digits (BIN/IIN).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
}

impl CardBrand {
    /// The `cardType` code the service expects.
    pub fn code(self) -> &'static str {
        match self {
            Self::Visa => "001",
            Self::Mastercard => "002",
            Self::Amex => "003",
            Self::Discover => "004",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::Amex => "amex",
            Self::Discover => "discover",
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a card number by its prefix. `None` when no rule matches.
pub fn classify(number: &str) -> Option<CardBrand> {
    let prefix = |len: usize| -> Option<u32> {
        let digits = number.get(..len)?;
        if digits.bytes().all(|b| b.is_ascii_digit()) {
            digits.parse().ok()
        } else {
            None
        }
    };
    let p1 = prefix(1);
    let p2 = prefix(2);
    let p3 = prefix(3);
    let p4 = prefix(4);
    let p6 = prefix(6);

    if p1 == Some(4) {
        return Some(CardBrand::Visa);
    }
    if matches!(p2, Some(34 | 37)) {
        return Some(CardBrand::Amex);
    }
    if matches!(p2, Some(51..=55)) || matches!(p4, Some(2221..=2720)) {
        return Some(CardBrand::Mastercard);
    }
    if p2 == Some(65)
        || matches!(p3, Some(644..=649))
        || p4 == Some(6011)
        || matches!(p6, Some(622126..=622925))
    {
        return Some(CardBrand::Discover);
    }
    None
}

/// The first six characters of the number, when it has that many.
pub fn bin(number: &str) -> Option<&str> {
    number.get(..6).filter(|b| b.len() == 6)
}
