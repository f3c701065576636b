// src/heuristics/mod.rs

mod fields;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Sentinel value reported for a field no pattern matched.
pub const NOT_FOUND: &str = "not found";

/// The closed set of fields the extractor looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    InvoiceNumber,
    Total,
    Vendor,
    PaymentPeriod,
    PaymentNarration,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::InvoiceNumber,
        Field::Total,
        Field::Vendor,
        Field::PaymentPeriod,
        Field::PaymentNarration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoice_number",
            Field::Total => "total",
            Field::Vendor => "vendor",
            Field::PaymentPeriod => "payment_period",
            Field::PaymentNarration => "payment_narration",
        }
    }
}

/// All fields extracted from one document.
///
/// The mapping is total: every field is always present, either as the
/// matched text or as the [`NOT_FOUND`] sentinel. Serialized JSON carries
/// exactly the five keys with string values, never null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFields {
    #[serde(default, with = "not_found")]
    pub invoice_number: Option<String>,
    #[serde(default, with = "not_found")]
    pub total: Option<String>,
    #[serde(default, with = "not_found")]
    pub vendor: Option<String>,
    #[serde(default, with = "not_found")]
    pub payment_period: Option<String>,
    #[serde(default, with = "not_found")]
    pub payment_narration: Option<String>,
}

impl InvoiceFields {
    /// The extracted value, or the sentinel when the field never matched.
    pub fn get(&self, field: Field) -> &str {
        let slot = match field {
            Field::InvoiceNumber => &self.invoice_number,
            Field::Total => &self.total,
            Field::Vendor => &self.vendor,
            Field::PaymentPeriod => &self.payment_period,
            Field::PaymentNarration => &self.payment_narration,
        };
        slot.as_deref().unwrap_or(NOT_FOUND)
    }

    /// The full name → value mapping, sentinel included.
    pub fn as_map(&self) -> BTreeMap<&'static str, &str> {
        Field::ALL.iter().map(|&f| (f.name(), self.get(f))).collect()
    }

    /// How many fields were successfully extracted (out of five).
    pub fn coverage(&self) -> (usize, usize) {
        let filled = Field::ALL
            .iter()
            .filter(|&&f| self.get(f) != NOT_FOUND)
            .count();
        (filled, Field::ALL.len())
    }
}

/// Serialize an unmatched slot as the sentinel string; on the way back in,
/// both null and the sentinel collapse to an unmatched slot.
mod not_found {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::NOT_FOUND;

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(NOT_FOUND))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| s != NOT_FOUND))
    }
}

/// Extract all five fields from raw OCR text.
///
/// Pure and total: any input, including empty text, yields a fully
/// populated result. Fields are matched independently of each other.
pub fn extract_all(text: &str) -> InvoiceFields {
    fields::extract(text)
}
