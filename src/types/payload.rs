//! Embedded serialized payloads.
//!
//! Submissions carry colorants and bases as JSON-encoded text fields. These
//! helpers convert between that text and the typed entries stored as child rows.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorantEntry {
    pub colorant_name: String,
    #[serde(default)]
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseEntry {
    pub base_name: String,
    #[serde(default)]
    pub product_name: String,
}

pub fn encode_colorants(colorants: &[ColorantEntry]) -> Result<String> {
    Ok(serde_json::to_string(colorants)?)
}

pub fn decode_colorants(text: &str) -> Result<Vec<ColorantEntry>> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_bases(bases: &[BaseEntry]) -> Result<String> {
    Ok(serde_json::to_string(bases)?)
}

/// Accepts either a list of bases or a single base record.
pub fn decode_bases(text: &str) -> Result<Vec<BaseEntry>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Bases {
        Many(Vec<BaseEntry>),
        One(BaseEntry),
    }

    Ok(match serde_json::from_str(text)? {
        Bases::Many(bases) => bases,
        Bases::One(base) => vec![base],
    })
}
