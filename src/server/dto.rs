use serde::Deserialize;

use crate::error::{Error, Result};
use crate::server::validation::{parse_formula_id, title_case, trimmed};
use crate::types::payload::{decode_bases, decode_colorants};
use crate::types::{
    BaseEntry, ColorantEntry, FormulaDraft, FormulaPatch, FormulaUpdate, NewFormula,
};

/// An id sent either as a JSON number or as form text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdField {
    Number(i64),
    Text(String),
}

impl IdField {
    fn parse(&self) -> Result<Option<i64>> {
        match self {
            IdField::Number(id) => Ok(Some(*id)),
            IdField::Text(text) => parse_formula_id(text),
        }
    }
}

/// A colorant or base list, either JSON-encoded text or an inline JSON value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PayloadField {
    Encoded(String),
    Inline(serde_json::Value),
}

impl PayloadField {
    fn text(self) -> Option<String> {
        match self {
            PayloadField::Encoded(text) if text.trim().is_empty() => None,
            PayloadField::Encoded(text) => Some(text),
            PayloadField::Inline(value) => Some(value.to_string()),
        }
    }

    fn into_colorants(self) -> Result<Option<Vec<ColorantEntry>>> {
        let Some(text) = self.text() else {
            return Ok(None);
        };
        let entries = decode_colorants(&text)?
            .into_iter()
            .map(|entry| ColorantEntry {
                colorant_name: entry.colorant_name.trim().to_string(),
                amount: entry.amount,
            })
            .collect();
        Ok(Some(entries))
    }

    fn into_bases(self) -> Result<Option<Vec<BaseEntry>>> {
        let Some(text) = self.text() else {
            return Ok(None);
        };
        let entries = decode_bases(&text)?
            .into_iter()
            .map(|entry| BaseEntry {
                base_name: entry.base_name.trim().to_string(),
                product_name: entry.product_name.trim().to_string(),
            })
            .collect();
        Ok(Some(entries))
    }
}

/// Body of `POST /formula/add`, from either a JSON or an HTML form submission.
#[derive(Debug, Default, Deserialize)]
pub struct FormulaSubmission {
    #[serde(default)]
    pub formula_id: Option<IdField>,
    #[serde(default)]
    pub formula_name: Option<String>,
    #[serde(default)]
    pub formula_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub colorants: Option<PayloadField>,
    #[serde(default)]
    pub bases: Option<PayloadField>,
}

#[derive(Debug)]
pub enum SubmitCommand {
    Create(FormulaDraft),
    Update { id: i64, update: FormulaUpdate },
}

impl FormulaSubmission {
    /// Normalizes the submission and decides between create and update.
    pub fn into_command(self) -> Result<SubmitCommand> {
        let id = match &self.formula_id {
            Some(field) => field.parse()?,
            None => None,
        };

        let formula_name = trimmed(self.formula_name).map(|s| title_case(&s));
        let customer_name = trimmed(self.customer_name).map(|s| title_case(&s));
        let formula_number = trimmed(self.formula_number);
        let summary = trimmed(self.summary);
        let notes = trimmed(self.notes);
        let colorants = match self.colorants {
            Some(field) => field.into_colorants()?,
            None => None,
        };
        let bases = match self.bases {
            Some(field) => field.into_bases()?,
            None => None,
        };

        match id {
            Some(id) => Ok(SubmitCommand::Update {
                id,
                update: FormulaUpdate {
                    fields: FormulaPatch {
                        formula_name,
                        formula_number,
                        customer_name,
                        summary,
                        notes,
                    },
                    colorants,
                    bases,
                },
            }),
            None => {
                let formula_name = formula_name
                    .ok_or_else(|| Error::Validation("formula_name is required".to_string()))?;

                Ok(SubmitCommand::Create(FormulaDraft {
                    formula: NewFormula {
                        formula_name,
                        formula_number: formula_number.unwrap_or_default(),
                        customer_name: customer_name.unwrap_or_default(),
                        summary: summary.unwrap_or_default(),
                        notes: notes.unwrap_or_default(),
                    },
                    colorants: colorants.unwrap_or_default(),
                    bases: bases.unwrap_or_default(),
                }))
            }
        }
    }
}
