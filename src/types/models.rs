use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BaseEntry, ColorantEntry};

/// A paint-color recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub id: i64,
    pub formula_name: String,
    pub formula_number: String,
    pub customer_name: String,
    pub summary: String,
    pub notes: String,
    pub created_date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colorant {
    pub id: i64,
    pub formula_id: i64,
    pub colorant_name: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    pub id: i64,
    pub formula_id: i64,
    pub base_name: String,
    pub product_name: String,
}

/// A formula together with its child rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaDetail {
    pub formula: Formula,
    pub colorants: Vec<Colorant>,
    pub bases: Vec<Base>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFormula {
    pub formula_name: String,
    pub formula_number: String,
    pub customer_name: String,
    pub summary: String,
    pub notes: String,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaPatch {
    pub formula_name: Option<String>,
    pub formula_number: Option<String>,
    pub customer_name: Option<String>,
    pub summary: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewColorant {
    pub formula_id: i64,
    pub colorant_name: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorantPatch {
    pub colorant_name: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBase {
    pub formula_id: i64,
    pub base_name: String,
    pub product_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasePatch {
    pub base_name: Option<String>,
    pub product_name: Option<String>,
}

/// Everything needed to insert a formula and its children in one go.
#[derive(Debug, Clone, Default)]
pub struct FormulaDraft {
    pub formula: NewFormula,
    pub colorants: Vec<ColorantEntry>,
    pub bases: Vec<BaseEntry>,
}

/// A partial update. Child lists replace the stored children when present.
#[derive(Debug, Clone, Default)]
pub struct FormulaUpdate {
    pub fields: FormulaPatch,
    pub colorants: Option<Vec<ColorantEntry>>,
    pub bases: Option<Vec<BaseEntry>>,
}

impl Colorant {
    #[must_use]
    pub fn entry(&self) -> ColorantEntry {
        ColorantEntry {
            colorant_name: self.colorant_name.clone(),
            amount: self.amount,
        }
    }
}

impl Base {
    #[must_use]
    pub fn entry(&self) -> BaseEntry {
        BaseEntry {
            base_name: self.base_name.clone(),
            product_name: self.product_name.clone(),
        }
    }
}
