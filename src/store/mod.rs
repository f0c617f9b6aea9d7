mod schema;
mod sqlite;
pub mod table;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the formula workflows the server and CLI rely on.
///
/// Each method runs as one transaction: it either fully applies or leaves the
/// database unchanged.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    fn list_formulas(&self) -> Result<Vec<Formula>>;
    fn get_formula(&self, id: i64) -> Result<Option<Formula>>;
    fn get_formula_detail(&self, id: i64) -> Result<Option<FormulaDetail>>;

    /// Inserts the formula, then its colorants and bases under the new id.
    fn create_formula(&self, draft: &FormulaDraft) -> Result<FormulaDetail>;

    /// Fails with `NotFound` when no formula has this id.
    fn update_formula(&self, id: i64, update: &FormulaUpdate) -> Result<FormulaDetail>;

    /// Removes the formula and its children. Returns false if it did not exist.
    fn delete_formula(&self, id: i64) -> Result<bool>;

    fn close(&self) -> Result<()>;
}
