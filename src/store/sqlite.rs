use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, Transaction};

use super::Store;
use super::schema::SCHEMA;
use super::table::{self, BaseKey, ColorantKey, FormulaKey};
use crate::error::Result;
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` inside a transaction that commits only if `f` succeeds.
    ///
    /// An error from `f` drops the transaction, which rolls it back.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Whether `initialize` has been run against this database.
    pub fn has_schema(&self) -> Result<bool> {
        let count: i32 = self.conn().query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'formulas'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

fn load_detail(conn: &Connection, formula: Formula) -> Result<FormulaDetail> {
    let colorants = table::read_matching::<Colorant>(conn, &ColorantKey::FormulaId(formula.id))?;
    let bases = table::read_matching::<Base>(conn, &BaseKey::FormulaId(formula.id))?;

    Ok(FormulaDetail {
        formula,
        colorants,
        bases,
    })
}

fn insert_colorants(tx: &Transaction<'_>, formula_id: i64, entries: &[ColorantEntry]) -> Result<()> {
    for entry in entries {
        table::create::<Colorant>(
            tx,
            &NewColorant {
                formula_id,
                colorant_name: entry.colorant_name.clone(),
                amount: entry.amount,
            },
        )?;
    }
    Ok(())
}

fn insert_bases(tx: &Transaction<'_>, formula_id: i64, entries: &[BaseEntry]) -> Result<()> {
    for entry in entries {
        table::create::<Base>(
            tx,
            &NewBase {
                formula_id,
                base_name: entry.base_name.clone(),
                product_name: entry.product_name.clone(),
            },
        )?;
    }
    Ok(())
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn list_formulas(&self) -> Result<Vec<Formula>> {
        table::read_all(&self.conn())
    }

    fn get_formula(&self, id: i64) -> Result<Option<Formula>> {
        table::read_one(&self.conn(), &FormulaKey::Id(id))
    }

    fn get_formula_detail(&self, id: i64) -> Result<Option<FormulaDetail>> {
        let conn = self.conn();
        match table::read_one::<Formula>(&conn, &FormulaKey::Id(id))? {
            Some(formula) => load_detail(&conn, formula).map(Some),
            None => Ok(None),
        }
    }

    fn create_formula(&self, draft: &FormulaDraft) -> Result<FormulaDetail> {
        self.transaction(|tx| {
            let formula: Formula = table::create(tx, &draft.formula)?;
            insert_colorants(tx, formula.id, &draft.colorants)?;
            insert_bases(tx, formula.id, &draft.bases)?;
            load_detail(tx, formula)
        })
    }

    fn update_formula(&self, id: i64, update: &FormulaUpdate) -> Result<FormulaDetail> {
        self.transaction(|tx| {
            let formula: Formula = table::update(tx, &FormulaKey::Id(id), &update.fields)?;

            if let Some(colorants) = &update.colorants {
                table::delete::<Colorant>(tx, &ColorantKey::FormulaId(id))?;
                insert_colorants(tx, id, colorants)?;
            }

            if let Some(bases) = &update.bases {
                table::delete::<Base>(tx, &BaseKey::FormulaId(id))?;
                insert_bases(tx, id, bases)?;
            }

            load_detail(tx, formula)
        })
    }

    fn delete_formula(&self, id: i64) -> Result<bool> {
        self.transaction(|tx| {
            table::delete::<Colorant>(tx, &ColorantKey::FormulaId(id))?;
            table::delete::<Base>(tx, &BaseKey::FormulaId(id))?;
            let removed = table::delete::<Formula>(tx, &FormulaKey::Id(id))?;
            Ok(removed > 0)
        })
    }

    fn close(&self) -> Result<()> {
        self.conn()
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn draft() -> FormulaDraft {
        FormulaDraft {
            formula: NewFormula {
                formula_name: "Flaky Magenta".to_string(),
                formula_number: "FM-4563".to_string(),
                customer_name: "Edwards Inc.".to_string(),
                summary: String::new(),
                notes: String::new(),
            },
            colorants: vec![
                ColorantEntry {
                    colorant_name: "sunset orange".to_string(),
                    amount: 3,
                },
                ColorantEntry {
                    colorant_name: "lamp black".to_string(),
                    amount: 1,
                },
            ],
            bases: vec![BaseEntry {
                base_name: "simple white".to_string(),
                product_name: "benjamin moore & co".to_string(),
            }],
        }
    }

    fn count(store: &SqliteStore, table: &str) -> i64 {
        store
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        assert!(!store.has_schema().unwrap());

        store.initialize().unwrap();
        assert!(store.has_schema().unwrap());

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"formulas".to_string()));
        assert!(tables.contains(&"colorants".to_string()));
        assert!(tables.contains(&"bases".to_string()));
    }

    #[test]
    fn test_create_formula_with_children() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let created = store.create_formula(&draft()).unwrap();
        let fetched = store
            .get_formula_detail(created.formula.id)
            .unwrap()
            .unwrap();

        assert_eq!(fetched.formula, created.formula);
        let entries: Vec<ColorantEntry> = fetched.colorants.iter().map(Colorant::entry).collect();
        assert_eq!(entries, draft().colorants);
        assert_eq!(fetched.bases.len(), 1);
        assert_eq!(fetched.bases[0].formula_id, created.formula.id);
    }

    #[test]
    fn test_create_formula_rolls_back_on_bad_child() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let mut bad = draft();
        bad.bases.push(BaseEntry {
            base_name: " ".to_string(),
            product_name: "nameless".to_string(),
        });

        let err = store.create_formula(&bad).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(count(&store, "formulas"), 0);
        assert_eq!(count(&store, "colorants"), 0);
        assert_eq!(count(&store, "bases"), 0);
    }

    #[test]
    fn test_update_formula_replaces_children() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let created = store.create_formula(&draft()).unwrap();

        let update = FormulaUpdate {
            colorants: Some(vec![ColorantEntry {
                colorant_name: "raw umber".to_string(),
                amount: 7,
            }]),
            ..Default::default()
        };
        let updated = store.update_formula(created.formula.id, &update).unwrap();

        assert_eq!(updated.colorants.len(), 1);
        assert_eq!(updated.colorants[0].colorant_name, "raw umber");
        assert_eq!(updated.bases.len(), 1);
        assert_eq!(updated.formula.formula_name, created.formula.formula_name);
        assert!(updated.formula.last_modified >= created.formula.last_modified);
        assert_eq!(count(&store, "colorants"), 1);
    }

    #[test]
    fn test_update_missing_formula_leaves_store_unchanged() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        store.create_formula(&draft()).unwrap();

        let update = FormulaUpdate {
            colorants: Some(Vec::new()),
            ..Default::default()
        };
        let err = store.update_formula(999, &update).unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(count(&store, "colorants"), 2);
    }

    #[test]
    fn test_delete_formula_removes_children() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let keep = store.create_formula(&draft()).unwrap();
        let doomed = store.create_formula(&draft()).unwrap();

        assert!(store.delete_formula(doomed.formula.id).unwrap());
        assert!(!store.delete_formula(doomed.formula.id).unwrap());

        assert!(store.get_formula(doomed.formula.id).unwrap().is_none());
        assert_eq!(count(&store, "colorants"), 2);
        assert_eq!(count(&store, "bases"), 1);
        assert!(store.get_formula(keep.formula.id).unwrap().is_some());
    }

    #[test]
    fn test_missing_detail_is_none() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        assert!(store.get_formula_detail(42).unwrap().is_none());
        assert!(store.list_formulas().unwrap().is_empty());
    }
}
