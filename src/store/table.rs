//! Generic data access.
//!
//! Every persisted entity implements [`Table`], and the five operations below
//! work for any of them. Writes take an explicit [`Transaction`]; the caller
//! decides when it commits. Lookup fields are typed [`Key`] variants, so a
//! column name can never be misspelled at runtime.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params_from_iter};

use crate::error::{Error, Result};
use crate::types::{
    Base, BasePatch, Colorant, ColorantPatch, Formula, FormulaPatch, NewBase, NewColorant,
    NewFormula,
};

/// A lookup field and the value it must equal.
pub trait Key {
    fn column(&self) -> &'static str;
    fn value(&self) -> Value;
}

pub trait Table: Sized {
    const TABLE: &'static str;
    /// Human-readable name used in error messages.
    const ENTITY: &'static str;
    const COLUMNS: &'static str;

    type New;
    type Patch;
    type Key: Key;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn id(&self) -> i64;

    fn validate(new: &Self::New) -> Result<()>;

    fn validate_patch(_patch: &Self::Patch) -> Result<()> {
        Ok(())
    }

    fn insert_values(new: &Self::New, now: DateTime<Utc>) -> Vec<(&'static str, Value)>;

    fn patch_values(
        patch: &Self::Patch,
        current: &Self,
        now: DateTime<Utc>,
    ) -> Vec<(&'static str, Value)>;
}

fn parse_datetime(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
}

/// Reads a timestamp column. Unparseable text is a conversion failure.
fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_datetime(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn fetch_by_id<T: Table>(conn: &Connection, id: i64) -> Result<Option<T>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", T::COLUMNS, T::TABLE);
    conn.query_row(&sql, [id], |row| T::from_row(row))
        .optional()
        .map_err(Error::from)
}

/// Inserts a new row and returns it as stored.
pub fn create<T: Table>(tx: &Transaction<'_>, new: &T::New) -> Result<T> {
    T::validate(new)?;

    let values = T::insert_values(new, Utc::now());
    let columns: Vec<&str> = values.iter().map(|(column, _)| *column).collect();
    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        columns.join(", "),
        placeholders.join(", ")
    );

    let result = tx.execute(&sql, params_from_iter(values.into_iter().map(|(_, v)| v)));

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, message))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(Error::Validation(format!(
                "{} rejected: {}",
                T::ENTITY,
                message.unwrap_or_else(|| "constraint violation".to_string())
            )));
        }
        Err(e) => return Err(Error::from(e)),
    }

    fetch_by_id::<T>(tx, tx.last_insert_rowid())?.ok_or(Error::NotFound(T::ENTITY))
}

pub fn read_all<T: Table>(conn: &Connection) -> Result<Vec<T>> {
    let sql = format!("SELECT {} FROM {} ORDER BY id", T::COLUMNS, T::TABLE);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| T::from_row(row))?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Every row matching `key`, in insertion order.
pub fn read_matching<T: Table>(conn: &Connection, key: &T::Key) -> Result<Vec<T>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1 ORDER BY id",
        T::COLUMNS,
        T::TABLE,
        key.column()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([key.value()], |row| T::from_row(row))?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// The first row matching `key`. Ties go to the lowest id.
pub fn read_one<T: Table>(conn: &Connection, key: &T::Key) -> Result<Option<T>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1 ORDER BY id LIMIT 1",
        T::COLUMNS,
        T::TABLE,
        key.column()
    );
    conn.query_row(&sql, [key.value()], |row| T::from_row(row))
        .optional()
        .map_err(Error::from)
}

/// Overwrites the patched fields of the row `read_one` would return.
///
/// Nothing is written when no row matches.
pub fn update<T: Table>(tx: &Transaction<'_>, key: &T::Key, patch: &T::Patch) -> Result<T> {
    T::validate_patch(patch)?;

    let current = read_one::<T>(tx, key)?.ok_or(Error::NotFound(T::ENTITY))?;
    let values = T::patch_values(patch, &current, Utc::now());
    if values.is_empty() {
        return Ok(current);
    }

    let assignments: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        T::TABLE,
        assignments.join(", "),
        values.len() + 1
    );

    let mut params: Vec<Value> = values.into_iter().map(|(_, v)| v).collect();
    params.push(Value::Integer(current.id()));
    tx.execute(&sql, params_from_iter(params))?;

    fetch_by_id::<T>(tx, current.id())?.ok_or(Error::NotFound(T::ENTITY))
}

/// Removes every row matching `key` and returns how many went.
pub fn delete<T: Table>(tx: &Transaction<'_>, key: &T::Key) -> Result<usize> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", T::TABLE, key.column());
    Ok(tx.execute(&sql, [key.value()])?)
}

fn require(entity: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{entity} {field} is required")));
    }
    Ok(())
}

fn require_if_set(entity: &str, field: &str, value: Option<&String>) -> Result<()> {
    match value {
        Some(value) => require(entity, field, value),
        None => Ok(()),
    }
}

fn push_text(values: &mut Vec<(&'static str, Value)>, column: &'static str, field: &Option<String>) {
    if let Some(text) = field {
        values.push((column, Value::Text(text.clone())));
    }
}

// Formula

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaKey {
    Id(i64),
    Name(String),
    Number(String),
    Customer(String),
}

impl Key for FormulaKey {
    fn column(&self) -> &'static str {
        match self {
            FormulaKey::Id(_) => "id",
            FormulaKey::Name(_) => "formula_name",
            FormulaKey::Number(_) => "formula_number",
            FormulaKey::Customer(_) => "customer_name",
        }
    }

    fn value(&self) -> Value {
        match self {
            FormulaKey::Id(id) => Value::Integer(*id),
            FormulaKey::Name(s) | FormulaKey::Number(s) | FormulaKey::Customer(s) => {
                Value::Text(s.clone())
            }
        }
    }
}

impl Table for Formula {
    const TABLE: &'static str = "formulas";
    const ENTITY: &'static str = "Formula";
    const COLUMNS: &'static str = "id, formula_name, formula_number, customer_name, summary, notes, created_date, last_modified";

    type New = NewFormula;
    type Patch = FormulaPatch;
    type Key = FormulaKey;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Formula {
            id: row.get(0)?,
            formula_name: row.get(1)?,
            formula_number: row.get(2)?,
            customer_name: row.get(3)?,
            summary: row.get(4)?,
            notes: row.get(5)?,
            created_date: datetime_column(row, 6)?,
            last_modified: datetime_column(row, 7)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(new: &NewFormula) -> Result<()> {
        require(Self::ENTITY, "formula_name", &new.formula_name)
    }

    fn validate_patch(patch: &FormulaPatch) -> Result<()> {
        require_if_set(Self::ENTITY, "formula_name", patch.formula_name.as_ref())
    }

    fn insert_values(new: &NewFormula, now: DateTime<Utc>) -> Vec<(&'static str, Value)> {
        vec![
            ("formula_name", Value::Text(new.formula_name.clone())),
            ("formula_number", Value::Text(new.formula_number.clone())),
            ("customer_name", Value::Text(new.customer_name.clone())),
            ("summary", Value::Text(new.summary.clone())),
            ("notes", Value::Text(new.notes.clone())),
            ("created_date", Value::Text(format_datetime(&now))),
            ("last_modified", Value::Text(format_datetime(&now))),
        ]
    }

    fn patch_values(
        patch: &FormulaPatch,
        current: &Formula,
        now: DateTime<Utc>,
    ) -> Vec<(&'static str, Value)> {
        let mut values = Vec::new();
        push_text(&mut values, "formula_name", &patch.formula_name);
        push_text(&mut values, "formula_number", &patch.formula_number);
        push_text(&mut values, "customer_name", &patch.customer_name);
        push_text(&mut values, "summary", &patch.summary);
        push_text(&mut values, "notes", &patch.notes);

        // last_modified never moves backwards, even if the clock does
        let modified = now.max(current.last_modified);
        values.push(("last_modified", Value::Text(format_datetime(&modified))));
        values
    }
}

// Colorant

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorantKey {
    Id(i64),
    FormulaId(i64),
    Name(String),
}

impl Key for ColorantKey {
    fn column(&self) -> &'static str {
        match self {
            ColorantKey::Id(_) => "id",
            ColorantKey::FormulaId(_) => "formula_id",
            ColorantKey::Name(_) => "colorant_name",
        }
    }

    fn value(&self) -> Value {
        match self {
            ColorantKey::Id(id) | ColorantKey::FormulaId(id) => Value::Integer(*id),
            ColorantKey::Name(name) => Value::Text(name.clone()),
        }
    }
}

impl Table for Colorant {
    const TABLE: &'static str = "colorants";
    const ENTITY: &'static str = "Colorant";
    const COLUMNS: &'static str = "id, formula_id, colorant_name, amount";

    type New = NewColorant;
    type Patch = ColorantPatch;
    type Key = ColorantKey;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Colorant {
            id: row.get(0)?,
            formula_id: row.get(1)?,
            colorant_name: row.get(2)?,
            amount: row.get(3)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(new: &NewColorant) -> Result<()> {
        require(Self::ENTITY, "colorant_name", &new.colorant_name)
    }

    fn validate_patch(patch: &ColorantPatch) -> Result<()> {
        require_if_set(Self::ENTITY, "colorant_name", patch.colorant_name.as_ref())
    }

    fn insert_values(new: &NewColorant, _now: DateTime<Utc>) -> Vec<(&'static str, Value)> {
        vec![
            ("formula_id", Value::Integer(new.formula_id)),
            ("colorant_name", Value::Text(new.colorant_name.clone())),
            ("amount", Value::Integer(new.amount)),
        ]
    }

    fn patch_values(
        patch: &ColorantPatch,
        _current: &Colorant,
        _now: DateTime<Utc>,
    ) -> Vec<(&'static str, Value)> {
        let mut values = Vec::new();
        push_text(&mut values, "colorant_name", &patch.colorant_name);
        if let Some(amount) = patch.amount {
            values.push(("amount", Value::Integer(amount)));
        }
        values
    }
}

// Base

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseKey {
    Id(i64),
    FormulaId(i64),
    Name(String),
}

impl Key for BaseKey {
    fn column(&self) -> &'static str {
        match self {
            BaseKey::Id(_) => "id",
            BaseKey::FormulaId(_) => "formula_id",
            BaseKey::Name(_) => "base_name",
        }
    }

    fn value(&self) -> Value {
        match self {
            BaseKey::Id(id) | BaseKey::FormulaId(id) => Value::Integer(*id),
            BaseKey::Name(name) => Value::Text(name.clone()),
        }
    }
}

impl Table for Base {
    const TABLE: &'static str = "bases";
    const ENTITY: &'static str = "Base";
    const COLUMNS: &'static str = "id, formula_id, base_name, product_name";

    type New = NewBase;
    type Patch = BasePatch;
    type Key = BaseKey;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Base {
            id: row.get(0)?,
            formula_id: row.get(1)?,
            base_name: row.get(2)?,
            product_name: row.get(3)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(new: &NewBase) -> Result<()> {
        require(Self::ENTITY, "base_name", &new.base_name)
    }

    fn validate_patch(patch: &BasePatch) -> Result<()> {
        require_if_set(Self::ENTITY, "base_name", patch.base_name.as_ref())
    }

    fn insert_values(new: &NewBase, _now: DateTime<Utc>) -> Vec<(&'static str, Value)> {
        vec![
            ("formula_id", Value::Integer(new.formula_id)),
            ("base_name", Value::Text(new.base_name.clone())),
            ("product_name", Value::Text(new.product_name.clone())),
        ]
    }

    fn patch_values(
        patch: &BasePatch,
        _current: &Base,
        _now: DateTime<Utc>,
    ) -> Vec<(&'static str, Value)> {
        let mut values = Vec::new();
        push_text(&mut values, "base_name", &patch.base_name);
        push_text(&mut values, "product_name", &patch.product_name);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::SCHEMA;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn
    }

    fn new_formula(name: &str, customer: &str) -> NewFormula {
        NewFormula {
            formula_name: name.to_string(),
            formula_number: "FM-4563".to_string(),
            customer_name: customer.to_string(),
            summary: "matte finish".to_string(),
            notes: "mix twice".to_string(),
        }
    }

    fn new_colorant(formula_id: i64, name: &str, amount: i64) -> NewColorant {
        NewColorant {
            formula_id,
            colorant_name: name.to_string(),
            amount,
        }
    }

    #[test]
    fn test_create_then_read_one() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let created: Formula = create(&tx, &new_formula("Flaky Magenta", "Edwards Inc.")).unwrap();
        tx.commit().unwrap();

        let fetched: Formula = read_one(&conn, &FormulaKey::Id(created.id))
            .unwrap()
            .unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.formula_name, "Flaky Magenta");
        assert_eq!(fetched.formula_number, "FM-4563");
        assert_eq!(fetched.customer_name, "Edwards Inc.");
        assert_eq!(fetched.summary, "matte finish");
        assert_eq!(fetched.notes, "mix twice");
        assert_eq!(fetched.created_date, fetched.last_modified);
    }

    #[test]
    fn test_corrupt_timestamp_is_storage_error() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let created: Formula = create(&tx, &new_formula("Flaky Magenta", "Acme")).unwrap();
        tx.commit().unwrap();

        conn.execute(
            "UPDATE formulas SET created_date = 'not a date' WHERE id = ?1",
            [created.id],
        )
        .unwrap();

        let err = read_one::<Formula>(&conn, &FormulaKey::Id(created.id)).unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(rusqlite::Error::FromSqlConversionFailure(6, _, _))
        ));
    }

    #[test]
    fn test_sqlite_datetime_format_is_accepted() {
        let parsed = parse_datetime("2024-03-01 12:30:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T12:30:00+00:00");
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_create_requires_name() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let err = create::<Formula>(&tx, &new_formula("  ", "Acme")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_create_child_for_missing_formula_is_rejected() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let err = create::<Colorant>(&tx, &new_colorant(999, "umber", 1)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_read_all_lists_each_row_once() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let first: Formula = create(&tx, &new_formula("Soft Red", "Acme")).unwrap();
        let second: Formula = create(&tx, &new_formula("Deep Blue", "Acme")).unwrap();
        tx.commit().unwrap();

        let all: Vec<Formula> = read_all(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|f| f.id == first.id).count(), 1);
        assert_eq!(all.iter().filter(|f| f.id == second.id).count(), 1);
    }

    #[test]
    fn test_read_one_prefers_lowest_id() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let first: Formula = create(&tx, &new_formula("Soft Red", "Acme")).unwrap();
        create::<Formula>(&tx, &new_formula("Deep Blue", "Acme")).unwrap();
        tx.commit().unwrap();

        let found: Formula = read_one(&conn, &FormulaKey::Customer("Acme".to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);

        let missing = read_one::<Formula>(&conn, &FormulaKey::Id(404)).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_update_changes_only_patched_fields() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let before: Formula = create(&tx, &new_formula("Soft Red", "Acme")).unwrap();

        let patch = FormulaPatch {
            summary: Some("new".to_string()),
            ..Default::default()
        };
        let after: Formula = update(&tx, &FormulaKey::Id(before.id), &patch).unwrap();
        tx.commit().unwrap();

        assert_eq!(after.summary, "new");
        assert_eq!(after.formula_name, before.formula_name);
        assert_eq!(after.formula_number, before.formula_number);
        assert_eq!(after.customer_name, before.customer_name);
        assert_eq!(after.notes, before.notes);
        assert_eq!(after.created_date, before.created_date);
        assert!(after.last_modified >= before.last_modified);
    }

    #[test]
    fn test_update_missing_row_is_not_found() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let patch = FormulaPatch {
            notes: Some("lost".to_string()),
            ..Default::default()
        };
        let err = update::<Formula>(&tx, &FormulaKey::Id(7), &patch).unwrap_err();
        assert!(matches!(err, Error::NotFound("Formula")));
    }

    #[test]
    fn test_update_rejects_blank_name() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let formula: Formula = create(&tx, &new_formula("Soft Red", "Acme")).unwrap();
        let patch = FormulaPatch {
            formula_name: Some(String::new()),
            ..Default::default()
        };
        let err = update::<Formula>(&tx, &FormulaKey::Id(formula.id), &patch).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_update_colorant_amount() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let formula: Formula = create(&tx, &new_formula("Soft Red", "Acme")).unwrap();
        let colorant: Colorant = create(&tx, &new_colorant(formula.id, "umber", 1)).unwrap();

        let patch = ColorantPatch {
            amount: Some(5),
            ..Default::default()
        };
        let updated: Colorant = update(&tx, &ColorantKey::Id(colorant.id), &patch).unwrap();
        assert_eq!(updated.amount, 5);
        assert_eq!(updated.colorant_name, "umber");
    }

    #[test]
    fn test_delete_by_formula_id_is_selective() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let red: Formula = create(&tx, &new_formula("Soft Red", "Acme")).unwrap();
        let blue: Formula = create(&tx, &new_formula("Deep Blue", "Acme")).unwrap();
        create::<Colorant>(&tx, &new_colorant(red.id, "umber", 1)).unwrap();
        create::<Colorant>(&tx, &new_colorant(red.id, "ochre", 2)).unwrap();
        create::<Colorant>(&tx, &new_colorant(blue.id, "phthalo", 3)).unwrap();

        let removed = delete::<Colorant>(&tx, &ColorantKey::FormulaId(red.id)).unwrap();
        tx.commit().unwrap();

        assert_eq!(removed, 2);
        let remaining: Vec<Colorant> = read_all(&conn).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].formula_id, blue.id);
    }

    #[test]
    fn test_read_matching_keeps_insertion_order() {
        let mut conn = open();
        let tx = conn.transaction().unwrap();
        let formula: Formula = create(&tx, &new_formula("Soft Red", "Acme")).unwrap();
        for name in ["simple white", "ultra deep", "pastel"] {
            create::<Base>(
                &tx,
                &NewBase {
                    formula_id: formula.id,
                    base_name: name.to_string(),
                    product_name: "benjamin moore & co".to_string(),
                },
            )
            .unwrap();
        }
        tx.commit().unwrap();

        let bases: Vec<Base> = read_matching(&conn, &BaseKey::FormulaId(formula.id)).unwrap();
        let names: Vec<&str> = bases.iter().map(|b| b.base_name.as_str()).collect();
        assert_eq!(names, ["simple white", "ultra deep", "pastel"]);
    }
}
