pub const SCHEMA: &str = r#"
-- Formulas are the central record: one paint-color recipe each
CREATE TABLE IF NOT EXISTS formulas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    formula_name TEXT NOT NULL,
    formula_number TEXT NOT NULL DEFAULT '',
    customer_name TEXT NOT NULL DEFAULT '',
    summary TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    created_date TEXT NOT NULL DEFAULT (datetime('now')),
    last_modified TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Colorants mixed into a formula, in submission order
CREATE TABLE IF NOT EXISTS colorants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    formula_id INTEGER NOT NULL REFERENCES formulas(id) ON DELETE CASCADE,
    colorant_name TEXT NOT NULL,
    amount INTEGER NOT NULL DEFAULT 0
);

-- Base coats a formula is tinted from
CREATE TABLE IF NOT EXISTS bases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    formula_id INTEGER NOT NULL REFERENCES formulas(id) ON DELETE CASCADE,
    base_name TEXT NOT NULL,
    product_name TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_formulas_name ON formulas(formula_name);
CREATE INDEX IF NOT EXISTS idx_colorants_formula ON colorants(formula_id);
CREATE INDEX IF NOT EXISTS idx_bases_formula ON bases(formula_id);
"#;
