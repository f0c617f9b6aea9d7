//! Server-rendered HTML.
//!
//! The markup is intentionally plain: every value passes through [`escape`]
//! before it reaches the page.

use std::fmt::Write;

use crate::types::payload::{encode_bases, encode_colorants};
use crate::types::{Base, Colorant, Formula, FormulaDetail};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} - Basecoat</title>\n</head>\n<body>\n\
         <nav><a href=\"/\">Formulas</a> | <a href=\"/formula/add\">Add formula</a></nav>\n\
         {}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn index_page(formulas: &[Formula]) -> String {
    let mut body = String::from("<h1>Formulas</h1>\n");

    if formulas.is_empty() {
        body.push_str("<p>No formulas yet.</p>\n");
        return layout("Formulas", &body);
    }

    body.push_str(
        "<table>\n<thead><tr><th>Name</th><th>Number</th><th>Customer</th>\
         <th>Summary</th><th>Last modified</th></tr></thead>\n<tbody>\n",
    );
    for formula in formulas {
        let _ = writeln!(
            body,
            "<tr><td><a href=\"/formula/{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            formula.id,
            escape(&formula.formula_name),
            escape(&formula.formula_number),
            escape(&formula.customer_name),
            escape(&formula.summary),
            formula.last_modified.format("%Y-%m-%d %H:%M"),
        );
    }
    body.push_str("</tbody>\n</table>\n");

    layout("Formulas", &body)
}

fn colorant_rows(colorants: &[Colorant]) -> String {
    let mut rows = String::new();
    for colorant in colorants {
        let _ = writeln!(
            rows,
            "<li>{} ({})</li>",
            escape(&colorant.colorant_name),
            colorant.amount
        );
    }
    rows
}

fn base_rows(bases: &[Base]) -> String {
    let mut rows = String::new();
    for base in bases {
        let _ = writeln!(
            rows,
            "<li>{} - {}</li>",
            escape(&base.base_name),
            escape(&base.product_name)
        );
    }
    rows
}

pub fn detail_page(detail: &FormulaDetail) -> String {
    let formula = &detail.formula;
    let body = format!(
        "<h1>{name}</h1>\n\
         <dl>\n<dt>Number</dt><dd>{number}</dd>\n<dt>Customer</dt><dd>{customer}</dd>\n\
         <dt>Summary</dt><dd>{summary}</dd>\n<dt>Notes</dt><dd>{notes}</dd>\n\
         <dt>Created</dt><dd>{created}</dd>\n<dt>Last modified</dt><dd>{modified}</dd>\n</dl>\n\
         <h2>Colorants</h2>\n<ul>\n{colorants}</ul>\n\
         <h2>Bases</h2>\n<ul>\n{bases}</ul>\n\
         <p><a href=\"/formula/edit/{id}\">Edit</a></p>\n",
        name = escape(&formula.formula_name),
        number = escape(&formula.formula_number),
        customer = escape(&formula.customer_name),
        summary = escape(&formula.summary),
        notes = escape(&formula.notes),
        created = formula.created_date.format("%Y-%m-%d %H:%M"),
        modified = formula.last_modified.format("%Y-%m-%d %H:%M"),
        colorants = colorant_rows(&detail.colorants),
        bases = base_rows(&detail.bases),
        id = formula.id,
    );

    layout(&formula.formula_name, &body)
}

const SUBMIT_SCRIPT: &str = r#"<script>
document.getElementById("formula-form").addEventListener("submit", async (event) => {
  event.preventDefault();
  const response = await fetch(event.target.action, {
    method: "POST",
    body: new URLSearchParams(new FormData(event.target)),
  });
  const result = await response.json();
  if (result.success) {
    window.location = "/";
  } else {
    document.getElementById("form-error").textContent = result.error;
  }
});
</script>"#;

fn text_input(name: &str, label: &str, value: &str) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label> \
         <input type=\"text\" id=\"{name}\" name=\"{name}\" value=\"{}\"></p>\n",
        escape(value)
    )
}

fn text_area(name: &str, label: &str, value: &str) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label><br>\
         <textarea id=\"{name}\" name=\"{name}\" rows=\"4\" cols=\"60\">{}</textarea></p>\n",
        escape(value)
    )
}

/// The add form when `detail` is `None`, otherwise the pre-filled edit form.
pub fn form_page(detail: Option<&FormulaDetail>) -> String {
    let formula = detail.map(|d| &d.formula);
    let (name, number, customer, summary, notes) = match formula {
        Some(f) => (
            f.formula_name.as_str(),
            f.formula_number.as_str(),
            f.customer_name.as_str(),
            f.summary.as_str(),
            f.notes.as_str(),
        ),
        None => ("", "", "", "", ""),
    };

    let colorants = detail
        .map(|d| d.colorants.iter().map(Colorant::entry).collect::<Vec<_>>())
        .unwrap_or_default();
    let bases = detail
        .map(|d| d.bases.iter().map(Base::entry).collect::<Vec<_>>())
        .unwrap_or_default();
    let colorants_json = encode_colorants(&colorants).unwrap_or_else(|_| "[]".to_string());
    let bases_json = encode_bases(&bases).unwrap_or_else(|_| "[]".to_string());

    let (title, id_value) = match formula {
        Some(f) => (format!("Edit {}", f.formula_name), f.id.to_string()),
        None => ("Add formula".to_string(), String::new()),
    };

    let mut body = format!(
        "<h1>{}</h1>\n<p id=\"form-error\"></p>\n\
         <form id=\"formula-form\" method=\"post\" action=\"/formula/add\">\n\
         <input type=\"hidden\" name=\"formula_id\" value=\"{}\">\n",
        escape(&title),
        id_value
    );
    body.push_str(&text_input("formula_name", "Name", name));
    body.push_str(&text_input("formula_number", "Number", number));
    body.push_str(&text_input("customer_name", "Customer", customer));
    body.push_str(&text_input("summary", "Summary", summary));
    body.push_str(&text_area("notes", "Notes", notes));
    body.push_str(&text_area(
        "colorants",
        "Colorants (JSON list of colorant_name/amount)",
        &colorants_json,
    ));
    body.push_str(&text_area(
        "bases",
        "Bases (JSON list of base_name/product_name)",
        &bases_json,
    ));
    body.push_str("<p><button type=\"submit\">Save</button></p>\n</form>\n");
    body.push_str(SUBMIT_SCRIPT);

    layout(&title, &body)
}

pub fn error_page(status: u16, message: &str) -> String {
    let body = format!("<h1>{status}</h1>\n<p>{}</p>\n", escape(message));
    layout("Error", &body)
}
