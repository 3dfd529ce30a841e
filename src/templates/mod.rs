use std::collections::{BTreeSet, HashMap};
use tera::{Context, Tera};

use crate::error::{InventoryError, TemplateError};
use crate::inventory::{device_sheets, InventoryStore, SheetLayout, TableColumns};

/// Convert a `{Header Name}` placeholder template to Tera syntax.
///
/// Placeholders become `{{ row["Header Name"] }}`, `{{` and `}}` stand for literal
/// braces. Returns the Tera source and the placeholder names in first-seen order.
pub fn convert_placeholders_to_tera(
    name: &str,
    body: &str,
) -> Result<(String, Vec<String>), TemplateError> {
    let unbalanced = |position| TemplateError::Unbalanced {
        name: name.to_string(),
        position,
    };

    let mut out = String::with_capacity(body.len() + 16);
    let mut fields: Vec<String> = Vec::new();
    let mut chars = body.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' if chars.peek().map(|(_, c)| *c) == Some('{') => {
                chars.next();
                out.push_str(r#"{{ "{" }}"#);
            }
            '}' if chars.peek().map(|(_, c)| *c) == Some('}') => {
                chars.next();
                out.push_str(r#"{{ "}" }}"#);
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((p, '{')) => return Err(unbalanced(p)),
                        Some((_, c)) => field.push(c),
                        None => return Err(unbalanced(pos)),
                    }
                }
                let field = field.trim().to_string();
                if field.is_empty() {
                    return Err(unbalanced(pos));
                }
                out.push_str(&format!("{{{{ row[{}] }}}}", quote(&field)));
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
            '}' => return Err(unbalanced(pos)),
            c => out.push(c),
        }
    }

    Ok((out, fields))
}

/// Tera string literal for a header name
fn quote(field: &str) -> String {
    let delim = ['"', '\'', '`']
        .into_iter()
        .find(|d| !field.contains(*d))
        .unwrap_or('"');
    format!("{}{}{}", delim, field, delim)
}

/// Compiled templates from the Settings sheet
pub struct TemplateSet {
    tera: Tera,
    fields: HashMap<String, Vec<String>>,
}

impl TemplateSet {
    pub fn from_entries(entries: &[(String, String)]) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        let mut fields = HashMap::new();

        for (name, body) in entries {
            if fields.contains_key(name) {
                return Err(TemplateError::Duplicate(name.clone()));
            }
            let (source, names) = convert_placeholders_to_tera(name, body)?;
            tera.add_raw_template(name, &source)
                .map_err(|e| TemplateError::Render {
                    name: name.clone(),
                    message: format!("Invalid template: {}", e),
                })?;
            fields.insert(name.clone(), names);
        }

        tracing::debug!("Loaded {} configuration templates", fields.len());
        Ok(Self { tera, fields })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render one template against a row keyed by header text. Placeholders with
    /// no value in the row render as an empty string.
    pub fn render(&self, name: &str, row: &HashMap<String, String>) -> Result<String, TemplateError> {
        let names = self
            .fields
            .get(name)
            .ok_or_else(|| TemplateError::Unknown(name.to_string()))?;

        let mut values = row.clone();
        for field in names {
            values.entry(field.clone()).or_default();
        }

        let mut context = Context::new();
        context.insert("row", &values);
        self.tera
            .render(name, &context)
            .map_err(|e| TemplateError::Render {
                name: name.to_string(),
                message: e.to_string(),
            })
    }
}

/// Tally of one generate pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub sheets: usize,
    pub sheets_skipped: usize,
    pub rows_rendered: usize,
    pub rows_skipped: usize,
}

impl std::fmt::Display for GenerateSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} sheets ({} skipped), {} configurations rendered, {} rows skipped",
            self.sheets, self.sheets_skipped, self.rows_rendered, self.rows_skipped
        )
    }
}

/// Fill the `Configuration` column of every device sheet from the `Template` column
pub fn generate_configurations<S: InventoryStore + ?Sized>(
    store: &mut S,
    templates: &TemplateSet,
    layout: &SheetLayout,
    ignore: &[String],
) -> Result<GenerateSummary, InventoryError> {
    let mut summary = GenerateSummary::default();

    for sheet in device_sheets(&*store, ignore) {
        let columns = TableColumns::locate(&*store, &sheet, layout.header_row);
        let (Some(template_col), Some(config_col)) = (columns.template, columns.configuration) else {
            tracing::warn!(
                "Sheet {} has no Template/Configuration header on row {}, skipping",
                sheet,
                layout.header_row
            );
            summary.sheets_skipped += 1;
            continue;
        };
        summary.sheets += 1;

        let mut missing: BTreeSet<String> = BTreeSet::new();
        for row in layout.header_row + 1..=store.row_count(&sheet) {
            let cells = store.read_row(&sheet, row);
            let Some(template) = cells.get(&template_col).map(|t| t.trim()).filter(|t| !t.is_empty()) else {
                continue;
            };

            let values: HashMap<String, String> = columns
                .headers
                .iter()
                .map(|(col, header)| (header.clone(), cells.get(col).cloned().unwrap_or_default()))
                .collect();

            match templates.render(template, &values) {
                Ok(config) => {
                    store.write_cell(&sheet, row, config_col, &config)?;
                    summary.rows_rendered += 1;
                }
                Err(TemplateError::Unknown(name)) => {
                    if missing.insert(name.clone()) {
                        tracing::warn!("{} | Template '{}' does not exist on the Settings sheet", sheet, name);
                    }
                    summary.rows_skipped += 1;
                }
                Err(e) => {
                    tracing::warn!("{} | Row {}: {}", sheet, row, e);
                    summary.rows_skipped += 1;
                }
            }
        }
        tracing::debug!("{} | Configurations generated", sheet);
    }

    Ok(summary)
}
