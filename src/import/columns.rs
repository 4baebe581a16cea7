use std::collections::HashMap;

use crate::import::names::normalize_name;
use crate::import::types::ImportError;

/// One semantic field of an entity's alias table. Aliases are written in
/// their normalized form (lowercase, no diacritics) so header matching can
/// reuse the name normalizer.
pub struct ColumnSpec {
    pub field: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

/// Field → header index, built once per file. Optional fields with no
/// matching header are simply absent and get defaulted by the validators.
#[derive(Debug)]
pub struct ColumnMap {
    index: HashMap<&'static str, usize>,
}

impl ColumnMap {
    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.index.get(field).copied()
    }
}

/// Scans headers in order against each field's alias list; the first header
/// matching any alias wins. A required field with no match aborts the whole
/// import before any data row is read.
pub fn resolve_columns(
    headers: &[String],
    specs: &'static [ColumnSpec],
) -> Result<ColumnMap, ImportError> {
    let keys: Vec<String> = headers.iter().map(|h| normalize_name(h)).collect();
    let mut index = HashMap::new();
    for spec in specs {
        let found = keys
            .iter()
            .position(|k| spec.aliases.iter().any(|a| k == a));
        match found {
            Some(i) => {
                index.insert(spec.field, i);
            }
            None if spec.required => return Err(ImportError::MissingColumn(spec.field)),
            None => {}
        }
    }
    Ok(ColumnMap { index })
}

/// One raw row's cells seen through the column mapping. Values come back
/// trimmed; blank cells read as absent.
pub struct RowView<'a> {
    cells: &'a [String],
    map: &'a ColumnMap,
}

impl<'a> RowView<'a> {
    pub fn new(cells: &'a [String], map: &'a ColumnMap) -> Self {
        RowView { cells, map }
    }

    pub fn text(&self, field: &str) -> Option<&'a str> {
        let i = self.map.index_of(field)?;
        let cell = self.cells.get(i)?.trim();
        if cell.is_empty() {
            None
        } else {
            Some(cell)
        }
    }
}
