use divan_core::{ViewResponse, ViewRow, ID_FIELD};
use serde_json::Value;

use crate::client::Connector;
use crate::document::DocumentRef;
use crate::Result;

/// How view rows are handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnMode {
    /// Raw `key`/`value` pairs
    #[default]
    Value,
    /// Additionally resolve each row into a [`DocumentRef`]
    Document,
}

#[derive(Debug, Clone)]
pub struct ResultRow {
    pub id: Option<String>,
    pub key: Value,
    pub value: Value,
    pub document: Option<DocumentRef>,
}

/// Decoded view response; rows keep the server's order
#[derive(Debug, Clone)]
pub struct ViewResult {
    total_rows: u64,
    offset: Option<u64>,
    rows: Vec<ResultRow>,
    mode: ReturnMode,
}

impl ViewResult {
    pub(crate) fn from_response(raw: ViewResponse, mode: ReturnMode, db: &Connector) -> Result<Self> {
        let rows = raw
            .rows
            .into_iter()
            .map(|row| resolve_row(row, mode, db))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            total_rows: raw.total_rows,
            offset: raw.offset,
            rows,
            mode,
        })
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn mode(&self) -> ReturnMode {
        self.mode
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    /// Resolved documents, in row order
    pub fn documents(&self) -> impl Iterator<Item = &DocumentRef> {
        self.rows.iter().filter_map(|row| row.document.as_ref())
    }
}

impl IntoIterator for ViewResult {
    type Item = ResultRow;
    type IntoIter = std::vec::IntoIter<ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ViewResult {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn resolve_row(row: ViewRow, mode: ReturnMode, db: &Connector) -> Result<ResultRow> {
    let document = match mode {
        ReturnMode::Value => None,
        ReturnMode::Document => {
            // Prefer the full document sent with include_docs
            let source = match &row.doc {
                Some(Value::Object(map)) => Some(map.clone()),
                _ => match &row.value {
                    Value::Object(map) => Some(map.clone()),
                    _ => None,
                },
            };

            match source {
                Some(mut content) => {
                    if let (Some(id), false) = (&row.id, content.contains_key(ID_FIELD)) {
                        content.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                    }
                    Some(DocumentRef::from_object(content, db)?)
                }
                None => None,
            }
        }
    };

    Ok(ResultRow {
        id: row.id,
        key: row.key,
        value: row.value,
        document,
    })
}
