// src/batch.rs
//! Columnar batch parsed from an uploaded delimited file (header row =
//! feature names). Columns are typed by inference: a column where every
//! non-empty cell parses as a float is numeric, anything else stays text.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};

use crate::schema::ModelSchema;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Empty cells become NaN so row alignment is preserved.
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }
}

/// One uploaded batch. Created fresh per upload, scored as a whole, never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    columns: Vec<Column>,
    rows: usize,
}

impl RecordBatch {
    /// Parse delimited text with a header row.
    ///
    /// Ragged rows are parse errors (reported with their line number); an
    /// input with only a header is a valid empty batch.
    pub fn from_csv(input: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(input.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .context("reading CSV header row")?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if headers.is_empty() {
            bail!("uploaded file has no header row");
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for (i, rec) in reader.records().enumerate() {
            let rec = rec.map_err(|e| anyhow!("CSV parse error at line {}: {}", i + 2, e))?;
            if rec.len() != headers.len() {
                bail!(
                    "CSV parse error at line {}: expected {} fields, got {}",
                    i + 2,
                    headers.len(),
                    rec.len()
                );
            }
            for (col, field) in cells.iter_mut().zip(rec.iter()) {
                col.push(field.to_string());
            }
        }

        let rows = cells.first().map(|c| c.len()).unwrap_or(0);
        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| Column {
                data: infer_column(&raw),
                name,
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Numeric columns in upload order, for the comparative summaries.
    pub fn numeric_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns.iter().filter_map(|c| match &c.data {
            ColumnData::Numeric(v) => Some((c.name.as_str(), v.as_slice())),
            ColumnData::Text(_) => None,
        })
    }

    /// Assemble the model feature matrix following the schema order.
    ///
    /// This is the only validation the upload gets beyond CSV shape: every
    /// schema feature must be present, numeric, and filled on every row.
    pub fn feature_matrix(&self, schema: &ModelSchema) -> Result<Vec<Vec<f32>>> {
        let mut feature_cols: Vec<&[f64]> = Vec::with_capacity(schema.len());
        for name in schema.names() {
            let col = self
                .column(name)
                .ok_or_else(|| anyhow!("uploaded data is missing model feature `{name}`"))?;
            match &col.data {
                ColumnData::Numeric(v) => feature_cols.push(v),
                ColumnData::Text(_) => {
                    bail!("model feature `{name}` is not numeric in the uploaded data")
                }
            }
        }

        let mut matrix = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            let mut row = Vec::with_capacity(schema.len());
            for (values, name) in feature_cols.iter().zip(schema.names()) {
                let v = values[i];
                if !v.is_finite() {
                    bail!("model feature `{name}` has a missing value at row {}", i + 1);
                }
                row.push(v as f32);
            }
            matrix.push(row);
        }
        Ok(matrix)
    }

    /// All original values of one row, keyed by column name, for the full
    /// report view. NaN (missing numeric cell) maps to JSON null.
    pub fn row_values(&self, index: usize) -> Map<String, Value> {
        let mut out = Map::with_capacity(self.columns.len());
        for col in &self.columns {
            let v = match &col.data {
                ColumnData::Numeric(vals) => {
                    let x = vals[index];
                    serde_json::Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null)
                }
                ColumnData::Text(vals) => Value::String(vals[index].clone()),
            };
            out.insert(col.name.clone(), v);
        }
        out
    }
}

/// Numeric iff there is at least one non-empty cell and every non-empty cell
/// parses as a float. An all-empty column stays text (and is therefore
/// excluded from numeric summaries).
fn infer_column(raw: &[String]) -> ColumnData {
    let mut any_value = false;
    let mut numeric = Vec::with_capacity(raw.len());
    for cell in raw {
        if cell.is_empty() {
            numeric.push(f64::NAN);
            continue;
        }
        any_value = true;
        match cell.parse::<f64>() {
            Ok(v) => numeric.push(v),
            Err(_) => return ColumnData::Text(raw.to_vec()),
        }
    }
    if any_value {
        ColumnData::Numeric(numeric)
    } else {
        ColumnData::Text(raw.to_vec())
    }
}
