//! CSV output for `tablature`-rendered rows.
//!
//! [`CsvWriter`] accepts array-shaped rows from a compiled
//! [`Table`](tablature::Table) and encodes them through the `csv` crate.
//! An optional UTF-8 byte-order mark can be written before the first
//! record for consumers (notably spreadsheet imports) that require one.
//!
//! ```rust
//! use serde_json::{json, Value};
//! use tablature::{ColumnSpec, Schema};
//! use tablature_csv::CsvWriter;
//!
//! let schema = Schema::builder("users")
//!     .column(ColumnSpec::new().named("ID").value_with(|row, _| row["id"].clone()))
//!     .column(ColumnSpec::new().named("Name").value_with(|row, _| row["name"].clone()))
//!     .build();
//! let table = schema.instantiate(Value::Null).unwrap();
//!
//! let mut writer = CsvWriter::new(Vec::new());
//! let items = vec![json!({ "id": 1, "name": "Taro" })];
//! writer.write_table(&table, &Value::Null, items).unwrap();
//!
//! let bytes = writer.into_inner().unwrap();
//! assert_eq!(String::from_utf8(bytes).unwrap(), "ID,Name\n1,Taro\n");
//! ```

use std::io::Write;

use serde_json::Value;
use tablature::Table;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Errors raised while encoding rows to CSV.
#[derive(Debug, Error)]
pub enum CsvError {
    /// The underlying CSV encoder failed.
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    /// Writing to the sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A row was not an ordered sequence of cells. Map-shaped tables
    /// cannot be written as CSV.
    #[error("row is not a sequence of cells")]
    NotTabular,
}

/// Writes rendered rows to a CSV sink.
pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    /// Wrap a sink. No bytes are written until the first row.
    pub fn new(sink: W) -> CsvWriter<W> {
        CsvWriter {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Wrap a sink, prepending a UTF-8 byte-order mark before any record.
    pub fn with_bom(mut sink: W) -> Result<CsvWriter<W>, CsvError> {
        sink.write_all(UTF8_BOM)?;
        Ok(CsvWriter::new(sink))
    }

    /// Append one rendered row. The row must be array-shaped.
    pub fn append(&mut self, row: &Value) -> Result<(), CsvError> {
        let cells = row.as_array().ok_or(CsvError::NotTabular)?;
        let record: Vec<String> = cells.iter().map(field).collect();
        self.writer.write_record(&record)?;
        Ok(())
    }

    /// Render a full table — header, then each item's row — through
    /// [`append`](Self::append).
    pub fn write_table<I>(
        &mut self,
        table: &Table,
        header_ctx: &Value,
        items: I,
    ) -> Result<(), CsvError>
    where
        I: IntoIterator<Item = Value>,
    {
        for row in table.render(header_ctx, items) {
            self.append(&row)?;
        }
        Ok(())
    }

    /// Flush buffered records to the sink.
    pub fn flush(&mut self) -> Result<(), CsvError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(self) -> Result<W, CsvError> {
        self.writer
            .into_inner()
            .map_err(|e| CsvError::Io(e.into_error()))
    }
}

/// CSV field form of one cell: `Null` encodes as the empty field, strings
/// as themselves, and anything else as its JSON text.
fn field(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
