use crate::{
    aggregate::{Aggregator, Direction},
    error::TallyError,
};
use csv::WriterBuilder;
use std::io::Write;
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

/// Trailing header columns after the schema's field names.
const COUNT_COLUMN: &str = "count";
const AMOUNT_COLUMN: &str = "amount";

///
/// CsvExportError
///

#[derive(Debug, ThisError)]
pub enum CsvExportError {
    #[error(transparent)]
    Aggregate(#[from] TallyError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Aggregator {
    /// Header plus data rows, ready for serialization.
    ///
    /// The header is the schema's field names followed by `count` and
    /// `amount`; each data row is the rendered key slots followed by the
    /// bucket's count and amount, in [`field_sorted`](Self::field_sorted)
    /// order over `sort_fields`.
    pub fn csv_rows(
        &self,
        sort_fields: &[&str],
        direction: Direction,
    ) -> Result<Vec<Vec<String>>, TallyError> {
        let sorted = self.field_sorted(sort_fields, direction)?;

        let mut rows = Vec::with_capacity(sorted.len() + 1);
        let mut header = self.schema().fields().to_vec();
        header.push(COUNT_COLUMN.to_string());
        header.push(AMOUNT_COLUMN.to_string());
        rows.push(header);

        for (key, total) in sorted {
            let mut row = key
                .parts()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            row.push(total.count.to_string());
            row.push(total.amount.to_string());
            rows.push(row);
        }

        Ok(rows)
    }

    /// Serialize [`csv_rows`](Self::csv_rows) through a csv writer to any
    /// sink the caller hands over.
    pub fn write_csv<W: Write>(
        &self,
        writer: W,
        sort_fields: &[&str],
        direction: Direction,
    ) -> Result<(), CsvExportError> {
        let mut out = WriterBuilder::new().from_writer(writer);
        for row in self.csv_rows(sort_fields, direction)? {
            out.write_record(&row)?;
        }
        out.flush()?;

        Ok(())
    }
}
