//! Transaction extraction

use crate::crawler::parser::cell_text;
use crate::crawler::Document;
use crate::extract::columns::{
    map_row, HEADER_ROWS, TRANSACTION_COLUMNS, TRANSACTION_DATE_COLUMN, TRANSACTION_RESULT_TABLE,
};
use crate::extract::TransactionRecord;

/// Maps every data row of a transaction result page to a 15-field record
pub fn extract_transactions(doc: &Document) -> Vec<TransactionRecord> {
    doc.table_rows(TRANSACTION_RESULT_TABLE, HEADER_ROWS)
        .into_iter()
        .map(|row| {
            let mut record = TransactionRecord::new();
            map_row(row, &TRANSACTION_COLUMNS, &mut record);
            record
        })
        .collect()
}

/// Date of the newest transaction shown on a transaction result page
///
/// Reads the date cell of the first data row. Returns an empty string when
/// the page has no data row.
pub fn latest_transaction_date(doc: &Document) -> String {
    doc.table_rows(TRANSACTION_RESULT_TABLE, HEADER_ROWS)
        .first()
        .map(|row| cell_text(*row, TRANSACTION_DATE_COLUMN))
        .unwrap_or_default()
}
