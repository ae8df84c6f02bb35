//! CSV record sink
//!
//! Transactions have a fixed schema and are streamed row by row. Account
//! records carry a column set that grows with the compliance years found, so
//! they are buffered and written once the column union is known.

use crate::crawler::ReportKind;
use crate::extract::columns::{field_names, ACCOUNT_RESULT_COLUMNS, TRANSACTION_COLUMNS};
use crate::extract::Record;
use crate::output::traits::{OutputResult, RecordSink};
use csv::Writer;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// How the CSV header is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMode {
    /// Known columns; rows are written as they arrive
    Fixed(Vec<String>),
    /// Union of all field names in first-seen order; rows are written on finish.
    /// The given columns are the header when no record arrives.
    Union(Vec<String>),
}

/// Writes the records of one report to one CSV file
pub struct CsvSink {
    kind: ReportKind,
    path: PathBuf,
    mode: ColumnMode,
    writer: Option<Writer<File>>,
    buffered: Vec<Record>,
    rows_written: u64,
}

impl CsvSink {
    pub fn new(kind: ReportKind, path: impl Into<PathBuf>, mode: ColumnMode) -> Self {
        Self {
            kind,
            path: path.into(),
            mode,
            writer: None,
            buffered: Vec::new(),
            rows_written: 0,
        }
    }

    /// Account sink with a unioned header, the base fields when empty
    pub fn for_accounts(path: impl Into<PathBuf>) -> Self {
        Self::new(
            ReportKind::Account,
            path,
            ColumnMode::Union(field_names(&ACCOUNT_RESULT_COLUMNS)),
        )
    }

    /// Transaction sink with the fixed 15-column header
    pub fn for_transactions(path: impl Into<PathBuf>) -> Self {
        Self::new(
            ReportKind::Transaction,
            path,
            ColumnMode::Fixed(field_names(&TRANSACTION_COLUMNS)),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written to the file so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn open(&self) -> OutputResult<Writer<File>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Writer::from_path(&self.path)?)
    }

    /// Opens the file and writes the header on first use
    fn writer(&mut self, columns: &[String]) -> OutputResult<&mut Writer<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                let mut writer = self.open()?;
                if !columns.is_empty() {
                    writer.write_record(columns)?;
                }
                writer
            }
        };

        Ok(self.writer.insert(writer))
    }
}

/// Field names across records, in first-seen order
pub fn union_columns(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();

    for name in records.iter().flat_map(Record::field_names) {
        if seen.insert(name) {
            columns.push(name.to_string());
        }
    }

    columns
}

fn row_for<'a>(record: &'a Record, columns: &'a [String]) -> impl Iterator<Item = &'a str> {
    columns
        .iter()
        .map(move |column| record.get(column).unwrap_or(""))
}

impl RecordSink for CsvSink {
    fn write_record(&mut self, kind: ReportKind, record: &Record) -> OutputResult<()> {
        if kind != self.kind {
            return Ok(());
        }

        match &self.mode {
            ColumnMode::Union(_) => self.buffered.push(record.clone()),
            ColumnMode::Fixed(columns) => {
                let columns = columns.clone();
                let writer = self.writer(&columns)?;
                writer.write_record(row_for(record, &columns))?;
                self.rows_written += 1;
            }
        }

        Ok(())
    }

    fn finish(&mut self, kind: ReportKind) -> OutputResult<()> {
        if kind != self.kind {
            return Ok(());
        }

        let columns = match &self.mode {
            ColumnMode::Fixed(columns) => columns.clone(),
            ColumnMode::Union(_) if !self.buffered.is_empty() => union_columns(&self.buffered),
            ColumnMode::Union(empty) => empty.clone(),
        };

        let records = std::mem::take(&mut self.buffered);
        let writer = self.writer(&columns)?;
        for record in &records {
            writer.write_record(row_for(record, &columns))?;
        }
        writer.flush()?;
        self.rows_written += records.len() as u64;

        tracing::info!(
            "Wrote {} {} rows to {}",
            self.rows_written,
            self.kind,
            self.path.display()
        );

        self.writer = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(fields: &[(&str, &str)]) -> Record {
        let mut record = Record::new();
        for (name, value) in fields {
            record.set(*name, *value);
        }
        record
    }

    #[test]
    fn test_union_columns_first_seen_order() {
        let records = vec![
            record(&[("A", "1"), ("EU_Compliance_2020_Compliance_Code", "A")]),
            record(&[("A", "2"), ("CH_Compliance_2021_Compliance_Code", "B")]),
        ];

        assert_eq!(
            union_columns(&records),
            vec![
                "A",
                "EU_Compliance_2020_Compliance_Code",
                "CH_Compliance_2021_Compliance_Code"
            ]
        );
    }

    #[test]
    fn test_union_sink_fills_missing_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.csv");
        let mut sink = CsvSink::for_accounts(&path);

        sink.write_record(ReportKind::Account, &record(&[("Name", "x"), ("EU_2020", "1")]))
            .unwrap();
        sink.write_record(ReportKind::Account, &record(&[("Name", "y"), ("EU_2021", "2")]))
            .unwrap();
        assert!(!path.exists());

        sink.finish(ReportKind::Account).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "Name,EU_2020,EU_2021\nx,1,\ny,,2\n");
        assert_eq!(sink.rows_written(), 2);
    }

    #[test]
    fn test_fixed_sink_streams_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("transactions.csv");
        let mut sink = CsvSink::for_transactions(&path);

        sink.write_record(
            ReportKind::Transaction,
            &record(&[("Transaction_ID", "EU1"), ("Nb_of_Units", "1 200")]),
        )
        .unwrap();
        sink.finish(ReportKind::Transaction).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 15);
        assert_eq!(&headers[0], "Transaction_ID");

        let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "EU1");
        assert_eq!(&rows[0][14], "1 200");
        assert_eq!(&rows[0][3], "");
    }

    #[test]
    fn test_other_report_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.csv");
        let mut sink = CsvSink::for_transactions(&path);

        sink.write_record(ReportKind::Account, &record(&[("Name", "x")]))
            .unwrap();
        sink.finish(ReportKind::Account).unwrap();

        assert!(!path.exists());
        assert_eq!(sink.rows_written(), 0);
    }

    #[test]
    fn test_empty_account_report_writes_base_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.csv");
        let mut sink = CsvSink::for_accounts(&path);

        sink.finish(ReportKind::Account).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header.split(',').count(), 10);
        assert!(header.starts_with("National_Administrator,Account_Type,"));
    }

    #[test]
    fn test_empty_fixed_report_writes_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.csv");
        let mut sink = CsvSink::for_transactions(&path);

        sink.finish(ReportKind::Transaction).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("Transaction_ID,Transaction_Type,"));
    }
}
