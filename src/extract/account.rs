//! Account/compliance extraction
//!
//! Stage 1 reads the base fields and the detail link from an account search
//! result row. Stage 2 reads the detail page: account status, contact
//! details, installation/aircraft details, and one set of year-keyed
//! compliance fields per compliance year.

use crate::crawler::parser::{cell_link, cell_text, resolve_link, table_rows};
use crate::crawler::Document;
use crate::extract::columns::{
    map_row, map_row_prefixed, ColumnSpec, ACCOUNT_CHILD_DETAILS, ACCOUNT_CONTACT_TABLE,
    ACCOUNT_DETAIL_LINK_ANCHOR, ACCOUNT_DETAIL_LINK_COLUMN, ACCOUNT_GENERAL_TABLE,
    ACCOUNT_RESULT_COLUMNS, ACCOUNT_RESULT_TABLE, ACCOUNT_STATUS, CH_LEADING_ROWS,
    CH_TRAILING_ROWS, COMPLIANCE_COLUMNS, COMPLIANCE_YEAR_COLUMN, CONTACT_COLUMNS,
    DETAIL_DATA_ROW, GENERAL_INFO_COLUMNS, HEADER_ROWS,
};
use crate::extract::AccountRecord;
use scraper::ElementRef;
use url::Url;

/// Base fields of one result row plus the detail page still to be read
#[derive(Debug, Clone)]
pub struct PendingAccount {
    pub record: AccountRecord,
    pub detail_url: Url,
}

/// Output of stage 1 for one result page
#[derive(Debug, Default)]
pub struct AccountRows {
    pub pending: Vec<PendingAccount>,
    /// Rows without a usable detail link; these never become records
    pub without_link: usize,
}

/// Compliance region of a compliance table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceRegion {
    Eu,
    Ch,
}

impl ComplianceRegion {
    /// Prefix applied to the year-keyed fields of this region
    pub fn prefix(&self, year: &str) -> String {
        match self {
            Self::Eu => format!("EU_Compliance_{}_", year),
            Self::Ch => format!("CH_Compliance_{}_", year),
        }
    }
}

/// Layout of the compliance part of a detail page
#[derive(Debug)]
pub enum DetailShape<'a> {
    /// No compliance table at all
    Empty,
    /// One compliance table, EU data only
    SingleTable(Vec<ElementRef<'a>>),
    /// EU table followed by a CH table (aircraft operator accounts)
    DualTable {
        eu_rows: Vec<ElementRef<'a>>,
        ch_rows: Vec<ElementRef<'a>>,
    },
}

/// Stage 1: maps every result row of an account search page
///
/// Detail links are resolved against `page_url`. Rows without a detail link
/// are counted and dropped.
pub fn extract_result_rows(doc: &Document, page_url: &Url) -> AccountRows {
    let mut rows = AccountRows::default();

    for row in doc.table_rows(ACCOUNT_RESULT_TABLE, HEADER_ROWS) {
        let mut record = AccountRecord::new();
        map_row(row, &ACCOUNT_RESULT_COLUMNS, &mut record);

        let detail_url = cell_link(row, ACCOUNT_DETAIL_LINK_COLUMN, ACCOUNT_DETAIL_LINK_ANCHOR)
            .and_then(|href| resolve_link(&href, page_url));

        match detail_url {
            Some(detail_url) => rows.pending.push(PendingAccount { record, detail_url }),
            None => {
                tracing::trace!("Dropping account row without detail link on {}", page_url);
                rows.without_link += 1;
            }
        }
    }

    rows
}

/// Stage 2: adds every detail-page field to a record holding the base fields
pub fn enrich_from_detail(record: &mut AccountRecord, doc: &Document) {
    let general = detail_row(doc, ACCOUNT_GENERAL_TABLE);
    record.set(
        ACCOUNT_STATUS.field,
        general
            .map(|row| cell_text(row, ACCOUNT_STATUS.column))
            .unwrap_or_default(),
    );

    let contact = detail_row(doc, ACCOUNT_CONTACT_TABLE);
    set_detail_fields(record, contact, &CONTACT_COLUMNS);

    let child_css = format!("{} table", ACCOUNT_CHILD_DETAILS);
    let installation = doc
        .first(&child_css)
        .and_then(|table| table_rows(table).into_iter().nth(DETAIL_DATA_ROW - 1));
    set_detail_fields(record, installation, &GENERAL_INFO_COLUMNS);

    match detail_shape(doc) {
        DetailShape::Empty => {}
        DetailShape::SingleTable(rows) => {
            apply_compliance_rows(record, &rows, ComplianceRegion::Eu);
        }
        DetailShape::DualTable { eu_rows, ch_rows } => {
            apply_compliance_rows(record, &eu_rows, ComplianceRegion::Eu);
            apply_compliance_rows(record, &ch_rows, ComplianceRegion::Ch);
        }
    }
}

/// Determines the compliance layout of a detail page
///
/// Compliance tables sit in `div` containers under the child-details
/// element. The EU table skips its two header rows. A CH table, when present,
/// also carries four leading and four trailing non-data rows.
pub fn detail_shape(doc: &Document) -> DetailShape<'_> {
    let containers: Vec<ElementRef<'_>> = doc
        .select_all(&format!("{} div", ACCOUNT_CHILD_DETAILS))
        .into_iter()
        .filter_map(container_table)
        .collect();

    match containers.as_slice() {
        [] => DetailShape::Empty,
        [single] => DetailShape::SingleTable(skip_rows(*single, HEADER_ROWS, 0)),
        [eu, ch, ..] => DetailShape::DualTable {
            eu_rows: skip_rows(*eu, HEADER_ROWS, 0),
            ch_rows: skip_rows(*ch, CH_LEADING_ROWS, CH_TRAILING_ROWS),
        },
    }
}

/// Writes the six year-keyed fields of every year row
///
/// A row is a year row when its year cell holds exactly four characters.
pub fn apply_compliance_rows(
    record: &mut AccountRecord,
    rows: &[ElementRef<'_>],
    region: ComplianceRegion,
) {
    for row in rows {
        let year = cell_text(*row, COMPLIANCE_YEAR_COLUMN);
        if year.chars().count() != 4 {
            continue;
        }
        map_row_prefixed(*row, &COMPLIANCE_COLUMNS, &region.prefix(&year), record);
    }
}

/// The data row of a single-row detail table
fn detail_row<'a>(doc: &'a Document, table_css: &str) -> Option<ElementRef<'a>> {
    doc.all_table_rows(table_css)
        .into_iter()
        .nth(DETAIL_DATA_ROW - 1)
}

fn set_detail_fields(
    record: &mut AccountRecord,
    row: Option<ElementRef<'_>>,
    columns: &[ColumnSpec],
) {
    match row {
        Some(row) => map_row(row, columns, record),
        None => {
            for spec in columns {
                record.set(spec.field, "");
            }
        }
    }
}

/// The table held directly by a compliance container
fn container_table(div: ElementRef<'_>) -> Option<ElementRef<'_>> {
    div.children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "table")
}

fn skip_rows(table: ElementRef<'_>, leading: usize, trailing: usize) -> Vec<ElementRef<'_>> {
    let rows = table_rows(table);
    if rows.len() <= leading + trailing {
        return Vec::new();
    }
    rows[leading..rows.len() - trailing].to_vec()
}
