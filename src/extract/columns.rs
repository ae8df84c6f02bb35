//! Column-index tables
//!
//! All positional knowledge about the registry's tables lives here. Column
//! numbers are 1-based element positions within a row, matching CSS
//! `nth-child`. The row mappers in this module are the only code that turns
//! those coordinates into record fields.

use crate::crawler::parser::cell_text;
use crate::extract::Record;
use scraper::ElementRef;

/// A named field read from a fixed column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub field: &'static str,
    pub column: usize,
}

const fn col(field: &'static str, column: usize) -> ColumnSpec {
    ColumnSpec { field, column }
}

/// Header rows above the data rows in every result table
pub const HEADER_ROWS: usize = 2;

/// Rows skipped at the top of a CH compliance table
pub const CH_LEADING_ROWS: usize = 4;

/// Rows skipped at the bottom of a CH compliance table
pub const CH_TRAILING_ROWS: usize = 4;

/// Account search result table
pub const ACCOUNT_RESULT_TABLE: &str = "table#tblAccountSearchResult";

/// Account search result row, base fields
pub const ACCOUNT_RESULT_COLUMNS: [ColumnSpec; 10] = [
    col("National_Administrator", 1),
    col("Account_Type", 2),
    col("Account_Holder_Name", 3),
    col("Installation/Aircraft_ID", 4),
    col("Installation_Name/Aircraft_Operator_Code", 5),
    col("Company_Registration_No", 6),
    col("Permit/Plan_ID", 7),
    col("Permit/Plan_Date", 8),
    col("Main_Activity_Type", 9),
    col("Latest_Compliance_Code", 10),
];

/// Cell holding the detail-page link, and the anchor inside it
pub const ACCOUNT_DETAIL_LINK_COLUMN: usize = 11;
pub const ACCOUNT_DETAIL_LINK_ANCHOR: &str = "td:nth-child(2) a";

/// Detail page: general information table
pub const ACCOUNT_GENERAL_TABLE: &str = "table#tblAccountGeneralInfo";
pub const ACCOUNT_STATUS: ColumnSpec = col("Account_Status", 6);

/// Detail page: contact information table
pub const ACCOUNT_CONTACT_TABLE: &str = "table#tblAccountContactInfo";
pub const CONTACT_COLUMNS: [ColumnSpec; 10] = [
    col("Type", 1),
    col("Legal_Entity_Identifier", 3),
    col("Main_Address_Line", 4),
    col("Secondary_Address_Line", 5),
    col("Postal_Code", 6),
    col("City", 7),
    col("Country", 8),
    col("Telephone_1", 9),
    col("Telephone_2", 10),
    col("E-Mail_Address", 11),
];

/// Detail page: container of the installation/aircraft table and the compliance tables
pub const ACCOUNT_CHILD_DETAILS: &str = "#tblChildDetails";
pub const GENERAL_INFO_COLUMNS: [ColumnSpec; 7] = [
    col("Monitoring_Plan_Year_of_Expiry", 5),
    col("Name_of_Subsidiary_Undertaking", 6),
    col("Name_of_Parent_Undertaking", 7),
    col("E-PRTR_Identification", 8),
    col("Call_Sign_(ICAO_designator)", 9),
    col("First_Year_of_Emissions", 10),
    col("Last_Year_of_Emissions", 11),
];

/// Detail tables carry their single data row at this position (1-based)
pub const DETAIL_DATA_ROW: usize = 3;

/// Compliance row: year column, then six year-keyed fields
pub const COMPLIANCE_YEAR_COLUMN: usize = 2;
pub const COMPLIANCE_COLUMNS: [ColumnSpec; 6] = [
    col("Allowances_in_Allocation", 3),
    col("Verified_Emissions", 4),
    col("Units_Surrendered", 5),
    col("Cumulative_Surrendered_Units", 6),
    col("Cumulative_Verified_Emissions", 7),
    col("Compliance_Code", 8),
];

/// Transaction search result table
pub const TRANSACTION_RESULT_TABLE: &str = "table#tblTransactionSearchResult";
pub const TRANSACTION_COLUMNS: [ColumnSpec; 15] = [
    col("Transaction_ID", 1),
    col("Transaction_Type", 2),
    col("Transaction_Date", 3),
    col("Transaction_Status", 4),
    col("Transferring_Registry", 5),
    col("Transferring_Account_Type", 6),
    col("Transferring_Account_Name", 7),
    col("Transferring_Account_Identifier", 8),
    col("Transferring_Account_Holder", 9),
    col("Acquiring_Registry", 10),
    col("Acquiring_Account_Type", 11),
    col("Acquiring_Account_Name", 12),
    col("Acquiring_Account_Identifier", 13),
    col("Acquiring_Account_Holder", 14),
    col("Nb_of_Units", 15),
];

/// Column read by the update gate: date of the newest transaction
pub const TRANSACTION_DATE_COLUMN: usize = 3;

/// Copies every column of `columns` from `row` into `record`
pub fn map_row(row: ElementRef<'_>, columns: &[ColumnSpec], record: &mut Record) {
    for spec in columns {
        record.set(spec.field, cell_text(row, spec.column));
    }
}

/// Copies `columns` from `row` into `record` under `prefix`
pub fn map_row_prefixed(
    row: ElementRef<'_>,
    columns: &[ColumnSpec],
    prefix: &str,
    record: &mut Record,
) {
    for spec in columns {
        record.set(format!("{}{}", prefix, spec.field), cell_text(row, spec.column));
    }
}

/// Field names of a column table, in column order
pub fn field_names(columns: &[ColumnSpec]) -> Vec<String> {
    columns.iter().map(|spec| spec.field.to_string()).collect()
}
