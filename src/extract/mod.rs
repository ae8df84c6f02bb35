//! Record extraction
//!
//! This module turns parsed registry pages into flat records:
//! - Column-index tables for every registry table
//! - Account extraction (result rows plus detail-page enrichment)
//! - Transaction extraction
//! - Cell text normalisation

pub mod account;
pub mod columns;
mod record;
mod text;
pub mod transaction;

pub use account::{
    enrich_from_detail, extract_result_rows, AccountRows, ComplianceRegion, DetailShape,
    PendingAccount,
};
pub use columns::ColumnSpec;
pub use record::{AccountRecord, Record, TransactionRecord};
pub use text::normalize_text;
pub use transaction::{extract_transactions, latest_transaction_date};
