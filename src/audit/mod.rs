//! Reading the audit workbook: report header cells, findings rows, and the
//! DataLayer lookups.

pub mod details;
pub mod findings;
pub mod lookup;

pub use details::{ReportDetails, TestingAccount};
pub use findings::{Finding, FindingsTable, ResourceCell};
pub use lookup::{CustomCriteria, CustomCriteriaLookup, ResourceLookup};
