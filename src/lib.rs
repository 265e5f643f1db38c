//! Create Azure DevOps backlog items from accessibility audit workbooks.

pub mod ado;
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod html;
pub mod pipeline;
pub mod workbook;

pub use error::{Error, Result};
