//! Shared domain types and rules for the RetailHub distribution service
//!
//! Nothing in this crate touches the database. The backend calls into it for
//! stock arithmetic, batch grouping, numbering and validation so those rules
//! can be tested on their own.

pub mod models;
pub mod numbering;
pub mod types;
pub mod validation;

pub use models::*;
pub use numbering::*;
pub use types::*;
pub use validation::*;
