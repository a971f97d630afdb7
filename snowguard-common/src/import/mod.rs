//! Metadata validation and merge pipelines
//!
//! Two entry points append permission rows to the session's metadata table:
//!
//! - [`bulk`]: CSV upload. Every row goes through the full [`validator`];
//!   only rows that pass are stamped and appended.
//! - [`single`]: manual entry form. Only the four object/role names are
//!   checked; the permission type and dates arrive already typed.
//!
//! The two paths intentionally differ in rigor (see DESIGN.md).

pub mod bulk;
pub mod candidate;
pub mod single;
pub mod validator;

pub use bulk::{
    import_batch, validate_batch, BatchValidation, ImportOutcome, ImportStatus, InvalidRow, ValidRow,
};
pub use candidate::{CandidateRecord, NewPermission};
pub use single::{add_single, AddError, SingleAddForm};
pub use validator::{check, validate, ValidationResult};

/// Actor recorded in the audit fields of bulk-imported rows
pub const BULK_UPLOAD_ACTOR: &str = "BULK_UPLOAD";
