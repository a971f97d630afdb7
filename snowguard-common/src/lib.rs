//! # SnowGuard Common Library
//!
//! Session model and pipelines shared by the SnowGuard services:
//! - Permission metadata and audit log models
//! - Validation and merge of bulk-uploaded and manually entered rows
//! - Snowflake source adapter with sample-data fallback
//! - Dashboard summaries, filters and the dry-run planner
//! - Configuration loading

pub mod config;
pub mod csv_io;
pub mod dry_run;
pub mod error;
pub mod fallback;
pub mod import;
pub mod models;
pub mod source;
pub mod store;
pub mod summary;
pub mod time;

pub use error::{Error, Result};
pub use store::{AuditLog, MetadataStore, Session, SourceStatus};
