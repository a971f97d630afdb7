//! HTTP API handlers for snowguard-dash

pub mod audit;
pub mod buildinfo;
pub mod dashboard;
pub mod dry_run;
pub mod health;
pub mod metadata;
pub mod permissions;
pub mod source;
pub mod ui;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

pub use audit::{export_audit, list_audit};
pub use buildinfo::get_build_info;
pub use dashboard::get_dashboard;
pub use dry_run::run_dry_run;
pub use health::health_routes;
pub use metadata::{export_metadata, list_metadata, metadata_by_database, metadata_by_role};
pub use permissions::{
    add_permission, download_template, import_upload, upload_error_report, validate_upload,
};
pub use source::get_source_status;
pub use ui::{serve_app_js, serve_index};

/// Split a comma-separated query value into trimmed, non-empty items
pub(crate) fn split_list(value: Option<&str>) -> Vec<&str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

/// CSV body served as a file download
pub(crate) fn csv_attachment(filename: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}
