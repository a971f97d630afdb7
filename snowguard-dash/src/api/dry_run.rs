//! Dry-run endpoint
//!
//! Plans the grants and revokes implied by the current metadata and logs
//! them as DRY_RUN audit entries. No statement is executed.

use axum::{extract::State, Json};
use snowguard_common::dry_run::{self, DryRunReport};
use snowguard_common::time::now;

use crate::AppState;

/// POST /api/dry-run
pub async fn run_dry_run(State(state): State<AppState>) -> Json<DryRunReport> {
    let mut session = state.session.write().await;
    Json(dry_run::run(&mut session, now()))
}
