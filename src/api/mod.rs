//! API routes and handlers
//!
//! This module defines all API endpoints and their routing. Every route is
//! served under `/api/v1` and answers with the envelope from [`envelope`].

use axum::Router;

use crate::AppState;

mod ca;
pub mod envelope;
mod meta;
mod pdb;
mod view;

/// Create the API router, to be nested under `/api/v1`
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(meta::routes())
        .nest("/view", view::routes())
        .nest("/pdb", pdb::routes())
        // CA management endpoints
        .nest("/ca", ca::routes())
}
