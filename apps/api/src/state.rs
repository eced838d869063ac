use std::sync::Arc;

use crate::matching::runner::BatchMatchRunner;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The same runner instance the weekly scheduler fires.
    pub runner: Arc<BatchMatchRunner>,
}
