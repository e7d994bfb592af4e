//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use crate::analyze::ReportAnalyzer;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Pipeline and chat sessions.
    pub analyzer: ReportAnalyzer,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(analyzer: ReportAnalyzer) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            analyzer,
        })
    }

    /// Seconds since the server started.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
