//! DTOs for health check endpoint.

use serde::Serialize;

/// Health check response with backend roster status.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub backends: BackendsStatus,
}

/// Storage backend roster, configured vs actually connected.
#[derive(Debug, Serialize)]
pub struct BackendsStatus {
    pub configured: usize,
    pub connected: usize,
}
