//! DTO for the domain listing endpoint.

use serde::Serialize;

/// Public base URLs short links can be served from.
#[derive(Debug, Serialize)]
pub struct DomainsResponse {
    pub domains: Vec<String>,
}
