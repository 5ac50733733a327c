use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub app: String,
    pub uptime_seconds: u64,
    /// Names of the registered capabilities, in registration order.
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub uptime_seconds: u64,
    pub capabilities: usize,
}

// ---------------------------------------------------------------------------
// Docs index
// ---------------------------------------------------------------------------

/// One row of the HTML docs index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySummary {
    pub name: String,
    pub summary: Option<String>,
    pub inputs: Vec<String>,
}
