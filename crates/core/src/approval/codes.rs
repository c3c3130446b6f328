//! Human-readable approval request codes.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::ApprovalModule;

/// Builds a request code such as `APP-PUR-20261019143000-7f3a`.
///
/// The suffix comes from the request id, so two requests created in the same
/// second still get distinct codes.
#[must_use]
pub fn request_code(module: ApprovalModule, created_at: DateTime<Utc>, request_id: Uuid) -> String {
    let hex = request_id.simple().to_string();
    format!(
        "APP-{}-{}-{}",
        module.code_segment(),
        created_at.format("%Y%m%d%H%M%S"),
        &hex[hex.len() - 4..]
    )
}
