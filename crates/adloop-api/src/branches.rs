// Branch endpoints
//
// Assigned-branch lookup (polled by the controller) and the full branch
// listing used by the assignment picker.

use reqwest::StatusCode;
use tracing::debug;

use crate::client::SignageClient;
use crate::error::Error;
use crate::models::{Branch, BranchSummary};

impl SignageClient {
    /// Fetch the branch currently assigned to `device_id`.
    ///
    /// `GET /api/v1/branch?device_id=<id>`
    ///
    /// Returns `Ok(None)` when the device has no assignment yet, which the
    /// backend expresses either as HTTP 404 or as a `null`/empty body.
    pub async fn fetch_assigned_branch(&self, device_id: &str) -> Result<Option<Branch>, Error> {
        let mut url = self.api_url(&["branch"], false)?;
        url.query_pairs_mut().append_pair("device_id", device_id);

        let resp = self.get(url).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!(device_id, "no branch assigned (404)");
            return Ok(None);
        }

        let resp = Self::ensure_success("Branch request", resp).await?;
        let body = resp.text().await?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            debug!(device_id, "no branch assigned (empty body)");
            return Ok(None);
        }

        Self::decode(trimmed).map(Some)
    }

    /// List every branch known to the backend, active or not.
    ///
    /// `GET /api/v1/branches/`
    ///
    /// Filtering to active branches is the caller's job.
    pub async fn list_branches(&self) -> Result<Vec<BranchSummary>, Error> {
        let url = self.api_url(&["branches"], true)?;
        let resp = self.get(url).await?;
        let resp = Self::ensure_success("Branches request", resp).await?;
        let body = resp.text().await?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Vec::new());
        }
        Self::decode(trimmed)
    }
}
