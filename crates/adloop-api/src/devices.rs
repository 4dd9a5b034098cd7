// Device endpoints
//
// Branch assignment and liveness reporting.

use std::time::Duration;

use tracing::debug;

use crate::client::SignageClient;
use crate::error::Error;
use crate::models::{AssignBranchRequest, CacheStats, HeartbeatRequest};

impl SignageClient {
    /// Bind `device_id` to `branch_id`.
    ///
    /// `PUT /api/v1/devices/<device_id>/` with `{"branch_id": "..."}`
    ///
    /// Re-assigning the current branch is a server-side no-op; it is not
    /// special-cased here.
    pub async fn assign_branch(&self, device_id: &str, branch_id: &str) -> Result<(), Error> {
        let url = self.api_url(&["devices", device_id], true)?;
        debug!(device_id, branch_id, "assigning branch");
        let resp = self.put(url, &AssignBranchRequest { branch_id }).await?;
        Self::ensure_success("Update device", resp).await?;
        Ok(())
    }

    /// Report liveness.
    ///
    /// `POST /api/v1/heartbeat`
    ///
    /// `uptime` is floored to whole seconds. An empty `current_video_id` is
    /// sent as `""`, never omitted.
    pub async fn send_heartbeat(
        &self,
        device_id: &str,
        current_video_id: &str,
        uptime: Duration,
        cache: Option<CacheStats>,
    ) -> Result<(), Error> {
        let url = self.api_url(&["heartbeat"], false)?;
        let body = HeartbeatRequest {
            device_id,
            current_video_id,
            uptime: uptime.as_secs(),
            cache_size_bytes: cache.map(|c| c.size_bytes),
            cached_video_count: cache.map(|c| c.video_count),
        };
        let resp = self.post(url, &body).await?;
        Self::ensure_success("Heartbeat", resp).await?;
        Ok(())
    }
}
