// Wire types for the signage backend.
//
// The backend is lenient about nulls (`"videos": null`, `"is_paused": null`),
// so every collection/flag field decodes null or absence as its default.

use serde::{Deserialize, Deserializer, Serialize};

/// Content assignment currently active for a device.
///
/// `GET /api/v1/branch?device_id=<id>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(deserialize_with = "id_string")]
    pub branch_id: String,
    /// Carried verbatim; never parsed.
    #[serde(default)]
    pub branch_updated_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub videos: Vec<VideoItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_paused: bool,
}

/// One playlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Absolute or base-relative media location.
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_url: String,
    /// Duration in seconds, informational only.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Carried verbatim; part of the change-detection identity.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl VideoItem {
    /// Change-detection identity: `(id, updated_at)`.
    pub fn key(&self) -> VideoKey {
        VideoKey {
            id: self.id.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// `(id, updated_at)` pair identifying a specific revision of a video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoKey {
    pub id: String,
    pub updated_at: Option<String>,
}

/// Entry of the branch picker list.
///
/// `GET /api/v1/branches/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSummary {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
}

impl BranchSummary {
    /// Display name: the trimmed name, or `Branch <id>` when blank.
    pub fn label(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("Branch {}", self.id),
        }
    }

    /// Trimmed description, `None` when blank.
    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Optional local media cache figures reported with each heartbeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size_bytes: u64,
    pub video_count: u32,
}

/// `POST /api/v1/heartbeat` body.
#[derive(Debug, Serialize)]
pub(crate) struct HeartbeatRequest<'a> {
    pub device_id: &'a str,
    /// Always present; empty when nothing is playing.
    pub current_video_id: &'a str,
    /// Whole seconds since startup.
    pub uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_video_count: Option<u32>,
}

/// `PUT /api/v1/devices/<id>/` body.
#[derive(Debug, Serialize)]
pub(crate) struct AssignBranchRequest<'a> {
    pub branch_id: &'a str,
}

// ── Lenient field decoders ──────────────────────────────────────────

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifiers are strings on the wire, but tolerate bare integers.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
