// ── Device identity ──
//
// A stable identifier for this installation, used in every backend call.
// Resolution never fails: when nothing can be read or persisted, a
// timestamp-derived identifier is used for this session only.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::IdentityConfig;

/// Non-empty device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a raw identifier. Returns `None` for blank input.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Where a resolved identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// Explicitly configured.
    Configured,
    /// Platform-native identifier file.
    Platform,
    /// Read back from the identity store.
    Persisted,
    /// Freshly generated and written to the identity store.
    Generated,
    /// Session-only fallback; nothing could be persisted.
    Fallback,
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configured => "configured",
            Self::Platform => "platform",
            Self::Persisted => "persisted",
            Self::Generated => "generated",
            Self::Fallback => "session fallback",
        })
    }
}

/// Result of identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub id: DeviceId,
    pub source: IdentitySource,
}

/// Resolves the device identity from the configured sources.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    config: IdentityConfig,
}

impl IdentityProvider {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }

    /// Resolve the identity: configured → platform → persisted/generated →
    /// session fallback.
    pub fn resolve(&self) -> ResolvedIdentity {
        if let Some(id) = self.config.device_id.as_deref().and_then(DeviceId::new) {
            return ResolvedIdentity {
                id,
                source: IdentitySource::Configured,
            };
        }

        if let Some(path) = &self.config.platform_id_path {
            match read_id_file(path) {
                Ok(Some(id)) => {
                    return ResolvedIdentity {
                        id,
                        source: IdentitySource::Platform,
                    };
                }
                Ok(None) => debug!(path = %path.display(), "platform identifier unavailable"),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "platform identifier unreadable");
                }
            }
        }

        if let Some(path) = &self.config.store_path {
            match load_or_create(path) {
                Ok(resolved) => return resolved,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot persist device identity");
                }
            }
        }

        ResolvedIdentity {
            id: fallback_id(),
            source: IdentitySource::Fallback,
        }
    }
}

/// Read a trimmed identifier file. Missing or blank files yield `Ok(None)`.
fn read_id_file(path: &Path) -> io::Result<Option<DeviceId>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(DeviceId::new(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn load_or_create(path: &Path) -> io::Result<ResolvedIdentity> {
    if let Some(id) = read_id_file(path)? {
        return Ok(ResolvedIdentity {
            id,
            source: IdentitySource::Persisted,
        });
    }

    let generated = Uuid::new_v4().hyphenated().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{generated}\n"))?;
    debug!(path = %path.display(), "generated new device identity");

    Ok(ResolvedIdentity {
        id: DeviceId(generated),
        source: IdentitySource::Generated,
    })
}

fn fallback_id() -> DeviceId {
    DeviceId(format!("unknown_device_{}", Utc::now().timestamp_millis()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;

    fn config(dir: &Path) -> IdentityConfig {
        IdentityConfig {
            device_id: None,
            platform_id_path: Some(dir.join("machine-id")),
            store_path: Some(dir.join("state").join("device_id")),
        }
    }

    #[test]
    fn configured_id_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("machine-id"), "abc\n").expect("write");
        let mut cfg = config(dir.path());
        cfg.device_id = Some("  lobby-tv  ".into());

        let resolved = IdentityProvider::new(cfg).resolve();

        assert_eq!(resolved.id.as_str(), "lobby-tv");
        assert_eq!(resolved.source, IdentitySource::Configured);
    }

    #[test]
    fn platform_id_is_trimmed() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("machine-id"), "0123abcd\n").expect("write");

        let resolved = IdentityProvider::new(config(dir.path())).resolve();

        assert_eq!(resolved.id.as_str(), "0123abcd");
        assert_eq!(resolved.source, IdentitySource::Platform);
    }

    #[test]
    fn generated_id_is_persisted_and_reused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = IdentityProvider::new(config(dir.path()));

        let first = provider.resolve();
        let second = provider.resolve();

        assert_eq!(first.source, IdentitySource::Generated);
        assert_eq!(second.source, IdentitySource::Persisted);
        assert_eq!(first.id, second.id);

        let parsed = Uuid::parse_str(first.id.as_str()).expect("uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn unwritable_store_falls_back_to_session_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A regular file where the store's parent directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").expect("write");
        let cfg = IdentityConfig {
            device_id: None,
            platform_id_path: None,
            store_path: Some(PathBuf::from(&blocker).join("device_id")),
        };

        let resolved = IdentityProvider::new(cfg).resolve();

        assert_eq!(resolved.source, IdentitySource::Fallback);
        assert!(resolved.id.as_str().starts_with("unknown_device_"));
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(DeviceId::new(" \n").is_none());
    }
}
