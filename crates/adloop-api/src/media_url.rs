// Media URL resolution
//
// Playlist entries may carry absolute URLs or paths relative to the backend
// base address. Resolution never fails loudly: `None` means "unresolvable"
// and the player treats it like a playback error for that item.

use url::Url;

/// Resolves playlist `file_url` values against the backend base address.
#[derive(Debug, Clone, Default)]
pub struct MediaUrlResolver {
    base: Option<Url>,
}

impl MediaUrlResolver {
    pub fn new(base: Option<Url>) -> Self {
        Self { base }
    }

    /// Resolve `file_url`.
    ///
    /// Scheme-qualified URLs are returned unchanged. Anything else is joined
    /// onto `<base>/` with RFC 3986 rules (so `/media/a.mp4` is
    /// origin-relative and `media/a.mp4` is base-relative), falling back to
    /// plain concatenation when the join cannot be performed.
    pub fn resolve(&self, file_url: &str) -> Option<Url> {
        let file_url = file_url.trim();
        if file_url.is_empty() {
            return None;
        }

        if let Ok(absolute) = Url::parse(file_url) {
            if !absolute.cannot_be_a_base() {
                return Some(absolute);
            }
        }

        let base = self.base.as_ref()?;
        let base = base.as_str().trim_end_matches('/');

        Url::parse(&format!("{base}/"))
            .and_then(|dir| dir.join(file_url))
            .or_else(|_| {
                let sep = if file_url.starts_with('/') { "" } else { "/" };
                Url::parse(&format!("{base}{sep}{file_url}"))
            })
            .ok()
    }
}
