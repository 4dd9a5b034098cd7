// Signage backend HTTP client
//
// Wraps `reqwest::Client` with base-address handling, `/api/v1/` URL
// construction and status mapping. Endpoints are implemented as inherent
// methods in `branches.rs` and `devices.rs` to keep this module focused on
// transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::media_url::MediaUrlResolver;
use crate::transport::TransportConfig;

/// Path prefix shared by every backend endpoint.
const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Raw HTTP client for the signage backend.
///
/// The base address is optional: a client without one can still be built
/// (so configuration problems surface per operation, not at startup), but
/// every remote call rejects with [`Error::MissingBaseUrl`].
#[derive(Debug, Clone)]
pub struct SignageClient {
    http: reqwest::Client,
    base_url: Option<Url>,
    media: MediaUrlResolver,
}

impl SignageClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(base_url: Option<Url>, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Option<Url>) -> Self {
        let media = MediaUrlResolver::new(base_url.clone());
        Self {
            http,
            base_url,
            media,
        }
    }

    /// The configured backend base URL, if any.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Resolver for playlist media URLs against this client's base address.
    pub fn media_resolver(&self) -> &MediaUrlResolver {
        &self.media
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/v1/{segments...}`, optionally with a trailing slash.
    ///
    /// Segments are percent-encoded individually, so device ids containing
    /// `/` or spaces cannot escape their path position.
    pub(crate) fn api_url(&self, segments: &[&str], trailing_slash: bool) -> Result<Url, Error> {
        let mut url = self.base_url.clone().ok_or(Error::MissingBaseUrl)?;
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            path.pop_if_empty();
            path.extend(API_PREFIX);
            path.extend(segments);
            if trailing_slash {
                path.push("");
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request, returning the raw response.
    pub(crate) async fn get(&self, url: Url) -> Result<reqwest::Response, Error> {
        debug!("GET {url}");
        Ok(self.http.get(url).send().await?)
    }

    /// Send a PUT request with a JSON body.
    pub(crate) async fn put(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<reqwest::Response, Error> {
        debug!("PUT {url}");
        Ok(self.http.put(url).json(body).send().await?)
    }

    /// Send a POST request with a JSON body.
    pub(crate) async fn post(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<reqwest::Response, Error> {
        debug!("POST {url}");
        Ok(self.http.post(url).json(body).send().await?)
    }

    /// Fail with [`Error::Status`] unless the response is a 2xx.
    pub(crate) async fn ensure_success(
        operation: &'static str,
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Status {
            operation,
            status: status.as_u16(),
            body: preview(&body).to_owned(),
        })
    }

    /// Decode a JSON body, keeping a preview of the payload on failure.
    pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
        serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(body)),
            body: body.to_owned(),
        })
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
