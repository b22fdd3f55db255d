use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use url::Url;

use crate::appconfig::server_endpoint;

/// The sample currently shown by the host.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActiveSample {
    /// `sample._id` on the server
    pub id: String,
    pub filepath: String,
}

impl ActiveSample {
    pub fn new(id: impl Into<String>, filepath: impl Into<String>) -> Self {
        ActiveSample {
            id: id.into(),
            filepath: filepath.into(),
        }
    }

    pub fn media_url(&self, server_url: &str) -> Result<Url> {
        media_url(server_url, &self.filepath)
    }
}

/// `<server>/media?filepath=<encoded path>`
pub fn media_url(server_url: &str, filepath: &str) -> Result<Url> {
    let mut url = server_endpoint(server_url, "media")?;

    url.query_pairs_mut().append_pair("filepath", filepath);

    Ok(url)
}
