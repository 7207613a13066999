use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EmbedError, Result};

pub const DEFAULT_SPINNER_SRC: &str =
    "https://assets-cdn.github.com/images/spinners/octocat-spinner-32.gif";

/// Site-level settings for the embeds.
///
/// Every field has a default, so the page only needs to pass what differs.
/// Keys are camelCase on the JS side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedConfig {
    /// Base URL of the issue tracker API.
    pub api_url: String,
    /// `owner/name` of the repository whose issues hold the comments.
    pub repository: Option<String>,
    /// Base URL of the snippet host.
    pub gist_url: String,
    /// Fallback avatar host, used when a comment carries no avatar URL.
    pub avatar_url: String,
    pub avatar_size: u32,
    pub spinner_src: String,
    /// Element id the comment embed renders into.
    pub comment_container_id: String,
    pub snippet_timeout_ms: u32,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_owned(),
            repository: None,
            gist_url: "https://gist.github.com".to_owned(),
            avatar_url: "https://avatars.githubusercontent.com".to_owned(),
            avatar_size: 40,
            spinner_src: DEFAULT_SPINNER_SRC.to_owned(),
            comment_container_id: "comment-section".to_owned(),
            snippet_timeout_ms: 15_000,
        }
    }
}

impl EmbedConfig {
    /// `GET` endpoint for the comments of one issue thread.
    pub fn comments_url(&self, thread_id: &str) -> Result<Url> {
        let repository = self
            .repository
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| EmbedError::Config("no repository configured".into()))?;
        let (owner, name) = repository.split_once('/').ok_or_else(|| {
            EmbedError::Config(format!("repository `{repository}` is not owner/name"))
        })?;

        let mut url = base_url(&self.api_url)?;
        url.path_segments_mut()
            .map_err(|_| EmbedError::Config(format!("`{}` cannot be a base url", self.api_url)))?
            .pop_if_empty()
            .extend(["repos", owner, name, "issues", thread_id, "comments"]);
        Ok(url)
    }

    /// Script source for a snippet, answering through the global `callback`.
    pub fn snippet_url(&self, snippet_id: &str, file: &str, callback: &str) -> Result<Url> {
        let mut url = base_url(&self.gist_url)?;
        url.path_segments_mut()
            .map_err(|_| EmbedError::Config(format!("`{}` cannot be a base url", self.gist_url)))?
            .pop_if_empty()
            .push(&format!("{snippet_id}.json"));
        url.query_pairs_mut()
            .append_pair("callback", callback)
            .append_pair("file", file);
        Ok(url)
    }

    /// Avatar image for `login` when the API did not supply one.
    pub fn avatar_for(&self, login: &str) -> Result<Url> {
        let mut url = base_url(&self.avatar_url)?;
        url.path_segments_mut()
            .map_err(|_| EmbedError::Config(format!("`{}` cannot be a base url", self.avatar_url)))?
            .pop_if_empty()
            .push(login);
        url.query_pairs_mut()
            .append_pair("v", "3")
            .append_pair("s", &self.avatar_size.to_string());
        Ok(url)
    }
}

fn base_url(raw: &str) -> Result<Url> {
    Ok(Url::parse(raw)?)
}
