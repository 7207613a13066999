//! Issue-comment records and their article markup.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use markdown_weaver_escape::{FmtWriter, escape_href, escape_html};
use serde::{Deserialize, Serialize};
use sitembed_common::{EmbedConfig, EmbedError};

/// One comment as returned with the `html+json` media type.
///
/// Fields beyond these are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub user: CommentAuthor,
    pub created_at: DateTime<Utc>,
    /// Server-rendered body; inserted without escaping.
    pub body_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub login: String,
    pub html_url: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Turns a comment timestamp into display text.
///
/// The browser binding formats through `Date.prototype.toLocaleString`;
/// [`UtcTimestamp`] is the target-independent fallback.
pub trait Localize {
    fn localize(&self, at: &DateTime<Utc>) -> String;
}

impl<F> Localize for F
where
    F: Fn(&DateTime<Utc>) -> String,
{
    fn localize(&self, at: &DateTime<Utc>) -> String {
        self(at)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UtcTimestamp;

impl Localize for UtcTimestamp {
    fn localize(&self, at: &DateTime<Utc>) -> String {
        at.format("%Y-%m-%d %H:%M UTC").to_string()
    }
}

/// Render every comment as an `<article>`, concatenated in response order.
pub fn render_comments(
    comments: &[CommentRecord],
    config: &EmbedConfig,
    localize: &impl Localize,
) -> Result<String, EmbedError> {
    let mut out = String::new();
    for comment in comments {
        write_comment(&mut out, comment, config, localize)?;
    }
    Ok(out)
}

fn write_comment(
    out: &mut String,
    comment: &CommentRecord,
    config: &EmbedConfig,
    localize: &impl Localize,
) -> std::fmt::Result {
    let user = &comment.user;
    out.push_str(r#"<article><header class="comment-header dim-link">"#);
    write_avatar(out, user, config)?;
    out.push_str(r#"<div class="comment-header-text"><div><a href=""#);
    escape_href(FmtWriter(&mut *out), &user.html_url)?;
    out.push_str(r#"">"#);
    escape_html(FmtWriter(&mut *out), &user.login)?;
    write!(
        out,
        r#"</a></div><div><time datetime="{}">"#,
        comment.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    escape_html(FmtWriter(&mut *out), &localize.localize(&comment.created_at))?;
    out.push_str("</time></div></div></header>");
    out.push_str(&comment.body_html);
    out.push_str("</article>");
    Ok(())
}

fn write_avatar(out: &mut String, user: &CommentAuthor, config: &EmbedConfig) -> std::fmt::Result {
    let src = match &user.avatar_url {
        Some(url) => url.clone(),
        None => match config.avatar_for(&user.login) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!(login = %user.login, "skipping avatar: {e}");
                return Ok(());
            }
        },
    };
    out.push_str(r#"<img class="avatar avatar-small" src=""#);
    escape_href(FmtWriter(&mut *out), &src)?;
    out.push_str(r#"" alt=""#);
    escape_html(FmtWriter(&mut *out), &user.login)?;
    write!(
        out,
        r#"" width="{size}" height="{size}" />"#,
        size = config.avatar_size
    )
}

/// The single line shown in place of comments when the fetch failed.
pub fn render_failure(err: &EmbedError) -> Result<String, EmbedError> {
    let mut out = String::from("<p>");
    escape_html(FmtWriter(&mut out), &err.to_string())?;
    out.push_str("</p>");
    Ok(out)
}
