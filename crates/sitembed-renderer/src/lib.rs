//! Sitembed renderer
//!
//! Target-independent half of the embeds: the records the remote APIs send
//! back, the HTML the comment embed writes, and the policy deciding which
//! snippet lines survive trimming. Nothing in here touches the DOM.

pub mod comments;
pub mod snippet;

pub use comments::{
    CommentAuthor, CommentRecord, Localize, UtcTimestamp, render_comments, render_failure,
};
pub use snippet::{LineRange, LineRanges, SnippetKey, SnippetResponse};
