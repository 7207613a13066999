//! Error types for the embedding widgets.
//!
//! Everything here is `Clone` because a single snippet fetch result is
//! shared between every embed waiting on the same key.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for embed operations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum EmbedError {
    /// The host page has no element with the requested id.
    #[error("no element with id `{0}` on this page")]
    #[diagnostic(
        code(sitembed::missing_container),
        help("the container must exist before the embed is called")
    )]
    MissingContainer(String),

    /// A DOM call threw.
    #[error("dom error: {0}")]
    #[diagnostic(code(sitembed::dom))]
    Dom(String),

    /// The remote answered with a non-success status.
    #[error("{status} {status_text}")]
    #[diagnostic(code(sitembed::http_status))]
    Status { status: u16, status_text: String },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    #[diagnostic(code(sitembed::transport))]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    #[diagnostic(code(sitembed::decode))]
    Decode(String),

    /// Writing rendered HTML failed.
    #[error("render error: {0}")]
    #[diagnostic(code(sitembed::render))]
    Render(String),

    #[error("configuration error: {0}")]
    #[diagnostic(code(sitembed::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidLineRanges(#[from] LineRangeError),

    /// The snippet script tag fired `error`.
    #[error("failed to load snippet script from {0}")]
    #[diagnostic(code(sitembed::snippet::script_load))]
    ScriptLoad(String),

    /// The snippet callback did not fire in time.
    #[error("snippet did not respond within {0} ms")]
    #[diagnostic(code(sitembed::snippet::timeout))]
    Timeout(u32),
}

impl From<std::fmt::Error> for EmbedError {
    fn from(err: std::fmt::Error) -> Self {
        EmbedError::Render(err.to_string())
    }
}

impl From<url::ParseError> for EmbedError {
    fn from(err: url::ParseError) -> Self {
        EmbedError::Config(format!("invalid url: {err}"))
    }
}

/// Rejections for line-range requests.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum LineRangeError {
    #[error("line range {start}..{end} is empty or reversed")]
    #[diagnostic(code(sitembed::lines::empty))]
    Empty { start: usize, end: usize },

    #[error("line range starting at {start} overlaps or precedes the previous range ending at {previous_end}")]
    #[diagnostic(
        code(sitembed::lines::unordered),
        help("ranges must be sorted and must not overlap")
    )]
    Unordered { start: usize, previous_end: usize },

    #[error("open-ended line range starting at {start} must be the last range")]
    #[diagnostic(code(sitembed::lines::open_not_last))]
    OpenNotLast { start: usize },

    #[error("line range ends at {end} but the snippet has {rows} lines")]
    #[diagnostic(code(sitembed::lines::out_of_bounds))]
    OutOfBounds { end: usize, rows: usize },

    #[error("line range must be [start] or [start, end], got {0} values")]
    #[diagnostic(code(sitembed::lines::arity))]
    Arity(usize),
}

pub type Result<T, E = EmbedError> = std::result::Result<T, E>;
