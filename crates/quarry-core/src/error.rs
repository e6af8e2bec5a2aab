//! Validation error taxonomy shared by every quarry crate.
//!
//! All of these are raised while chaining or compiling, before any network
//! I/O. They are deterministic and caller-fixable, so nothing retries them.

use std::fmt;

/// Where an association reference was seen. Used in join-misuse messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinContext {
    Filter,
    Sort,
    Select,
    Exclude,
    Scope,
}

impl fmt::Display for JoinContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinContext::Filter => "where",
            JoinContext::Sort => "order",
            JoinContext::Select => "select",
            JoinContext::Exclude => "exclude",
            JoinContext::Scope => "scope",
        };
        f.write_str(s)
    }
}

/// How to fix a `pluck`/`ids` request that falls outside the effective selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionHint {
    /// Field is not in the include list. Carries the full list to reselect.
    Reselect(Vec<String>),
    /// Field is listed in `exclude(...)`.
    RemoveExclude(String),
}

impl fmt::Display for SelectionHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionHint::Reselect(fields) => write!(f, "use reselect({})", fields.join(", ")),
            SelectionHint::RemoveExclude(field) => write!(f, "remove exclude({field})"),
        }
    }
}

/// Renders a "did you mean" suffix, empty when there is nothing to suggest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions(pub Vec<String>);

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Suggestions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, "; did you mean {}?", self.0.join(", "))
    }
}

/// Errors raised while describing or compiling a query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    // === Input shape ===
    /// A builder received a malformed argument (blank field, empty list, blank raw).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("template `{template}` has {found} placeholder(s) but {expected} argument(s) were given")]
    PlaceholderMismatch {
        template: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid value for `{field}`: {detail}")]
    InvalidValue { field: String, detail: String },

    // === Unknown references ===
    #[error("unknown field `{field}` on `{collection}`{suggestions}")]
    UnknownField {
        collection: String,
        field: String,
        suggestions: Suggestions,
    },

    #[error("unknown association `{association}` on `{collection}`{suggestions}")]
    UnknownAssociation {
        collection: String,
        association: String,
        suggestions: Suggestions,
    },

    #[error(
        "unknown field `{field}` on `{collection}` (joined through `{association}`){suggestions}"
    )]
    UnknownJoinedField {
        association: String,
        collection: String,
        field: String,
        suggestions: Suggestions,
    },

    #[error("unknown scope `{scope}` on `{collection}`{suggestions}")]
    UnknownScope {
        collection: String,
        scope: String,
        suggestions: Suggestions,
    },

    // === Join misuse ===
    #[error("association `{association}` is missing `{missing}` in its join config")]
    IncompleteJoin {
        association: String,
        missing: &'static str,
    },

    #[error("association `{association}` used in {context} before joins(:{association})")]
    JoinNotApplied {
        association: String,
        context: JoinContext,
    },

    #[error("`{path}` crosses more than one association; only a single join hop is supported")]
    MultiHop { path: String },

    #[error("cannot rewrite scope through `{association}`: {detail}")]
    UnsupportedJoinScope { association: String, detail: String },

    // === Selection conflict ===
    #[error("field `{field}` is outside the effective selection; {hint}")]
    SelectionConflict { field: String, hint: SelectionHint },

    // === Option shape ===
    #[error("invalid {option} option: {detail}")]
    InvalidOption { option: &'static str, detail: String },

    // === Empty/nil predicate ===
    #[error(
        "empty array predicate on `{field}` requires empty filtering on the attribute"
    )]
    EmptyPredicate { field: String },
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn invalid_option(option: &'static str, detail: impl Into<String>) -> Self {
        Error::InvalidOption {
            option,
            detail: detail.into(),
        }
    }
}

/// Result type for query description and compilation.
pub type Result<T> = std::result::Result<T, Error>;
