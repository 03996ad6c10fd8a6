use serde::Serialize;
use std::fmt;

/// Caller-facing classification shared by every error enum in the workspace.
///
/// Generated `kind()` methods (see `polar_derive::polar_error`) return one of these, and the
/// HTTP layer maps it onto a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A backing store call failed or timed out. Fatal for the current request.
    Unavailable,
    /// No student or offering matches the supplied key.
    NotFound,
    /// A prerequisite clause evaluated false or a seat was unavailable.
    Conflict,
    /// Unparseable requirement expression, selection payload or stored document.
    Malformed,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Malformed => "malformed",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
