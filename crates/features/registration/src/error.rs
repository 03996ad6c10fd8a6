use polar_database::DatabaseError;
use std::borrow::Cow;

/// A specialized [`RegistrationError`] enum of this crate.
#[polar_derive::polar_error]
pub enum RegistrationError {
    /// No student or offering matches the key.
    #[kind(NotFound)]
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Unparseable requirement expression, selection or stored field.
    #[kind(Malformed)]
    #[error("Malformed input{}: {message}", format_context(.context))]
    Malformed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A prerequisite failed or a commit could not place every selection.
    #[kind(Conflict)]
    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A store call failed without a database error behind it.
    #[kind(Unavailable)]
    #[error("Store unavailable{}: {message}", format_context(.context))]
    StoreUnavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A `SurrealDB` call failed or timed out.
    #[kind(Unavailable)]
    #[error("Store unavailable{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Internal registration error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl RegistrationError {
    pub(crate) fn not_found(what: &'static str, key: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: key.into(), context: Some(what.into()) }
    }

    pub(crate) fn malformed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Malformed { message: message.into(), context: None }
    }
}
