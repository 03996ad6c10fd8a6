use std::borrow::Cow;

/// Errors raised while connecting to, migrating or querying `SurrealDB`.
#[polar_derive::polar_error]
pub enum DatabaseError {
    /// Builder parameters are missing or inconsistent.
    #[kind(Malformed)]
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Engine start-up or health checks failed.
    #[kind(Unavailable)]
    #[error("Database connection failed{}: {message}", format_context(.context))]
    Connection { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Root credentials were rejected.
    #[kind(Unavailable)]
    #[error("Authentication failed{}: {message}", format_context(.context))]
    Auth { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A bounded call did not finish within the configured timeout.
    #[kind(Unavailable)]
    #[error("Database call timed out{}: {message}", format_context(.context))]
    Timeout { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[kind(Unavailable)]
    #[error("SurrealDB error{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    /// A recorded migration no longer matches its script.
    #[error("Migration error{}: {message}", format_context(.context))]
    Migration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal database error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl DatabaseError {
    /// Whether the engine rolled the call back because a concurrent transaction wrote the
    /// same record first. Such a call left nothing behind.
    #[must_use]
    pub fn is_transaction_conflict(&self) -> bool {
        match self {
            Self::Surreal { source, .. } => {
                let message = source.to_string();
                message.contains("Transaction conflict") || message.contains("retry the transaction")
            },
            _ => false,
        }
    }
}
