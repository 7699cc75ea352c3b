use sea_orm::DbErr;
use tower_sessions::{session, session_store};

/// Errors surfaced by the building blocks of this crate.
///
/// The gate and the plan resolver never hand these to page code; they are
/// logged and collapsed at those boundaries. They do reach callers of the
/// lower-level pieces (identity providers, stores, configuration).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("session store error: {0}")]
    SessionStore(#[from] session_store::Error),

    #[error("session error: {0}")]
    Session(#[from] session::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
