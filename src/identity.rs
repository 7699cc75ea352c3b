//! The remote identity provider seam.
//!
//! Page-facing code only ever asks one question of it: who is the current
//! visitor, if anyone.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::session::Id;
use tower_sessions::{Session, SessionStore};

use crate::error::Result;
use crate::session_store::SeaOrmSessionStore;

/// Session-record key holding the signed-in user's ID.
pub const USER_ID_KEY: &str = "user_id";

/// An authenticated visitor. Opaque beyond its ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Answers "who is the current visitor".
///
/// `Ok(None)` means nobody is signed in. Errors are reported as-is; callers
/// such as [`SessionProvider`](crate::SessionProvider) and
/// [`PlanResolver`](crate::PlanResolver) treat them as "no identity".
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity(&self) -> Result<Option<Identity>>;
}

/// Reads the identity out of a persisted session.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    store: SeaOrmSessionStore,
    session_id: Id,
}

impl SessionIdentity {
    pub fn new(store: SeaOrmSessionStore, session_id: Id) -> Self {
        Self { store, session_id }
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentity {
    async fn current_identity(&self) -> Result<Option<Identity>> {
        let record = self.store.load(&self.session_id).await?;
        Ok(record.and_then(|record| identity_from(&record.data)))
    }
}

/// A request-scoped session (e.g. the axum extractor) is itself a provider.
#[async_trait]
impl IdentityProvider for Session {
    async fn current_identity(&self) -> Result<Option<Identity>> {
        let user_id: Option<Value> = self.get(USER_ID_KEY).await?;
        Ok(user_id.as_ref().and_then(identity_from_value))
    }
}

/// Records `identity` as the signed-in user, issuing a fresh session ID.
pub async fn sign_in(session: &Session, identity: &Identity) -> Result<()> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, &identity.id).await?;
    Ok(())
}

/// Forgets the signed-in user along with the rest of the session.
pub async fn sign_out(session: &Session) -> Result<()> {
    session.flush().await?;
    Ok(())
}

fn identity_from(data: &HashMap<String, Value>) -> Option<Identity> {
    data.get(USER_ID_KEY).and_then(identity_from_value)
}

fn identity_from_value(value: &Value) -> Option<Identity> {
    match value {
        Value::String(id) if !id.is_empty() => Some(Identity::new(id.clone())),
        Value::Number(id) => Some(Identity::new(id.to_string())),
        _ => None,
    }
}
