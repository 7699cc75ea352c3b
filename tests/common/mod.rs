#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lucra_gate::{
    Error, Identity, IdentityProvider, Navigator, StoreError, Subscription, SubscriptionStore,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::DbErr;
use tokio::sync::Notify;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

pub fn ts(s: &str) -> DateTimeWithTimeZone {
    s.parse().unwrap()
}

pub fn pro_record(user_id: &str) -> Subscription {
    Subscription {
        id: "sub_123".to_string(),
        user_id: user_id.to_string(),
        plan_name: "Pro".to_string(),
        status: "active".to_string(),
        start_date: ts("2025-02-01T00:00:00+00:00"),
        end_date: Some(ts("2025-03-01T00:00:00+00:00")),
        created_at: ts("2025-02-01T00:00:05+00:00"),
    }
}

/// Identity provider whose answer can be changed and delayed.
#[derive(Default)]
pub struct FakeIdentity {
    user: Mutex<Option<Identity>>,
    broken: Mutex<bool>,
    gate: Option<Arc<Notify>>,
    pub calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn signed_in(id: &str) -> Self {
        let fake = Self::default();
        fake.set(Some(Identity::new(id)));
        fake
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        let fake = Self::default();
        *fake.broken.lock().unwrap() = true;
        fake
    }

    /// Answers only after `release` is notified.
    pub fn held(mut self, release: Arc<Notify>) -> Self {
        self.gate = Some(release);
        self
    }

    pub fn set(&self, user: Option<Identity>) {
        *self.user.lock().unwrap() = user;
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn current_identity(&self) -> Result<Option<Identity>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(release) = &self.gate {
            release.notified().await;
        }
        if *self.broken.lock().unwrap() {
            return Err(Error::Database(DbErr::Custom("identity service down".into())));
        }
        Ok(self.user.lock().unwrap().clone())
    }
}

pub enum Reply {
    Record(Subscription),
    Empty,
    NoRows,
    Failure,
}

/// Subscription store replaying a fixed reply.
pub struct FakeStore {
    reply: Reply,
    pub calls: AtomicUsize,
}

impl FakeStore {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionStore for FakeStore {
    async fn latest_active(&self, _user_id: &str) -> Result<Option<Subscription>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Record(record) => Ok(Some(record.clone())),
            Reply::Empty => Ok(None),
            Reply::NoRows => Err(StoreError::NoRows),
            Reply::Failure => Err(StoreError::Backend("permission denied".into())),
        }
    }
}

#[derive(Default)]
pub struct RecordingNavigator(Mutex<Vec<String>>);

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.0.lock().unwrap().push(path.to_string());
    }
}

/// Counts ERROR-level events.
pub struct ErrorCounter(pub Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
