//! Consumer lifetime tokens.
//!
//! A page holds a [`Mount`] while it is on screen and hands [`Unmounted`]
//! clones to the work it starts. Dropping the mount resolves every
//! `Unmounted::cancelled` future, so late results are discarded instead of
//! being applied to a consumer that is gone.

use tokio::sync::watch;

/// Held by a live consumer. Dropping it (or calling [`Mount::unmount`])
/// cancels everything tied to it.
#[derive(Debug)]
pub struct Mount {
    tx: watch::Sender<bool>,
}

/// Cancellation side of a [`Mount`].
#[derive(Debug, Clone)]
pub struct Unmounted {
    rx: watch::Receiver<bool>,
}

impl Mount {
    /// A live mount and the token its work watches.
    pub fn new() -> (Self, Unmounted) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, Unmounted { rx })
    }

    /// Marks the consumer as gone; same as dropping the mount.
    pub fn unmount(self) {
        self.tx.send_replace(true);
    }
}

impl Unmounted {
    pub fn is_unmounted(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the owning [`Mount`] is gone.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
