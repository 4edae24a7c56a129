//! Connectivity monitoring.
//!
//! The monitor is an injected instance, not a process-wide flag: the
//! host integration owns a [`ConnectivitySource`] and feeds transition
//! events into it; each component that needs the signal holds its own
//! [`ConnectivityMonitor`] clone, and dropping the clone is the
//! unsubscribe.
//!
//! The flag chooses user-facing phrasing after a remote call fails. It
//! never gates whether a call is attempted; connectivity signals are
//! unreliable, and the true signal of failure is the remote call itself
//! rejecting.

use tokio::sync::watch;

/// Host-side publisher of connectivity transitions.
#[derive(Debug)]
pub struct ConnectivitySource {
    tx: watch::Sender<bool>,
}

/// Consumer-side view of the connectivity state.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    rx: watch::Receiver<bool>,
}

impl ConnectivitySource {
    /// Create a source and its first monitor.
    pub fn new(initially_offline: bool) -> (Self, ConnectivityMonitor) {
        let (tx, rx) = watch::channel(initially_offline);
        (Self { tx }, ConnectivityMonitor { rx })
    }

    /// Report a transition. Repeats of the current state are dropped so
    /// waiters only wake on real changes.
    pub fn set_offline(&self, offline: bool) {
        self.tx.send_if_modified(|state| {
            if *state != offline {
                *state = offline;
                true
            } else {
                false
            }
        });
    }

    /// Hand out another monitor for a different component.
    pub fn monitor(&self) -> ConnectivityMonitor {
        ConnectivityMonitor {
            rx: self.tx.subscribe(),
        }
    }
}

impl ConnectivityMonitor {
    /// The currently believed state.
    pub fn is_offline(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the next transition and return the new state, or `None`
    /// once the source is gone.
    pub async fn next_transition(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn reflects_initial_state() {
        let (_source, monitor) = ConnectivitySource::new(true);
        assert!(monitor.is_offline());

        let (_source, monitor) = ConnectivitySource::new(false);
        assert!(!monitor.is_offline());
    }

    #[tokio::test]
    async fn transitions_are_observed() {
        let (source, mut monitor) = ConnectivitySource::new(false);

        source.set_offline(true);
        assert_eq!(monitor.next_transition().await, Some(true));
        assert!(monitor.is_offline());

        source.set_offline(false);
        assert_eq!(monitor.next_transition().await, Some(false));
    }

    #[tokio::test]
    async fn repeated_state_does_not_wake_waiters() {
        let (source, mut monitor) = ConnectivitySource::new(false);

        source.set_offline(false);

        let waited =
            tokio::time::timeout(Duration::from_millis(50), monitor.next_transition()).await;
        assert!(waited.is_err(), "no transition happened, so no wake");
    }

    #[tokio::test]
    async fn clones_observe_independently() {
        let (source, monitor) = ConnectivitySource::new(false);
        let mut a = monitor.clone();
        let mut b = source.monitor();

        source.set_offline(true);

        assert_eq!(a.next_transition().await, Some(true));
        assert_eq!(b.next_transition().await, Some(true));
    }

    #[tokio::test]
    async fn source_drop_ends_transitions() {
        let (source, mut monitor) = ConnectivitySource::new(true);
        drop(source);

        assert_eq!(monitor.next_transition().await, None);
        // The last known state remains readable.
        assert!(monitor.is_offline());
    }
}
