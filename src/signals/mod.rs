// Unix signal handling for clean run termination
// SIGTERM and SIGINT stop the sampler after the in-flight tick

use anyhow::Result;
use futures::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Broadcasts a stop request to the sampler loop.
/// Subscribers observe the request before the next tick's field queries begin.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    tx: broadcast::Sender<()>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Subscribe to stop notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Request a stop. Safe to call from any task; extra calls are no-ops
    /// for subscribers that already observed one.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Install SIGTERM/SIGINT handlers that trigger this coordinator.
    /// The listener task ends after the first matching signal.
    pub fn listen_for_signals(&self) -> Result<()> {
        let signals = Signals::new([SIGTERM, SIGINT])?;
        let coordinator = self.clone();

        tokio::spawn(async move {
            let mut signals = signals;

            while let Some(signal) = signals.next().await {
                match signal {
                    SIGTERM => {
                        info!("Received SIGTERM - stopping after the current tick");
                        coordinator.trigger();
                        break;
                    }
                    SIGINT => {
                        info!("Received SIGINT (Ctrl+C) - stopping after the current tick");
                        coordinator.trigger();
                        break;
                    }
                    _ => {
                        debug!("Received unexpected signal: {}", signal);
                    }
                }
            }
        });

        Ok(())
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_reaches_subscriber() {
        let coordinator = ShutdownCoordinator::new();
        let mut rx = coordinator.subscribe();

        coordinator.trigger();

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_subscribers_after_trigger_see_nothing() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.trigger();

        // A receiver created later starts with an empty queue
        let mut rx = coordinator.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
