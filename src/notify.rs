//! Occupancy change notification.

use std::sync::mpsc::Sender;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use crate::model::ZoneId;

/// Receives the debounced occupied-zone set whenever it changes.
///
/// Called from the run thread. Errors are logged by the caller and do not stop the run.
pub trait ChangeNotifier: Send + Sync {
    fn notify_occupied_zones(&self, zones: &[ZoneId]) -> Result<()>;
}

/// Writes every change to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl ChangeNotifier for LogNotifier {
    fn notify_occupied_zones(&self, zones: &[ZoneId]) -> Result<()> {
        log::info!("occupied zones changed: {:?}", zones);
        Ok(())
    }
}

/// Forwards every change into an `mpsc` channel.
pub struct ChannelNotifier {
    tx: Mutex<Sender<Vec<ZoneId>>>,
}

impl ChannelNotifier {
    pub fn new(tx: Sender<Vec<ZoneId>>) -> Self {
        Self { tx: Mutex::new(tx) }
    }
}

impl ChangeNotifier for ChannelNotifier {
    fn notify_occupied_zones(&self, zones: &[ZoneId]) -> Result<()> {
        let tx = self
            .tx
            .lock()
            .map_err(|_| anyhow!("notifier lock poisoned"))?;
        tx.send(zones.to_vec())
            .map_err(|_| anyhow!("notification receiver dropped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn channel_notifier_forwards_sets() {
        let (tx, rx) = mpsc::channel();
        let notifier = ChannelNotifier::new(tx);
        notifier.notify_occupied_zones(&[3, 1]).unwrap();
        notifier.notify_occupied_zones(&[]).unwrap();
        assert_eq!(rx.recv().unwrap(), vec![3, 1]);
        assert_eq!(rx.recv().unwrap(), Vec::<ZoneId>::new());
    }

    #[test]
    fn dropped_receiver_is_an_error() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let notifier = ChannelNotifier::new(tx);
        assert!(notifier.notify_occupied_zones(&[1]).is_err());
        assert!(LogNotifier.notify_occupied_zones(&[1]).is_ok());
    }
}
