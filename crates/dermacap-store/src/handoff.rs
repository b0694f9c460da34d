//! Saved-path handoff
//!
//! The capture screen and the screen that consumes the saved image are
//! decoupled by a capacity-1 channel: one registered receiver, at most one
//! in-flight notification, delivered only after the file is durably written.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::warn;

/// Delivered once per successful save: the absolute path of the saved image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePathEvent {
    pub path: PathBuf,
}

/// Sending half of the handoff.
#[derive(Clone)]
pub struct HandoffSender {
    tx: mpsc::Sender<ImagePathEvent>,
}

/// Receiving half of the handoff, owned by the consuming screen.
pub type HandoffReceiver = mpsc::Receiver<ImagePathEvent>;

/// Create the handoff pair. Capacity is one: a notification that has not
/// been consumed yet causes the next one to be dropped rather than queued.
pub fn handoff_channel() -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (HandoffSender { tx }, rx)
}

impl HandoffSender {
    /// Deliver a saved path to the receiver. Returns `false` when the
    /// receiver is gone or still has an unconsumed notification.
    pub fn notify(&self, path: &Path) -> bool {
        let event = ImagePathEvent {
            path: path.to_path_buf(),
        };
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                warn!("Image path handoff not delivered: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_delivers_path() {
        let (tx, mut rx) = handoff_channel();
        assert!(tx.notify(Path::new("/tmp/study_x/skinimage_1_a.png")));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.path, PathBuf::from("/tmp/study_x/skinimage_1_a.png"));
    }

    #[test]
    fn test_at_most_one_in_flight() {
        let (tx, mut rx) = handoff_channel();
        assert!(tx.notify(Path::new("/a.png")));
        // Receiver has not consumed yet; the second notification is dropped.
        assert!(!tx.notify(Path::new("/b.png")));

        assert_eq!(rx.try_recv().unwrap().path, PathBuf::from("/a.png"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_notify_after_receiver_dropped() {
        let (tx, rx) = handoff_channel();
        drop(rx);
        assert!(!tx.notify(Path::new("/a.png")));
    }
}
