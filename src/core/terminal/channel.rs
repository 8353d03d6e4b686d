use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// One-command mailbox between whoever types and the poller.
///
/// Depth is exactly one. Submitting before the previous command was drained
/// replaces it; nothing is queued.
#[derive(Debug, Clone, Default)]
pub struct CommandSlot {
    pending: Arc<Mutex<Option<String>>>,
}

impl CommandSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `command` as the pending one. Never blocks on the poller, never fails.
    pub fn submit(&self, command: impl Into<String>) {
        let command = command.into();
        if let Some(previous) = self.lock().replace(command) {
            debug!("Unsent command {:?} replaced", previous);
        }
    }

    /// Drain the slot
    pub fn take(&self) -> Option<String> {
        self.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    /// Submit-only handle for the input side
    pub fn sender(&self) -> CommandSender {
        CommandSender { slot: self.clone() }
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        // A panic while holding the guard cannot leave a torn Option behind
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle that can only submit
#[derive(Debug, Clone)]
pub struct CommandSender {
    slot: CommandSlot,
}

impl CommandSender {
    pub fn submit(&self, command: impl Into<String>) {
        self.slot.submit(command);
    }
}
