use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

use crate::models::is_classifiable;

/// Emitted once per quiet period with the text as it stood at expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceFire {
    /// Generation of the text change that armed the timer. Consumers compare it
    /// with [`Debouncer::is_current`] to drop fires overtaken in the channel.
    pub generation: u64,
    pub text: String,
}

struct DebounceInner {
    text: String,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Restartable quiet-period timer. There is at most one armed timer at any
/// time; every text change aborts it and, for long enough text, arms a new one.
///
/// Arming spawns onto the current tokio runtime.
pub struct Debouncer {
    quiet_period: Duration,
    inner: Arc<Mutex<DebounceInner>>,
    fire_tx: mpsc::UnboundedSender<DebounceFire>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> (Self, mpsc::UnboundedReceiver<DebounceFire>) {
        let (fire_tx, fire_rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            quiet_period,
            inner: Arc::new(Mutex::new(DebounceInner {
                text: String::new(),
                generation: 0,
                timer: None,
            })),
            fire_tx,
        };
        (debouncer, fire_rx)
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Records `text` and restarts the timer. Returns whether a timer is now armed.
    pub fn on_text_change(&self, text: &str) -> bool {
        let mut inner = self.lock();
        inner.text = text.to_string();
        inner.generation += 1;
        if let Some(handle) = inner.timer.take() {
            handle.abort();
        }

        if !is_classifiable(text) {
            return false;
        }

        let generation = inner.generation;
        let shared = Arc::clone(&self.inner);
        let fire_tx = self.fire_tx.clone();
        let quiet_period = self.quiet_period;

        inner.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;

            let fire = {
                let mut inner = shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                if inner.generation != generation {
                    return;
                }
                inner.timer = None;
                DebounceFire {
                    generation,
                    text: inner.text.clone(),
                }
            };

            let _ = fire_tx.send(fire);
        }));
        true
    }

    /// Disarms the timer without emitting. The recorded text is kept.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        if let Some(handle) = inner.timer.take() {
            handle.abort();
        }
    }

    pub fn clear(&self) {
        self.cancel();
        self.lock().text.clear();
    }

    pub fn is_armed(&self) -> bool {
        self.lock().timer.is_some()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    pub fn latest_text(&self) -> String {
        self.lock().text.clone()
    }

    fn lock(&self) -> MutexGuard<'_, DebounceInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().timer.take() {
            handle.abort();
        }
    }
}
