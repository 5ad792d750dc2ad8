//! Decorative trivia polling shown while an analysis is loading.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

use crate::backend::BackendApi;

pub const TRIVIA_PLACEHOLDER: &str = "Loading musicological facts...";
pub const TRIVIA_FALLBACK: &str = "The silence between the notes is music, too.";
pub const LOADING_STEPS: u8 = 4;
pub const DEFAULT_TRIVIA_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriviaUpdate {
    pub text: String,
    /// Progress step in `0..LOADING_STEPS`; advances on each fetched fact.
    pub step: u8,
}

impl Default for TriviaUpdate {
    fn default() -> Self {
        Self {
            text: TRIVIA_PLACEHOLDER.to_string(),
            step: 0,
        }
    }
}

/// Fetches trivia immediately and then on a fixed interval until stopped or
/// dropped. No update is delivered after [`TriviaPoller::stop`].
pub struct TriviaPoller {
    /// Held for the whole delivery, so `stop` waits out a callback in progress.
    active: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl TriviaPoller {
    pub fn spawn<B, F>(backend: Arc<B>, interval: Duration, on_update: F) -> Self
    where
        B: BackendApi + ?Sized + 'static,
        F: Fn(TriviaUpdate) + Send + Sync + 'static,
    {
        let active = Arc::new(Mutex::new(true));
        let task_active = Arc::clone(&active);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut step = 0u8;
            loop {
                ticker.tick().await;
                let update = match backend.trivia().await {
                    Ok(text) => TriviaUpdate {
                        text,
                        step: (step + 1) % LOADING_STEPS,
                    },
                    Err(err) => {
                        debug!("trivia fetch failed, using fallback: {err}");
                        TriviaUpdate {
                            text: TRIVIA_FALLBACK.to_string(),
                            step,
                        }
                    }
                };

                // Late responses after teardown are discarded.
                let delivered = {
                    let active = task_active.lock().unwrap_or_else(PoisonError::into_inner);
                    if *active {
                        step = update.step;
                        on_update(update);
                    }
                    *active
                };
                if !delivered {
                    break;
                }
            }
        });

        Self {
            active,
            task: Some(task),
        }
    }

    pub fn is_active(&self) -> bool {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stop(&mut self) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = false;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TriviaPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "tests/trivia_tests.rs"]
mod tests;
