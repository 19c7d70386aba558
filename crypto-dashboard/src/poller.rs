//! Recurring background jobs tied to the lifetime of a handle.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Runs a job right away and then every `period` until dropped.
pub struct ScopedTask {
    name: String,
    handle: JoinHandle<()>,
}

impl ScopedTask {
    pub fn spawn<F, Fut>(name: &str, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task_name = name.to_string();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                debug!(task = %task_name, "Running scheduled job");
                job().await;
            }
        });

        debug!(task = name, period_secs = period.as_secs(), "Scheduled task started");
        Self {
            name: name.to_string(),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(task = %self.name, "Scheduled task cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PERIOD: Duration = Duration::from_secs(300);

    fn counting_task(runs: &Arc<AtomicUsize>) -> ScopedTask {
        let runs = Arc::clone(runs);
        ScopedTask::spawn("counter", PERIOD, move || {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn runs_on_activation_and_every_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let task = counting_task(&runs);

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        time::sleep(PERIOD * 2).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(task.name(), "counter");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_job() {
        let runs = Arc::new(AtomicUsize::new(0));
        let task = counting_task(&runs);

        time::sleep(PERIOD + Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        task.cancel();
        time::sleep(PERIOD * 10).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
