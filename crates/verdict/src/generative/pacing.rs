use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Minimum spacing between request starts.
///
/// The first call to [`Pacer::wait`] returns immediately; every later call
/// waits until `min_interval` has passed since the previous one returned.
#[derive(Debug, Clone)]
pub struct Pacer {
  min_interval: Duration,
  last: Option<Instant>,
}

impl Pacer {
  pub fn new(min_interval: Duration) -> Self {
    Self { min_interval, last: None }
  }

  pub fn min_interval(&self) -> Duration {
    self.min_interval
  }

  pub async fn wait(&mut self) {
    if let Some(last) = self.last {
      let ready = last + self.min_interval;
      if Instant::now() < ready {
        tracing::debug!(delay_ms = (ready - Instant::now()).as_millis() as u64, "pacing next request");
        sleep_until(ready).await;
      }
    }
    self.last = Some(Instant::now());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn test_first_request_is_not_delayed() {
    let mut pacer = Pacer::new(Duration::from_secs(5));
    let start = Instant::now();

    pacer.wait().await;

    assert_eq!(start.elapsed(), Duration::ZERO);
  }

  #[tokio::test(start_paused = true)]
  async fn test_consecutive_requests_are_spaced() {
    let mut pacer = Pacer::new(Duration::from_secs(5));
    let start = Instant::now();

    pacer.wait().await;
    pacer.wait().await;
    pacer.wait().await;

    assert!(start.elapsed() >= Duration::from_secs(10));
  }

  #[tokio::test(start_paused = true)]
  async fn test_slow_requests_are_not_delayed_further() {
    let mut pacer = Pacer::new(Duration::from_secs(5));

    pacer.wait().await;
    tokio::time::sleep(Duration::from_secs(7)).await;
    let before = Instant::now();
    pacer.wait().await;

    assert_eq!(before.elapsed(), Duration::ZERO);
  }
}
