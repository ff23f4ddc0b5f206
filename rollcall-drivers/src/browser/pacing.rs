use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Human-like pauses between navigation actions.
#[derive(Debug, Clone, Default)]
pub struct Pacing {}

impl Pacing {
    pub fn new() -> Self {
        Self {}
    }

    /// Sleep for a random duration between `min` and `max` milliseconds.
    pub async fn random_delay(&self, min: u64, max: u64) {
        let ms = if max > min {
            OsRng.gen_range(min..=max)
        } else {
            min
        };
        sleep(Duration::from_millis(ms)).await;
    }
}
