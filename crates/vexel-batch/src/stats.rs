use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Throughput figures for one batch call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Leaf records written by the call.
    pub objects_processed: usize,
    pub elapsed: Duration,
}

impl BatchStats {
    pub(crate) fn finish(objects_processed: usize, started: Instant) -> Self {
        Self {
            objects_processed,
            elapsed: started.elapsed(),
        }
    }

    pub fn time_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1_000.0
    }

    /// Objects per second, or `0.0` when no measurable time elapsed.
    pub fn objects_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.objects_processed as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_is_derived_from_elapsed() {
        let stats = BatchStats {
            objects_processed: 500,
            elapsed: Duration::from_millis(250),
        };
        assert_eq!(stats.time_ms(), 250.0);
        assert_eq!(stats.objects_per_second(), 2_000.0);
        assert_eq!(BatchStats::default().objects_per_second(), 0.0);
    }
}
