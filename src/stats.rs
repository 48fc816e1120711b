//! Rolling use-time statistics

use std::time::Duration;

/// Number of use-time samples the ring buffer keeps.
pub(crate) const USE_TIME_SAMPLES: usize = 1000;

/// Fixed-capacity ring buffer of resource use times.
///
/// `record` is called on every release with the elapsed time the caller
/// held the resource. `max`/`min` scan the samples recorded since their
/// respective reset watermarks, so the two resets are independent and a
/// sample older than the ring capacity ages out of both.
#[derive(Debug)]
pub(crate) struct UseTimeStats {
    samples: Box<[Duration]>,
    recorded: u64,
    max_floor: u64,
    min_floor: u64,
}

impl UseTimeStats {
    pub fn new() -> Self {
        Self {
            samples: vec![Duration::ZERO; USE_TIME_SAMPLES].into_boxed_slice(),
            recorded: 0,
            max_floor: 0,
            min_floor: 0,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        let slot = (self.recorded % USE_TIME_SAMPLES as u64) as usize;
        self.samples[slot] = elapsed;
        self.recorded += 1;
    }

    pub fn max(&self) -> Option<Duration> {
        self.window(self.max_floor).max()
    }

    pub fn min(&self) -> Option<Duration> {
        self.window(self.min_floor).min()
    }

    pub fn reset_max(&mut self) {
        self.max_floor = self.recorded;
    }

    pub fn reset_min(&mut self) {
        self.min_floor = self.recorded;
    }

    /// Samples recorded since `floor`, newest first, capped at ring
    /// capacity.
    fn window(&self, floor: u64) -> impl Iterator<Item = Duration> + '_ {
        let available = (self.recorded - floor).min(USE_TIME_SAMPLES as u64);
        (0..available).map(move |back| {
            let slot = ((self.recorded - 1 - back) % USE_TIME_SAMPLES as u64) as usize;
            self.samples[slot]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn empty_stats_have_no_extremes() {
        let stats = UseTimeStats::new();
        assert_eq!(stats.max(), None);
        assert_eq!(stats.min(), None);
    }

    #[test]
    fn tracks_max_and_min() {
        let mut stats = UseTimeStats::new();
        for n in [30, 5, 90, 40] {
            stats.record(ms(n));
        }
        assert_eq!(stats.max(), Some(ms(90)));
        assert_eq!(stats.min(), Some(ms(5)));
    }

    #[test]
    fn old_samples_age_out_when_the_ring_wraps() {
        let mut stats = UseTimeStats::new();
        stats.record(ms(10_000)); // the outlier
        for _ in 0..USE_TIME_SAMPLES {
            stats.record(ms(50));
        }
        // the outlier was overwritten by the wrap
        assert_eq!(stats.max(), Some(ms(50)));
        assert_eq!(stats.min(), Some(ms(50)));
    }

    #[test]
    fn resets_are_independent() {
        let mut stats = UseTimeStats::new();
        stats.record(ms(100));
        stats.record(ms(1));

        stats.reset_max();
        assert_eq!(stats.max(), None);
        assert_eq!(stats.min(), Some(ms(1)));

        stats.record(ms(20));
        assert_eq!(stats.max(), Some(ms(20)));
        assert_eq!(stats.min(), Some(ms(1)));

        stats.reset_min();
        assert_eq!(stats.min(), None);
        assert_eq!(stats.max(), Some(ms(20)));
    }
}
