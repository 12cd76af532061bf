//! Progress logging with ETA estimation

use log::info;
use std::time::Instant;

/// Frame progress tracker that logs throughput and ETA
pub struct ProgressTracker {
    total: u64,
    processed: u64,
    start_time: Instant,
    label: String,
}

impl ProgressTracker {
    /// Creates a new progress tracker; `total` may be 0 if unknown
    pub fn new(total: u64, label: &str) -> Self {
        Self {
            total,
            processed: 0,
            start_time: Instant::now(),
            label: label.to_string(),
        }
    }

    /// Number of items processed so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Increments the processed count by one and logs every `report_interval` items
    pub fn increment_and_report(&mut self, report_interval: u64) {
        self.processed += 1;
        if report_interval > 0 && self.processed % report_interval == 0 {
            self.log_progress();
        }
    }

    /// Logs a final summary line
    pub fn finish(&self) {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        info!(
            "{} {} frames in {} ({:.1} fps)",
            self.label,
            self.processed,
            format_duration(elapsed_secs),
            rate(self.processed, elapsed_secs),
        );
    }

    fn log_progress(&self) {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let current = self.processed;

        if self.total > 0 && current < self.total {
            let percent = (current as f64 / self.total as f64) * 100.0;
            let per_sec = rate(current, elapsed_secs);
            let eta = if per_sec > 0.0 {
                format_duration((self.total - current) as f64 / per_sec)
            } else {
                "unknown".to_string()
            };
            info!(
                "{} {}/{} ({:.1}%) - {:.1} fps - elapsed: {} - ETA: {}",
                self.label,
                current,
                self.total,
                percent,
                per_sec,
                format_duration(elapsed_secs),
                eta,
            );
        } else {
            info!(
                "{} {} frames - {:.1} fps - elapsed: {}",
                self.label,
                current,
                rate(current, elapsed_secs),
                format_duration(elapsed_secs),
            );
        }
    }
}

fn rate(count: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        count as f64 / elapsed_secs
    } else {
        0.0
    }
}

/// Formats seconds into a human-readable duration string
fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{}m {:.0}s", mins, remaining)
    } else {
        let hours = (secs / 3600.0).floor() as u64;
        let remaining = secs - (hours as f64 * 3600.0);
        let mins = (remaining / 60.0).floor() as u64;
        let remaining_secs = remaining - (mins as f64 * 60.0);
        format!("{}h {}m {:.0}s", hours, mins, remaining_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(12.34), "12.3s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3725.0), "1h 2m 5s");
    }

    #[test]
    fn test_counts_processed() {
        let mut tracker = ProgressTracker::new(10, "Detecting");
        for _ in 0..4 {
            tracker.increment_and_report(2);
        }
        assert_eq!(tracker.processed(), 4);
    }
}
