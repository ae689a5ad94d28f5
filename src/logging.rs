//! Subscriber setup shared by the CLI and the viewer.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or empty.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// `RUST_LOG`-style directives, or [`DEFAULT_LOG_FILTER`] when there are none.
/// Given directives replace the default entirely.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    match directives {
        Some(d) if !d.trim().is_empty() => EnvFilter::new(d),
        _ => EnvFilter::new(DEFAULT_LOG_FILTER),
    }
}

/// Install the global fmt subscriber, writing to stderr so stdout stays free
/// for step records.
pub fn init() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use difdrive_kinematics::StepRecord;
    use tracing::info;

    use crate::telemetry::{TelemetrySink, TracingSink};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Log one control line and one step record through a subscriber built
    /// the way `init` builds it, and return what was written.
    fn capture(directives: Option<&str>) -> String {
        let out = Capture::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(log_filter(directives))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            info!("control line");
            let record = StepRecord {
                t: 0.5,
                v_left: 1.25,
                ..StepRecord::default()
            };
            TracingSink.record(&record).unwrap();
        });
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_tracing_sink_visible_with_default_filter() {
        let text = capture(None);
        assert!(text.contains("control line"));
        assert!(text.contains("v_left=1.25"));
    }

    #[test]
    fn test_tracing_sink_visible_at_debug() {
        let text = capture(Some("debug"));
        assert!(text.contains("control line"));
        assert!(text.contains("v_left=1.25"));
    }

    #[test]
    fn test_directives_can_silence_step_records() {
        let text = capture(Some("warn"));
        assert!(!text.contains("control line"));
        assert!(!text.contains("v_left"));

        let text = capture(Some("info,difdrive::telemetry=warn"));
        assert!(text.contains("control line"));
        assert!(!text.contains("v_left"));
    }

    #[test]
    fn test_empty_directives_fall_back_to_default() {
        let text = capture(Some("  "));
        assert!(text.contains("v_left=1.25"));
    }
}
