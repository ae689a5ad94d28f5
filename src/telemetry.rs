//! Where the per-step diagnostic records go.

use std::io::{self, Write};

use difdrive_kinematics::StepRecord;

use crate::config::SinkKind;

/// Consumer of one [`StepRecord`] per simulation step.
pub trait TelemetrySink {
    fn record(&mut self, record: &StepRecord) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Plain text lines, one per step.
pub struct LineSink<W: Write> {
    out: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        LineSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TelemetrySink for LineSink<W> {
    fn record(&mut self, record: &StepRecord) -> io::Result<()> {
        writeln!(self.out, "{}", record)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Structured `tracing` events at info level, one per step.
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&mut self, r: &StepRecord) -> io::Result<()> {
        tracing::info!(
            dt = r.dt,
            t = r.t,
            x = r.x,
            dx = r.dx,
            y = r.y,
            dy = r.dy,
            v_left = r.v_left,
            v_right = r.v_right,
            v = r.v,
            omega = r.omega,
            "step"
        );
        Ok(())
    }
}

/// Drops everything.
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&mut self, _record: &StepRecord) -> io::Result<()> {
        Ok(())
    }
}

pub fn sink_for(kind: SinkKind) -> Box<dyn TelemetrySink> {
    match kind {
        SinkKind::Stdout => Box::new(LineSink::new(io::BufWriter::new(io::stdout()))),
        SinkKind::Tracing => Box::new(TracingSink),
        SinkKind::Disabled => Box::new(NullSink),
    }
}
