use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::warn;

const NS_PER_MS: f64 = 1_000_000.0;
const NS_PER_S: f64 = 1_000_000_000.0;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

/// Loop health over the last reporting interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    /// Simulation steps per second.
    pub tps: f32,
    pub frame_time_ms: f32,
    /// Most steps run in a single frame of the interval.
    pub peak_steps_per_frame: u32,
    /// Wall time given up to stalls instead of being caught up.
    pub time_dropped_ms: u64,
    /// Total simulated time since startup.
    pub simulated_time_ms: u64,
    /// Total console commands executed since startup.
    pub commands_done: u64,
}

/// Shared view of the latest snapshot, readable from any thread.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                *poisoned.into_inner() = snapshot;
            }
        }
    }
}

/// Accumulates per-frame numbers and turns them into a snapshot once per
/// interval of loop clock time.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_ns: u64,
    interval_start_ns: u64,
    frames: u32,
    ticks: u32,
    ticks_this_frame: u32,
    peak_ticks_per_frame: u32,
    frame_time_sum_ns: u64,
    dropped_ns: u64,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval_ns: u64, start_ns: u64) -> Self {
        Self {
            interval_ns: interval_ns.max(1),
            interval_start_ns: start_ns,
            frames: 0,
            ticks: 0,
            ticks_this_frame: 0,
            peak_ticks_per_frame: 0,
            frame_time_sum_ns: 0,
            dropped_ns: 0,
        }
    }

    /// Starts a new frame that lasted `frame_ns` and lost `dropped_ns` to a
    /// stall.
    pub(crate) fn record_frame(&mut self, frame_ns: u64, dropped_ns: u64) {
        self.close_frame();
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum_ns = self.frame_time_sum_ns.saturating_add(frame_ns);
        self.dropped_ns = self.dropped_ns.saturating_add(dropped_ns);
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
        self.ticks_this_frame = self.ticks_this_frame.saturating_add(1);
    }

    fn close_frame(&mut self) {
        self.peak_ticks_per_frame = self.peak_ticks_per_frame.max(self.ticks_this_frame);
        self.ticks_this_frame = 0;
    }

    pub(crate) fn maybe_snapshot(
        &mut self,
        now_ns: u64,
        simulated_time_ms: u64,
        commands_done: u64,
    ) -> Option<LoopMetricsSnapshot> {
        let elapsed_ns = now_ns.saturating_sub(self.interval_start_ns);
        if elapsed_ns < self.interval_ns {
            return None;
        }
        self.close_frame();

        let elapsed_s = (elapsed_ns as f64 / NS_PER_S).max(f64::EPSILON);
        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time_sum_ns as f64 / f64::from(frames) / NS_PER_MS,
        };
        let snapshot = LoopMetricsSnapshot {
            fps: (f64::from(self.frames) / elapsed_s) as f32,
            tps: (f64::from(self.ticks) / elapsed_s) as f32,
            frame_time_ms: frame_time_ms as f32,
            peak_steps_per_frame: self.peak_ticks_per_frame,
            time_dropped_ms: self.dropped_ns / 1_000_000,
            simulated_time_ms,
            commands_done,
        };

        *self = Self::new(self.interval_ns, now_ns);
        Some(snapshot)
    }
}
