use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// Nominal duration of one simulation step in fixed timestep mode.
pub const FIXED_TIMESTEP_NS: u64 = 10_000_000;

/// Monotonic wall-clock source driving the main loop.
///
/// Kept behind a trait so the schedulers can be driven deterministically in
/// tests.
pub trait Clock {
    fn now_ns(&self) -> u64;
    fn sleep_ns(&self, duration_ns: u64);
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ns(&self) -> u64 {
        let elapsed = Instant::now().saturating_duration_since(self.origin);
        u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
    }

    fn sleep_ns(&self, duration_ns: u64) {
        if duration_ns > 0 {
            thread::sleep(Duration::from_nanos(duration_ns));
        }
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_ns(&self) -> u64 {
        (**self).now_ns()
    }

    fn sleep_ns(&self, duration_ns: u64) {
        (**self).sleep_ns(duration_ns);
    }
}

/// Clock whose time only moves when told to. Sleeping advances it.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ns: Cell<u64>,
    slept_ns: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ns: u64) -> Self {
        Self {
            now_ns: Cell::new(start_ns),
            slept_ns: Cell::new(0),
        }
    }

    pub fn advance_ns(&self, delta_ns: u64) {
        self.now_ns.set(self.now_ns.get().saturating_add(delta_ns));
    }

    /// Total time spent in `sleep_ns` since creation.
    pub fn slept_ns(&self) -> u64 {
        self.slept_ns.get()
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now_ns.get()
    }

    fn sleep_ns(&self, duration_ns: u64) {
        self.slept_ns
            .set(self.slept_ns.get().saturating_add(duration_ns));
        self.advance_ns(duration_ns);
    }
}

/// Simulated time, advanced only by simulation steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedClock {
    ticks: u64,
}

impl SimulatedClock {
    pub fn ticks_ns(&self) -> u64 {
        self.ticks
    }

    pub fn ticks_ms(&self) -> u64 {
        self.ticks / 1_000_000
    }

    pub(crate) fn update(&mut self, timestep_ns: u64) {
        self.ticks = self.ticks.saturating_add(timestep_ns);
    }
}
