/// Lag beyond which the fixed scheduler stops trying to catch up.
pub const STALL_THRESHOLD_NS: u64 = 200_000_000;
pub const MAX_STEPS_PER_FRAME: u32 = 10;
/// A dynamic frame longer than this many nominal periods counts as a stall.
pub const DYNAMIC_STALL_PERIODS: u64 = 5;
pub const DEFAULT_SPILL_FACTOR: f64 = 0.01;

/// Fixed-timestep bookkeeping: accumulated lag and the wall time dropped
/// after stalls. Pure arithmetic, fed with clock readings by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimestep {
    timestep_ns: u64,
    // Signed: a forced turbo step may consume time that has not elapsed.
    lag_ns: i64,
    time_dropped_ns: u64,
    last_frame_date_ns: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStart {
    pub frame_duration_ns: u64,
    /// Wall time discarded because the frame exceeded the stall threshold.
    pub dropped_ns: u64,
}

impl FixedTimestep {
    pub fn new(timestep_ns: u64, real_now_ns: u64) -> Self {
        Self {
            timestep_ns,
            lag_ns: 0,
            time_dropped_ns: 0,
            last_frame_date_ns: real_now_ns,
        }
    }

    pub fn with_lag(timestep_ns: u64, lag_ns: i64) -> Self {
        Self {
            lag_ns,
            ..Self::new(timestep_ns, 0)
        }
    }

    pub fn timestep_ns(&self) -> u64 {
        self.timestep_ns
    }

    pub fn lag_ns(&self) -> i64 {
        self.lag_ns
    }

    pub fn time_dropped_ns(&self) -> u64 {
        self.time_dropped_ns
    }

    pub fn last_frame_date_ns(&self) -> u64 {
        self.last_frame_date_ns
    }

    pub fn begin_frame(&mut self, real_now_ns: u64) -> FrameStart {
        let now = real_now_ns.saturating_sub(self.time_dropped_ns);
        let frame_duration_ns = now.saturating_sub(self.last_frame_date_ns);
        self.last_frame_date_ns = now;
        self.lag_ns = self.lag_ns.saturating_add(to_signed(frame_duration_ns));

        let mut dropped_ns = 0;
        if self.lag_ns >= to_signed(STALL_THRESHOLD_NS) {
            dropped_ns = u64::try_from(self.lag_ns - to_signed(self.timestep_ns)).unwrap_or(0);
            self.time_dropped_ns = self.time_dropped_ns.saturating_add(dropped_ns);
            self.lag_ns = to_signed(self.timestep_ns);
            self.last_frame_date_ns = real_now_ns.saturating_sub(self.time_dropped_ns);
        }

        FrameStart {
            frame_duration_ns,
            dropped_ns,
        }
    }

    pub fn should_step(&self, steps_this_frame: u32) -> bool {
        self.lag_ns >= to_signed(self.timestep_ns) && steps_this_frame < MAX_STEPS_PER_FRAME
    }

    pub fn consume_step(&mut self) {
        self.lag_ns = self.lag_ns.saturating_sub(to_signed(self.timestep_ns));
    }

    /// Time left before the next timestep boundary, measured from the start
    /// of the current frame.
    pub fn remaining_sleep_ns(&self, real_now_ns: u64) -> u64 {
        let elapsed = real_now_ns
            .saturating_sub(self.time_dropped_ns)
            .saturating_sub(self.last_frame_date_ns);
        self.timestep_ns.saturating_sub(elapsed)
    }
}

/// Dynamic-timestep smoothing: each frame steps once with the nominal period
/// plus a small share of the accumulated timing error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicTimestep {
    nominal_period_ns: u64,
    delta_buffer_ns: i64,
    last_frame_date_ns: u64,
    spill_factor: f64,
}

impl DynamicTimestep {
    pub fn new(nominal_period_ns: u64, real_now_ns: u64) -> Self {
        Self {
            nominal_period_ns,
            delta_buffer_ns: 0,
            last_frame_date_ns: real_now_ns,
            spill_factor: DEFAULT_SPILL_FACTOR,
        }
    }

    pub fn with_spill_factor(mut self, spill_factor: f64) -> Self {
        self.spill_factor = spill_factor;
        self
    }

    pub fn nominal_period_ns(&self) -> u64 {
        self.nominal_period_ns
    }

    pub fn delta_buffer_ns(&self) -> i64 {
        self.delta_buffer_ns
    }

    /// Returns the smoothed duration to step the simulation with.
    pub fn advance(&mut self, real_now_ns: u64) -> u64 {
        let mut used_ns = real_now_ns.saturating_sub(self.last_frame_date_ns);
        self.last_frame_date_ns = real_now_ns;
        if used_ns > self.nominal_period_ns.saturating_mul(DYNAMIC_STALL_PERIODS) {
            used_ns = self.nominal_period_ns;
        }

        let spill = (self.delta_buffer_ns as f64 * self.spill_factor) as i64;
        let smoothed = to_signed(self.nominal_period_ns).saturating_add(spill).max(0);
        self.delta_buffer_ns = self
            .delta_buffer_ns
            .saturating_add(to_signed(used_ns) - smoothed);

        u64::try_from(smoothed).unwrap_or(0)
    }
}

fn to_signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
