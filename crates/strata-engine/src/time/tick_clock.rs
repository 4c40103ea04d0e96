use std::time::{Duration, Instant};

/// Tick clock parameters.
#[derive(Debug, Copy, Clone)]
pub struct TickClockConfig {
    /// Simulation ticks per second.
    pub ticks_per_second: f64,
    /// Lower clamp on frame delta.
    pub dt_min: Duration,
    /// Upper clamp on frame delta. Bounds how many ticks one stalled frame can owe.
    pub dt_max: Duration,
}

impl Default for TickClockConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 20.0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }
}

/// Timing snapshot for one frame.
#[derive(Debug, Copy, Clone)]
pub struct TickTime {
    /// Monotonic frame counter.
    pub frame_index: u64,

    /// Clamped time since the previous frame, in seconds.
    pub dt: f32,

    /// Total whole ticks elapsed since the clock started.
    pub tick: u64,

    /// Whole ticks that completed during this frame.
    pub elapsed_ticks: u32,

    /// Progress through the current tick, in `[0, 1)`.
    pub time_fraction: f32,
}

/// Frame clock that also accumulates fixed simulation ticks.
#[derive(Debug, Clone)]
pub struct TickClock {
    last: Instant,
    frame_index: u64,
    tick: u64,
    /// Time carried into the current, unfinished tick.
    carry: Duration,
    tick_len: Duration,
    dt_min: Duration,
    dt_max: Duration,
}

impl TickClock {
    pub fn new() -> Self {
        Self::with_config(TickClockConfig::default())
    }

    /// Builds a clock from `config`.
    ///
    /// A rate that is not finite and positive falls back to the default rate.
    /// Tick length never drops below one nanosecond.
    pub fn with_config(config: TickClockConfig) -> Self {
        debug_assert!(config.dt_min <= config.dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            tick: 0,
            carry: Duration::ZERO,
            tick_len: tick_len(config.ticks_per_second),
            dt_min: config.dt_min,
            dt_max: config.dt_max,
        }
    }

    /// Advances by the wall time since the previous call.
    pub fn advance(&mut self) -> TickTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        self.advance_by(dt)
    }

    /// Advances by an explicit frame delta.
    pub fn advance_by(&mut self, dt: Duration) -> TickTime {
        let dt = dt.clamp(self.dt_min, self.dt_max);

        self.carry = self.carry.saturating_add(dt);
        let carry_ns = self.carry.as_nanos();
        let tick_ns = self.tick_len.as_nanos();
        let whole = carry_ns / tick_ns;
        self.carry = duration_from_nanos(carry_ns % tick_ns);

        let elapsed_ticks = u32::try_from(whole).unwrap_or(u32::MAX);
        self.tick = self
            .tick
            .wrapping_add(u64::try_from(whole).unwrap_or(u64::MAX));

        // carry < tick_len here, but f32 rounding can still land on 1.0.
        let fraction = (self.carry.as_secs_f64() / self.tick_len.as_secs_f64()) as f32;
        let time_fraction = fraction.min(1.0 - f32::EPSILON);

        let tt = TickTime {
            frame_index: self.frame_index,
            dt: dt.as_secs_f32(),
            tick: self.tick,
            elapsed_ticks,
            time_fraction,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        tt
    }
}

fn tick_len(ticks_per_second: f64) -> Duration {
    let rate = if ticks_per_second.is_finite() && ticks_per_second > 0.0 {
        ticks_per_second
    } else {
        let fallback = TickClockConfig::default().ticks_per_second;
        log::warn!("invalid tick rate {ticks_per_second}; using {fallback} ticks/s");
        fallback
    };

    Duration::try_from_secs_f64(rate.recip())
        .unwrap_or(Duration::MAX)
        .max(Duration::from_nanos(1))
}

fn duration_from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}
