//! Time subsystem.
//!
//! The simulation advances in fixed ticks while frames render as fast as the
//! display allows. [`TickClock`] tracks both and reports how far the current
//! frame sits inside the current tick, which is the `time_fraction` the render
//! engine interpolates with.
//!
//! Intended usage:
//! - one `TickClock` per window (or per render loop)
//! - call `advance()` once per presented frame

mod tick_clock;

pub use tick_clock::{TickClock, TickClockConfig, TickTime};
