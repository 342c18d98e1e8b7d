//! Time subsystem.
//!
//! Frame timing utilities for the render loop, kept free of any thread or GL
//! coupling so they can be tested in isolation:
//! - one `FrameClock` per render loop; `tick()` once per iteration
//! - `FpsCounter` produces the rolling one-second frame-rate estimate
//! - `frame_interval` / `sleep_budget` compute the loop's pacing

mod fps;
mod frame_clock;

pub use fps::{frame_interval, sleep_budget, FpsCounter};
pub use frame_clock::{FrameClock, FrameTime};
