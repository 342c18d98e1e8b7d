//! Input subsystem.
//!
//! Public API is platform-agnostic: hosts forward raw pointer/touch samples
//! (coordinates, action code, pointer id) and the engine translates them into
//! `PointerEvent`s delivered to stages on the render thread.

mod pointer;

pub use pointer::{PointerAction, PointerEvent};
