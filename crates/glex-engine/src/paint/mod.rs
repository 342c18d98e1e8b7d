//! Color primitives used by the engine's clear pass.

mod color;

pub use color::Color;
