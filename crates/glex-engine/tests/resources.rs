//! Live object accounting through a full engine lifecycle.
//!
//! The tracker is process-wide, so this binary holds a single test.

mod common;

use common::{surface, wait_until, MockDriver, MockOptions, WAIT};
use glex_engine::engine::{Engine, EngineConfig};
use glex_engine::resources::tracker;

#[test]
fn counts_follow_shader_stage_lifecycle() {
    assert_eq!(tracker().snapshot().total(), 0);

    let driver = MockDriver::new(MockOptions::default());
    let engine = Engine::new(EngineConfig::default(), driver.backend());

    // ── creation ──
    engine.on_surface_created(surface());
    let stats = engine.resource_stats();
    assert_eq!(stats.programs, 1);
    assert_eq!(stats.shaders, 0, "shaders are released after linking");
    assert_eq!(stats.buffers, 1);
    assert_eq!(stats.vertex_arrays, 1);
    assert_eq!(stats.textures, 0);

    // ── rebuild replaces, never accumulates ──
    engine.start();
    let fragment = "void main() { /* v2 */ }";
    engine.set_shader_sources("", fragment);
    assert!(wait_until(WAIT, || {
        driver
            .last_drawn_sources()
            .is_some_and(|(_, f)| f == fragment)
    }));
    assert_eq!(engine.resource_stats().programs, 1);
    assert_eq!(engine.resource_stats().shaders, 0);

    // ── failed build leaves nothing behind ──
    engine.set_shader_sources("", "#error broken");
    assert!(wait_until(WAIT, || {
        engine
            .last_error()
            .is_some_and(|e| e.contains("fragment shader compile failed"))
    }));
    assert_eq!(engine.resource_stats().programs, 0);
    assert_eq!(engine.resource_stats().shaders, 0);

    // ── teardown ──
    engine.on_surface_destroyed();
    assert_eq!(engine.resource_stats().total(), 0);
    assert_eq!(driver.violations(), 0);
}
