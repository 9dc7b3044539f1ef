//! End-to-end reveal scenarios driven through the frame pipeline.
//!
//! Each test plays the host: it reports bounds and the viewport, feeds
//! pointer events, and steps the clock. Everything else goes through the
//! public API.
//!
//! Run with: cargo test --test reveal_scenarios

use spark_reveal::animation::controller::{self, RevealMode, RevealState};
use spark_reveal::engine::arrays::{presentation, surface};
use spark_reveal::engine::pointer::{self, PointerEvent};
use spark_reveal::engine::{allocate_index, scheduler};
use spark_reveal::{
    block_reveal, cursor_follower, pointer_parallax, reset_runtime, split, step, text_reveal,
    BlockRevealProps, Bounds, Direction, Offset, TextRevealProps,
};

// =============================================================================
// HELPERS
// =============================================================================

const FRAME: f64 = 0.016;

fn setup() {
    reset_runtime();
    surface::set_viewport(Bounds::new(0.0, 0.0, 80.0, 24.0));
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

/// Scroll a node fully into or out of the viewport.
fn place(index: usize, visible: bool) {
    let y = if visible { 2.0 } else { 200.0 };
    surface::set_bounds(index, Bounds::new(0.0, y, 10.0, 2.0));
}

// =============================================================================
// TEXT
// =============================================================================

#[test]
fn two_glyphs_start_a_stagger_apart() {
    setup();

    let units = split("hi", 0.0);
    let delays: Vec<f64> = units.iter().map(|u| u.delay).collect();
    assert_eq!(delays, vec![0.0, 0.03]);

    let title = text_reveal(TextRevealProps {
        text: "hi".to_string(),
        ..Default::default()
    });
    place(title.node().index, true);

    // Enter schedules the glyph timers from this step's time
    step(FRAME);
    assert_eq!(title.state(), RevealState::Revealed);
    assert_eq!(presentation::glyph_count(title.node().index), 2);

    step(0.0);
    step(0.05);

    let glyphs = presentation::get_glyphs(title.node().index).unwrap();
    let first = glyphs[0].transition.unwrap();
    let second = glyphs[1].transition.unwrap();
    assert!((first.start - FRAME).abs() < 1e-9);
    assert!((second.start - first.start - 0.03).abs() < 1e-9);
    assert_eq!(first.duration, 0.4);
    assert_eq!(second.duration, 0.4);
    assert_eq!(first.from.opacity, 0.0);
    assert_eq!(first.to.opacity, 1.0);
}

#[test]
fn split_delays_never_decrease() {
    let units = split("Mountain West Studio", 0.25);
    assert_eq!(units.len(), "Mountain West Studio".chars().count());
    assert_eq!(units[0].delay, 0.25);
    for pair in units.windows(2) {
        assert!(pair[1].delay >= pair[0].delay);
    }
    assert!(units.iter().all(|u| !u.display_char.is_whitespace()));
}

#[test]
fn once_text_reveals_exactly_once() {
    setup();

    let title = text_reveal(TextRevealProps {
        text: "Contact".to_string(),
        ..Default::default()
    });
    let index = title.node().index;

    for visible in [true, false, true, false, true] {
        place(index, visible);
        step(FRAME);
    }
    step(1.0);

    assert_eq!(title.state(), RevealState::Revealed);
    assert_eq!(title.controller().mode(), RevealMode::Once);
    // Still split: leaving the view never collapsed it
    assert_eq!(presentation::glyph_count(index), 7);
}

#[test]
fn repeat_text_collapses_and_replays() {
    setup();

    let title = text_reveal(TextRevealProps {
        text: "Menu".to_string(),
        once: false,
        ..Default::default()
    });
    let index = title.node().index;

    place(index, true);
    step(FRAME);
    assert_eq!(presentation::glyph_count(index), 4);

    place(index, false);
    step(FRAME);
    assert_eq!(title.state(), RevealState::Hidden);
    assert_eq!(presentation::glyph_count(index), 0);
    assert_eq!(presentation::get_text_content(index), "Menu");

    place(index, true);
    step(FRAME);
    assert_eq!(title.state(), RevealState::Revealed);
    assert_eq!(presentation::glyph_count(index), 4);
}

// =============================================================================
// BLOCK
// =============================================================================

#[test]
fn block_slides_in_from_the_left() {
    setup();

    let card = block_reveal(BlockRevealProps {
        direction: Direction::Left,
        distance: 30.0,
        ..Default::default()
    });
    let index = card.node().index;

    let hidden = presentation::get_presentation(index);
    assert_eq!(hidden.opacity, 0.0);
    assert_eq!(hidden.offset, Offset::new(30.0, 0.0));

    place(index, true);
    step(FRAME);
    let transition = presentation::get_transition(index).unwrap();
    assert_eq!(transition.from.offset, Offset::new(30.0, 0.0));
    assert_eq!(transition.duration, 0.6);

    step(1.0);
    let settled = presentation::sample_presentation(index, scheduler::now());
    assert!(approx(settled.opacity, 1.0));
    assert!(approx(settled.offset.x, 0.0));
    assert!(approx(settled.offset.y, 0.0));
}

#[test]
fn repeat_block_counts_enters_and_resets() {
    setup();

    let card = block_reveal(BlockRevealProps {
        once: false,
        ..Default::default()
    });
    let index = card.node().index;
    let mut enters = 0;
    let mut resets = 0;

    let mut had_transition = false;
    for visible in [true, false, true] {
        place(index, visible);
        step(FRAME);
        if visible {
            enters += 1;
            assert!(presentation::get_transition(index).is_some());
            had_transition = true;
        } else if had_transition {
            // Snapped back without a transition
            assert_eq!(presentation::get_transition(index), None);
            assert_eq!(presentation::get_presentation(index), card.hidden());
            resets += 1;
        }
    }

    assert_eq!(enters, 2);
    assert_eq!(resets, 1);
    assert_eq!(card.state(), RevealState::Revealed);
}

#[test]
fn unmounted_block_receives_no_writes() {
    setup();

    let card = block_reveal(BlockRevealProps::default());
    let index = card.node().index;
    place(index, true);

    // Visible but the frame has not run yet
    scheduler::advance(FRAME);
    spark_reveal::engine::visibility::process_visibility();
    card.unmount();

    let before = presentation::total_mutations();
    for _ in 0..5 {
        step(FRAME);
    }
    assert_eq!(presentation::total_mutations(), before);
    assert_eq!(controller::attached_count(), 0);
}

// =============================================================================
// POINTER
// =============================================================================

#[test]
fn restarted_parallax_writes_once_per_tick() {
    setup();

    let hero = allocate_index(Some("hero"));
    surface::set_bounds(hero.index, Bounds::new(0.0, 0.0, 80.0, 24.0));

    let first = pointer_parallax(hero);
    let second = pointer_parallax(hero);
    assert!(!first.is_running());
    assert!(second.is_running());

    pointer::dispatch_pointer(PointerEvent::move_to(80.0, 24.0));

    for _ in 0..3 {
        let before = presentation::mutation_count(hero.index);
        step(FRAME);
        assert_eq!(presentation::mutation_count(hero.index) - before, 1);
    }
    assert_eq!(presentation::get_background_offset(hero.index), Offset::new(20.0, 20.0));

    second.stop();
    let before = presentation::mutation_count(hero.index);
    step(FRAME);
    assert_eq!(presentation::mutation_count(hero.index), before);
}

#[test]
fn cursor_follows_hover_over_interactive_nodes() {
    setup();
    surface::set_viewport(Bounds::new(0.0, 0.0, 1280.0, 800.0));

    let link = allocate_index(Some("link"));
    surface::set_bounds(link.index, Bounds::new(100.0, 100.0, 50.0, 20.0));
    surface::set_interactive(link.index, true);

    let cursor = cursor_follower();
    assert!(cursor.is_enabled());
    assert_eq!(cursor.tracked(), &[link]);
    assert!(cursor.state().hidden());

    pointer::dispatch_pointer(PointerEvent::move_to(10.0, 10.0));
    let visual = cursor.visual().unwrap();
    assert_eq!((visual.x, visual.y), (10.0, 10.0));
    assert_eq!(visual.ring_scale, 1.0);

    pointer::dispatch_pointer(PointerEvent::move_to(120.0, 110.0));
    let visual = cursor.visual().unwrap();
    assert_eq!(visual.ring_scale, 1.5);
    assert_eq!(visual.dot_opacity, 0.0);

    pointer::dispatch_pointer(PointerEvent::leave());
    assert!(cursor.state().hidden());
    assert!(!cursor.state().hovered());

    cursor.stop();
    assert_eq!(pointer::pointer_listener_count(), 0);
    assert_eq!(pointer::hover_listener_count(), 0);
}

#[test]
fn cursor_disabled_on_narrow_surface() {
    setup();

    let cursor = cursor_follower();
    assert!(!cursor.is_enabled());
    assert!(cursor.visual().is_none());
    assert_eq!(pointer::pointer_listener_count(), 0);
}
