//! Scheduler - Timers and per-frame callbacks on a host-driven clock.
//!
//! Single-threaded and cooperative: nothing here sleeps or spawns. The host
//! moves the clock with [`advance`] and drives render ticks with [`run_frame`].
//!
//! # Pattern
//!
//! - `set_timeout` fires once after a delay (ties fire in scheduling order)
//! - `request_frame` fires once on the next frame; to keep running, the
//!   callback requests another frame (a rescheduling chain)
//! - Callbacks are removed from the registry before they run, so they may
//!   schedule or cancel freely
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::engine::scheduler::{set_timeout, clear_timeout, advance};
//!
//! let id = set_timeout(0.03, || println!("fired"));
//! advance(0.016); // not yet
//! advance(0.016); // fired
//! clear_timeout(id); // no-op, already fired
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use crate::types::Seconds;

// =============================================================================
// IDS
// =============================================================================

/// Handle to a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Handle to a pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

// =============================================================================
// REGISTRY
// =============================================================================

/// Timer queue key: deadline, then scheduling order.
///
/// Deadlines are finite and non-negative, so their bit patterns order the
/// same way the values do.
type TimerKey = (u64, u64);

fn timer_key(deadline: Seconds, id: u64) -> TimerKey {
    (deadline.to_bits(), id)
}

thread_local! {
    /// Current host time.
    static NOW: Cell<Seconds> = const { Cell::new(0.0) };

    /// Shared id counter for timers and frames (monotonic, never reused).
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };

    /// Pending timers ordered by deadline, ties in scheduling order.
    static TIMERS: RefCell<BTreeMap<TimerKey, Box<dyn FnOnce()>>> = const { RefCell::new(BTreeMap::new()) };

    /// Queue key of each pending timer by id.
    static TIMER_KEYS: RefCell<HashMap<u64, TimerKey>> = RefCell::new(HashMap::new());

    /// Pending frame callbacks keyed by id.
    static FRAMES: RefCell<BTreeMap<u64, Box<dyn FnOnce(Seconds)>>> = const { RefCell::new(BTreeMap::new()) };

    /// Number of frames run so far.
    static FRAME_COUNT: Cell<u64> = const { Cell::new(0) };
}

fn next_id() -> u64 {
    NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

fn sanitize_delay(delay: Seconds) -> Seconds {
    if delay.is_finite() && delay > 0.0 { delay } else { 0.0 }
}

// =============================================================================
// CLOCK
// =============================================================================

/// Current host time in seconds.
pub fn now() -> Seconds {
    NOW.with(|now| now.get())
}

/// Move the clock forward by `dt` seconds, firing every timer that comes due.
///
/// Timers fire in deadline order; the clock reads each timer's deadline while
/// its callback runs. Timers scheduled by a callback fire in the same call if
/// they come due before the new time.
pub fn advance(dt: Seconds) {
    let target = now() + sanitize_delay(dt);

    loop {
        let due = TIMERS.with(|timers| {
            let mut timers = timers.borrow_mut();
            let (&(bits, _), _) = timers.first_key_value()?;
            if Seconds::from_bits(bits) > target {
                return None;
            }
            timers.pop_first()
        });
        let Some(((bits, id), callback)) = due else { break };

        TIMER_KEYS.with(|keys| keys.borrow_mut().remove(&id));
        NOW.with(|now| now.set(now.get().max(Seconds::from_bits(bits))));
        callback();
    }

    NOW.with(|now| now.set(target));
}

// =============================================================================
// TIMERS
// =============================================================================

/// Run `callback` once after `delay` seconds.
///
/// Negative or non-finite delays are treated as zero.
pub fn set_timeout(delay: Seconds, callback: impl FnOnce() + 'static) -> TimerId {
    let id = next_id();
    let key = timer_key(now() + sanitize_delay(delay), id);
    TIMERS.with(|timers| {
        timers.borrow_mut().insert(key, Box::new(callback));
    });
    TIMER_KEYS.with(|keys| {
        keys.borrow_mut().insert(id, key);
    });
    TimerId(id)
}

/// Cancel a pending timer. Returns false if it already fired or was cancelled.
pub fn clear_timeout(id: TimerId) -> bool {
    let Some(key) = TIMER_KEYS.with(|keys| keys.borrow_mut().remove(&id.0)) else {
        return false;
    };
    TIMERS.with(|timers| timers.borrow_mut().remove(&key).is_some())
}

/// Whether a timer is still waiting to fire.
pub fn is_timer_pending(id: TimerId) -> bool {
    TIMER_KEYS.with(|keys| keys.borrow().contains_key(&id.0))
}

/// Number of timers waiting to fire.
pub fn pending_timer_count() -> usize {
    TIMERS.with(|timers| timers.borrow().len())
}

// =============================================================================
// FRAMES
// =============================================================================

/// Run `callback` on the next frame with the frame's host time.
pub fn request_frame(callback: impl FnOnce(Seconds) + 'static) -> FrameId {
    let id = next_id();
    FRAMES.with(|frames| {
        frames.borrow_mut().insert(id, Box::new(callback));
    });
    FrameId(id)
}

/// Cancel a pending frame callback. Returns false if it already ran.
pub fn cancel_frame(id: FrameId) -> bool {
    FRAMES.with(|frames| frames.borrow_mut().remove(&id.0).is_some())
}

/// Whether a frame callback is still waiting to run.
pub fn is_frame_pending(id: FrameId) -> bool {
    FRAMES.with(|frames| frames.borrow().contains_key(&id.0))
}

/// Number of frame callbacks waiting for the next frame.
pub fn pending_frame_count() -> usize {
    FRAMES.with(|frames| frames.borrow().len())
}

/// Run one frame: every callback requested before this call runs once.
///
/// Callbacks requested while the frame runs wait for the next frame.
/// Returns the number of callbacks run.
pub fn run_frame() -> usize {
    let time = now();
    let queued: Vec<u64> = FRAMES.with(|frames| frames.borrow().keys().copied().collect());

    let mut ran = 0;
    for id in queued {
        // A callback earlier in this frame may have cancelled this one
        let callback = FRAMES.with(|frames| frames.borrow_mut().remove(&id));
        if let Some(callback) = callback {
            callback(time);
            ran += 1;
        }
    }

    FRAME_COUNT.with(|count| count.set(count.get() + 1));
    ran
}

/// Number of frames run so far.
pub fn frame_count() -> u64 {
    FRAME_COUNT.with(|count| count.get())
}

// =============================================================================
// RESET
// =============================================================================

/// Drop every pending timer and frame and rewind the clock (for testing).
pub fn reset_scheduler() {
    TIMERS.with(|timers| timers.borrow_mut().clear());
    TIMER_KEYS.with(|keys| keys.borrow_mut().clear());
    FRAMES.with(|frames| frames.borrow_mut().clear());
    NOW.with(|now| now.set(0.0));
    FRAME_COUNT.with(|count| count.set(0));
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn setup() {
        reset_scheduler();
    }

    #[test]
    fn test_timeout_fires_after_delay() {
        setup();

        let fired = Rc::new(Cell::new(false));
        let fired_clone = fired.clone();
        set_timeout(0.5, move || fired_clone.set(true));

        advance(0.4);
        assert!(!fired.get());
        advance(0.1);
        assert!(fired.get());
        assert_eq!(pending_timer_count(), 0);
    }

    #[test]
    fn test_timers_fire_in_deadline_then_schedule_order() {
        setup();

        let order = Rc::new(RefCell::new(Vec::new()));
        for (label, delay) in [("b", 0.2), ("a", 0.1), ("c", 0.2)] {
            let order = order.clone();
            set_timeout(delay, move || order.borrow_mut().push((label, now())));
        }

        advance(1.0);
        let order = order.borrow();
        let labels: Vec<&str> = order.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert!((order[0].1 - 0.1).abs() < 1e-9);
        assert_eq!(now(), 1.0);
    }

    #[test]
    fn test_long_run_fires_in_order_with_cancellations() {
        setup();

        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut ids = Vec::new();
        for i in 0..500u32 {
            let fired = fired.clone();
            // Scheduled in reverse deadline order
            let delay = f64::from(500 - i) * 0.001;
            ids.push(set_timeout(delay, move || fired.borrow_mut().push(i)));
        }
        for id in ids.iter().step_by(2) {
            assert!(clear_timeout(*id));
        }
        assert_eq!(pending_timer_count(), 250);

        advance(0.25);
        assert_eq!(fired.borrow().len(), 125);
        advance(1.0);

        let fired = fired.borrow();
        assert_eq!(fired.len(), 250);
        assert!(fired.windows(2).all(|pair| pair[0] > pair[1]));
        assert!(fired.iter().all(|i| i % 2 == 1));
        assert_eq!(pending_timer_count(), 0);
    }

    #[test]
    fn test_clear_timeout() {
        setup();

        let fired = Rc::new(Cell::new(false));
        let fired_clone = fired.clone();
        let id = set_timeout(0.1, move || fired_clone.set(true));

        assert!(is_timer_pending(id));
        assert!(clear_timeout(id));
        assert!(!clear_timeout(id));
        advance(1.0);
        assert!(!fired.get());
    }

    #[test]
    fn test_negative_delay_is_zero() {
        setup();

        let fired = Rc::new(Cell::new(false));
        let fired_clone = fired.clone();
        set_timeout(-3.0, move || fired_clone.set(true));
        advance(0.0);
        assert!(fired.get());
    }

    #[test]
    fn test_frame_requested_during_frame_waits() {
        setup();

        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        request_frame(move |_| {
            runs_clone.set(runs_clone.get() + 1);
            let runs_inner = runs_clone.clone();
            request_frame(move |_| runs_inner.set(runs_inner.get() + 1));
        });

        assert_eq!(run_frame(), 1);
        assert_eq!(runs.get(), 1);
        assert_eq!(pending_frame_count(), 1);

        assert_eq!(run_frame(), 1);
        assert_eq!(runs.get(), 2);
        assert_eq!(frame_count(), 2);
    }

    #[test]
    fn test_cancel_frame_from_earlier_callback() {
        setup();

        let second_ran = Rc::new(Cell::new(false));
        let second_ran_clone = second_ran.clone();

        let victim: Rc<Cell<Option<FrameId>>> = Rc::new(Cell::new(None));
        let victim_clone = victim.clone();
        request_frame(move |_| {
            if let Some(id) = victim_clone.get() {
                cancel_frame(id);
            }
        });
        victim.set(Some(request_frame(move |_| second_ran_clone.set(true))));

        assert_eq!(run_frame(), 1);
        assert!(!second_ran.get());
    }
}
