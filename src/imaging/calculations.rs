//! Pure calculation functions for web image generation.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Quality;

/// Fit `(width, height)` inside a `max_edge` square, preserving aspect ratio.
///
/// Images already inside the box come back unchanged: never upscaled.
/// Neither edge rounds down to zero.
///
/// ```text
/// (2400, 1800), 1200 → (1200, 900)
/// (900, 3000),  1200 → (360, 1200)
/// (800, 600),   1200 → (800, 600)
/// ```
pub fn fit_within(dims: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (w, h) = dims;
    if w <= max_edge && h <= max_edge {
        return (w, h);
    }
    if w >= h {
        let nh = (h as f64 * max_edge as f64 / w as f64).round() as u32;
        (max_edge, nh.max(1))
    } else {
        let nw = (w as f64 * max_edge as f64 / h as f64).round() as u32;
        (nw.max(1), max_edge)
    }
}

/// Qualities the budget search tries, in order.
///
/// Starts at `start` and steps down by `step` while staying at or above
/// `floor`. A start below the floor still gets its single attempt.
///
/// ```text
/// start 85, step 5, floor 30 → 85, 80, 75, …, 35, 30
/// start 20, step 5, floor 30 → 20
/// ```
pub fn quality_schedule(start: Quality, step: u32, floor: Quality) -> Vec<Quality> {
    let mut schedule = vec![start];
    let mut current = start.value() as u32;
    let floor = floor.value() as u32;
    let step = step.max(1);
    while let Some(next) = current.checked_sub(step).filter(|q| *q >= floor) {
        current = next;
        schedule.push(Quality::new(current));
    }
    schedule
}
