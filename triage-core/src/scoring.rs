//! Performance scoring for completed tickets
//!
//! Points reward fast completion and lightly penalize lateness:
//!
//! 1. `base_points = priority.weight * category.points`
//! 2. `actual_hours` runs from `date_started` to the completion timestamp,
//!    floored at 0.5 hours so near-zero durations cannot game the bonus.
//! 3. Early or on time: `efficiency = 1.0 + min(0.5, saved / expected)`,
//!    a bonus capped at +50%.
//! 4. Late: `efficiency = max(0.8, 1.0 - (overrun / expected) * 0.2)`,
//!    a penalty floored at -20%.
//! 5. `points = round(base_points * efficiency)`
//!
//! The expected duration is the priority's time limit as frozen into the
//! ticket's deadline window at start time; a priority reconfigured
//! mid-ticket does not move the goalposts. A ticket completed without ever
//! being started scores its unscaled base points.

use crate::category::Category;
use crate::priority::Priority;
use crate::ticket::Ticket;
use chrono::{DateTime, Utc};

/// Minimum accountable working duration, in hours
const MIN_ACTUAL_HOURS: f64 = 0.5;

/// Maximum efficiency bonus for early completion
const MAX_BONUS: f64 = 0.5;

/// Efficiency floor for late completion
const MIN_EFFICIENCY: f64 = 0.8;

/// Penalty slope applied to the relative overrun
const LATE_PENALTY_RATE: f64 = 0.2;

/// Compute the points awarded for completing `ticket` at `now`.
///
/// Pure function over its inputs; persistence of the score and of the
/// agent's counters is the caller's concern.
pub fn completion_points(
    ticket: &Ticket,
    priority: &Priority,
    category: &Category,
    now: DateTime<Utc>,
) -> i64 {
    let base_points = (priority.weight as i64) * (category.points as i64);

    let Some(started) = ticket.date_started else {
        return base_points;
    };

    // The deadline window frozen at start is authoritative; fall back to the
    // priority's configured limit when no window was recorded.
    let expected_hours = ticket
        .expected_completion_at
        .map(|deadline| (deadline - started).num_seconds() as f64 / 3600.0)
        .unwrap_or(priority.time_limit_hours as f64);
    if expected_hours <= 0.0 {
        return base_points;
    }

    let actual_hours = ((now - started).num_seconds() as f64 / 3600.0).max(MIN_ACTUAL_HOURS);

    let efficiency = if actual_hours <= expected_hours {
        1.0 + ((expected_hours - actual_hours) / expected_hours).min(MAX_BONUS)
    } else {
        (1.0 - ((actual_hours - expected_hours) / expected_hours) * LATE_PENALTY_RATE)
            .max(MIN_EFFICIENCY)
    };

    (base_points as f64 * efficiency).round() as i64
}
