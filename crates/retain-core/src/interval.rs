//! Interval Planning
//!
//! Turns a stability into a calendar interval:
//!
//! 1. Invert the forgetting curve at the requested retention
//! 2. Apply the deck's interval multiplier (and any grade multiplier)
//! 3. Fuzz by up to ±5%
//! 4. Round to whole days and clamp to `[1, maximum_interval]`
//!
//! The `*_with_factor` variants take an already-drawn fuzz factor. The review
//! state machine draws exactly one factor per call so that previews can
//! replay a review's arithmetic.

use chrono::TimeDelta;
use rand::Rng;

use crate::memory::{draw_fuzz_factor, fuzz_with_factor, interval};
use crate::params::{ParameterSet, INTERVAL_CEILING};

/// Seconds in [`INTERVAL_CEILING`] days.
#[allow(clippy::cast_lossless)]
const CEILING_SECONDS: f64 = INTERVAL_CEILING as f64 * 86_400.0;

/// Round to whole days and clamp to the deck's bounds, never past
/// [`INTERVAL_CEILING`].
fn finish(days: f64, params: &ParameterSet) -> f64 {
	let max = f64::from(params.maximum_interval.clamp(1, INTERVAL_CEILING));
	if days.is_nan() {
		return 1.0;
	}
	days.round().clamp(1.0, max)
}

/// Review interval (days) for a stability.
pub fn plan<R: Rng + ?Sized>(stability: f64, params: &ParameterSet, rng: &mut R) -> f64 {
	plan_with_factor(stability, 1.0, params, draw_fuzz_factor(rng))
}

/// Post-lapse interval (days) for a stability.
///
/// With a non-zero `lapse_multiplier` the interval is
/// `max(minimum_lapse_interval, S · lapse_multiplier)`; otherwise this is
/// [`plan`].
pub fn plan_lapse<R: Rng + ?Sized>(stability: f64, params: &ParameterSet, rng: &mut R) -> f64 {
	plan_lapse_with_factor(stability, params, draw_fuzz_factor(rng))
}

/// [`plan`] with an extra grade multiplier and a pre-drawn fuzz factor.
#[must_use]
pub fn plan_with_factor(
	stability: f64,
	grade_multiplier: f64,
	params: &ParameterSet,
	fuzz_factor: f64,
) -> f64 {
	let raw = interval(stability, params.request_retention)
		* params.interval_multiplier
		* grade_multiplier;
	finish(fuzz_with_factor(raw, params.enable_fuzz, fuzz_factor), params)
}

/// [`plan_lapse`] with a pre-drawn fuzz factor.
#[must_use]
pub fn plan_lapse_with_factor(stability: f64, params: &ParameterSet, fuzz_factor: f64) -> f64 {
	if params.lapse_multiplier > 0.0 {
		let floor = f64::from(params.minimum_lapse_interval);
		return finish(floor.max(stability * params.lapse_multiplier), params);
	}
	plan_with_factor(stability, 1.0, params, fuzz_factor)
}

/// A fixed day count (graduating intervals) through the same fuzz and clamp.
#[must_use]
pub fn plan_fixed_with_factor(days: u32, params: &ParameterSet, fuzz_factor: f64) -> f64 {
	finish(
		fuzz_with_factor(f64::from(days), params.enable_fuzz, fuzz_factor),
		params,
	)
}

/// Learning/relearning step duration, between one second and
/// [`INTERVAL_CEILING`] days.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn step_delay(minutes: f64) -> TimeDelta {
	let seconds = (minutes * 60.0).round();
	if seconds.is_nan() {
		return TimeDelta::seconds(1);
	}
	let seconds = seconds.clamp(1.0, CEILING_SECONDS) as i64;
	TimeDelta::try_seconds(seconds)
		.unwrap_or_else(|| TimeDelta::days(i64::from(INTERVAL_CEILING)))
}

/// Delay for the step at `index`, clamped to the last step. `None` when the
/// list is empty.
#[must_use]
pub fn step_at(steps: &[f64], index: usize) -> Option<TimeDelta> {
	let last = steps.len().checked_sub(1)?;
	Some(step_delay(steps[index.min(last)]))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	use super::*;

	fn no_fuzz() -> ParameterSet {
		ParameterSet {
			enable_fuzz: false,
			..ParameterSet::defaults()
		}
	}

	#[test]
	fn test_plan_whole_days_at_default_retention() {
		let params = no_fuzz();
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(plan(12.3, &params, &mut rng), 12.0);
		assert_eq!(plan(0.2, &params, &mut rng), 1.0);
	}

	#[test]
	fn test_plan_applies_interval_multiplier() {
		let params = ParameterSet {
			interval_multiplier: 2.0,
			..no_fuzz()
		};
		assert_eq!(plan_with_factor(10.0, 1.0, &params, 1.0), 20.0);
	}

	#[test]
	fn test_plan_grade_multiplier() {
		let params = no_fuzz();
		assert_eq!(plan_with_factor(10.0, 1.3, &params, 1.0), 13.0);
	}

	#[test]
	fn test_plan_clamps_to_maximum() {
		let params = ParameterSet {
			maximum_interval: 365,
			..no_fuzz()
		};
		assert_eq!(plan_with_factor(10_000.0, 1.0, &params, 1.0), 365.0);
	}

	#[test]
	fn test_plan_fuzz_stays_within_five_percent() {
		let params = ParameterSet::defaults();
		let mut rng = StdRng::seed_from_u64(3);
		for _ in 0..500 {
			let days = plan(100.0, &params, &mut rng);
			assert!((95.0..=105.0).contains(&days), "planned {days}");
		}
	}

	#[test]
	fn test_plan_lapse_defers_without_multiplier() {
		let params = no_fuzz();
		assert_eq!(
			plan_lapse_with_factor(6.0, &params, 1.0),
			plan_with_factor(6.0, 1.0, &params, 1.0)
		);
	}

	#[test]
	fn test_plan_lapse_uses_floor_with_multiplier() {
		let params = ParameterSet {
			lapse_multiplier: 0.5,
			minimum_lapse_interval: 3,
			..no_fuzz()
		};
		// 2 × 0.5 = 1 < 3 ⇒ floor
		assert_eq!(plan_lapse_with_factor(2.0, &params, 1.0), 3.0);
		// 20 × 0.5 = 10 > 3
		assert_eq!(plan_lapse_with_factor(20.0, &params, 1.0), 10.0);
	}

	#[test]
	fn test_plan_fixed_short_interval_not_fuzzed() {
		let params = ParameterSet::defaults();
		assert_eq!(plan_fixed_with_factor(1, &params, 1.05), 1.0);
		assert_eq!(plan_fixed_with_factor(20, &params, 1.05), 21.0);
	}

	#[test]
	fn test_step_delay_minutes() {
		assert_eq!(step_delay(10.0), TimeDelta::minutes(10));
		assert_eq!(step_delay(0.5), TimeDelta::seconds(30));
	}

	#[test]
	fn test_step_delay_saturates_huge_steps() {
		let ceiling = TimeDelta::days(i64::from(INTERVAL_CEILING));
		assert_eq!(step_delay(1e20), ceiling);
		assert_eq!(step_delay(f64::INFINITY), ceiling);
		assert_eq!(step_delay(-5.0), TimeDelta::seconds(1));
	}

	#[test]
	fn test_plan_never_exceeds_ceiling() {
		let params = ParameterSet {
			request_retention: 1e-300,
			maximum_interval: u32::MAX,
			..no_fuzz()
		};
		assert_eq!(
			plan_with_factor(30_000.0, 1.0, &params, 1.0),
			f64::from(INTERVAL_CEILING)
		);
	}

	#[test]
	fn test_step_at_clamps_index() {
		let steps = [1.0, 10.0];
		assert_eq!(step_at(&steps, 0), Some(TimeDelta::minutes(1)));
		assert_eq!(step_at(&steps, 5), Some(TimeDelta::minutes(10)));
		assert_eq!(step_at(&[], 0), None);
	}
}
