//! Scheduling Preview
//!
//! "Again 10m · Hard 1m · Good 10m · Easy 4d": the interval each grade
//! would produce, without reviewing the card.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;

use crate::card::{Card, Grade};
use crate::memory::draw_fuzz_factor;
use crate::params::ParameterSet;
use crate::review::compute_transition;

/// Interval per grade.
pub type Preview = BTreeMap<Grade, TimeDelta>;

/// Interval each grade would produce, unfuzzed.
///
/// Matches [`crate::review`] exactly whenever fuzz is disabled or the
/// interval is too short to be fuzzed.
#[must_use]
pub fn preview_all(card: &Card, params: &ParameterSet, now: DateTime<Utc>) -> Preview {
	preview_with_factor(card, params, now, 1.0)
}

/// Interval each grade would produce, fuzzed with one draw from `rng`.
///
/// A [`crate::review`] call with an identically seeded generator reproduces
/// the previewed interval for whichever grade is chosen.
pub fn preview_all_with_rng<R: Rng + ?Sized>(
	card: &Card,
	params: &ParameterSet,
	now: DateTime<Utc>,
	rng: &mut R,
) -> Preview {
	preview_with_factor(card, params, now, draw_fuzz_factor(rng))
}

fn preview_with_factor(
	card: &Card,
	params: &ParameterSet,
	now: DateTime<Utc>,
	fuzz_factor: f64,
) -> Preview {
	Grade::ALL
		.iter()
		.map(|&grade| {
			let transition = compute_transition(card, grade, params, now, fuzz_factor);
			(grade, transition.interval)
		})
		.collect()
}
