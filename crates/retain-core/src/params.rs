//! Scheduler Parameters
//!
//! Everything a deck configures about scheduling lives in one typed struct:
//! the 21 FSRS-6 model weights plus the Anki-style knobs around them
//! (learning steps, graduating intervals, multipliers, leech threshold).
//!
//! A `ParameterSet` is constructed once by the caller and passed by reference
//! into every call. It deserializes with per-field defaults, so a stored
//! config only needs the fields it overrides.

use bon::Builder;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::error::{Result, SchedulerError};

/// Number of model weights in FSRS-6.
pub const WEIGHT_COUNT: usize = 21;

/// Canonical FSRS-6 weights.
///
/// - `w0..w3`: initial stability for Again, Hard, Good, Easy
/// - `w4..w7`: difficulty (initial, grade slope, delta, mean reversion)
/// - `w8..w10`: stability growth on recall
/// - `w11..w14`: post-lapse stability
/// - `w15, w16`: hard penalty, easy bonus
/// - `w17..w19`: same-day (short-term) stability
/// - `w20`: forgetting curve shape
pub const FSRS6_WEIGHTS: [f64; WEIGHT_COUNT] = [
	0.212, 1.2931, 2.3065, 8.2956, 6.4133, 0.8334, 3.0194, 0.001, 1.8722, 0.1666, 0.796, 1.4835,
	0.0614, 0.2629, 1.6483, 0.6014, 1.8729, 0.5425, 0.0912, 0.0658, 0.1542,
];

/// Target probability of recall at the moment a card comes due.
pub const DEFAULT_RETENTION: f64 = 0.9;
/// Ease factor a card receives when it first graduates.
pub const DEFAULT_STARTING_EASE: f64 = 2.5;
/// Lower bound for the ease factor.
pub const MIN_EASE: f64 = 1.3;
/// Longest interval the scheduler will ever grant (days).
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36_500;
/// Upper bound for `maximum_interval` and for any single step (days).
pub const INTERVAL_CEILING: u32 = DEFAULT_MAXIMUM_INTERVAL;

/// Step durations in minutes. Four inline slots cover every common setup.
pub type Steps = SmallVec<[f64; 4]>;

/// Per-deck scheduling configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct ParameterSet {
	/// FSRS-6 model weights `w0..w20`
	#[builder(default = FSRS6_WEIGHTS)]
	pub weights: [f64; WEIGHT_COUNT],
	/// Desired probability of recall when a card comes due, in (0, 1]
	#[builder(default = DEFAULT_RETENTION)]
	pub request_retention: f64,
	/// Learning steps for new cards (minutes)
	#[builder(default = smallvec![1.0, 10.0])]
	pub learning_steps: Steps,
	/// Relearning steps after a lapse (minutes)
	#[builder(default = smallvec![10.0])]
	pub relearn_steps: Steps,
	/// Interval granted when a learning card graduates with Good (days)
	#[builder(default = 1)]
	pub graduating_interval_good: u32,
	/// Interval granted when a card graduates with Easy (days)
	#[builder(default = 4)]
	pub graduating_interval_easy: u32,
	/// Ease factor assigned on first graduation
	#[builder(default = DEFAULT_STARTING_EASE)]
	pub starting_ease: f64,
	/// Interval multiplier for Hard in the review phase
	#[builder(default = 1.2)]
	pub hard_multiplier: f64,
	/// Interval multiplier for Easy in the review phase
	#[builder(default = 1.3)]
	pub easy_multiplier: f64,
	/// Global multiplier on every review interval
	#[builder(default = 1.0)]
	pub interval_multiplier: f64,
	/// Multiplier on stability for post-lapse intervals; 0 defers to the
	/// regular planner
	#[builder(default = 0.0)]
	pub lapse_multiplier: f64,
	/// Longest interval granted (days)
	#[builder(default = DEFAULT_MAXIMUM_INTERVAL)]
	pub maximum_interval: u32,
	/// Shortest interval after a lapse when `lapse_multiplier` is active (days)
	#[builder(default = 1)]
	pub minimum_lapse_interval: u32,
	/// Lapses before a card is flagged as a leech; 0 disables detection
	#[builder(default = 8)]
	pub leech_threshold: u32,
	/// Randomize review intervals slightly so cards don't bunch up
	#[builder(default = true)]
	pub enable_fuzz: bool,
}

impl Default for ParameterSet {
	fn default() -> Self {
		Self::builder().build()
	}
}

impl ParameterSet {
	/// Canonical FSRS-6 weights with Anki-style scheduler defaults.
	#[must_use]
	pub fn defaults() -> Self {
		Self::default()
	}

	/// Weight `w_i`.
	#[inline]
	#[must_use]
	pub const fn w(&self, i: usize) -> f64 {
		self.weights[i]
	}

	/// Forgetting curve shape parameter (`w20`).
	#[inline]
	#[must_use]
	pub const fn decay(&self) -> f64 {
		self.weights[20]
	}

	/// Check every knob against its domain.
	///
	/// The scheduler itself never calls this; it clamps instead. Callers that
	/// build parameters from stored or user input should.
	///
	/// # Errors
	///
	/// Returns [`SchedulerError::InvalidParameter`] naming the first field
	/// outside its domain.
	pub fn validate(&self) -> Result<()> {
		if let Some(i) = self.weights.iter().position(|w| !w.is_finite()) {
			return Err(SchedulerError::invalid_parameter(
				"weights",
				format!("w{i} is not finite"),
			));
		}
		if let Some(i) = self.weights[..4].iter().position(|&w| w <= 0.0) {
			return Err(SchedulerError::invalid_parameter(
				"weights",
				format!("initial stability w{i} must be positive"),
			));
		}
		if !(self.request_retention > 0.0 && self.request_retention <= 1.0) {
			return Err(SchedulerError::invalid_parameter(
				"request_retention",
				format!("{} is outside (0, 1]", self.request_retention),
			));
		}
		check_steps("learning_steps", &self.learning_steps, self.maximum_interval)?;
		check_steps("relearn_steps", &self.relearn_steps, self.maximum_interval)?;
		if self.graduating_interval_good == 0 {
			return Err(SchedulerError::invalid_parameter(
				"graduating_interval_good",
				"must be at least 1 day",
			));
		}
		if self.graduating_interval_easy == 0 {
			return Err(SchedulerError::invalid_parameter(
				"graduating_interval_easy",
				"must be at least 1 day",
			));
		}
		if !(self.starting_ease.is_finite() && self.starting_ease >= MIN_EASE) {
			return Err(SchedulerError::invalid_parameter(
				"starting_ease",
				format!("must be at least {MIN_EASE}"),
			));
		}
		for (field, value) in [
			("hard_multiplier", self.hard_multiplier),
			("easy_multiplier", self.easy_multiplier),
			("interval_multiplier", self.interval_multiplier),
		] {
			if !(value.is_finite() && value > 0.0) {
				return Err(SchedulerError::invalid_parameter(field, "must be positive"));
			}
		}
		if !(self.lapse_multiplier.is_finite() && self.lapse_multiplier >= 0.0) {
			return Err(SchedulerError::invalid_parameter(
				"lapse_multiplier",
				"must be zero or positive",
			));
		}
		if self.maximum_interval == 0 || self.maximum_interval > INTERVAL_CEILING {
			return Err(SchedulerError::invalid_parameter(
				"maximum_interval",
				format!("must be within 1..={INTERVAL_CEILING} days"),
			));
		}
		if self.minimum_lapse_interval == 0 || self.minimum_lapse_interval > self.maximum_interval {
			return Err(SchedulerError::invalid_parameter(
				"minimum_lapse_interval",
				format!("must be within 1..={} days", self.maximum_interval),
			));
		}
		Ok(())
	}
}

fn check_steps(field: &'static str, steps: &[f64], maximum_interval: u32) -> Result<()> {
	let longest = f64::from(maximum_interval.min(INTERVAL_CEILING)) * 24.0 * 60.0;
	match steps.iter().find(|&&m| !(m.is_finite() && m > 0.0 && m <= longest)) {
		Some(bad) => Err(SchedulerError::invalid_parameter(
			field,
			format!("step of {bad} minutes must be positive and at most {longest} minutes"),
		)),
		None => Ok(()),
	}
}

/// Default scheduling parameters.
#[must_use]
pub fn default_parameters() -> ParameterSet {
	ParameterSet::defaults()
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_match_fsrs6() {
		let params = ParameterSet::defaults();
		assert_eq!(params.weights, FSRS6_WEIGHTS);
		assert_eq!(params.w(2), 2.3065);
		assert_eq!(params.decay(), 0.1542);
		assert_eq!(params.learning_steps.as_slice(), &[1.0, 10.0]);
		assert_eq!(params.relearn_steps.as_slice(), &[10.0]);
		assert_eq!(params.graduating_interval_good, 1);
		assert_eq!(params.graduating_interval_easy, 4);
		assert_eq!(params.starting_ease, 2.5);
		assert_eq!(params.hard_multiplier, 1.2);
		assert_eq!(params.easy_multiplier, 1.3);
		assert_eq!(params.leech_threshold, 8);
		assert_eq!(params.request_retention, 0.9);
		assert_eq!(params.maximum_interval, 36_500);
		assert!(params.enable_fuzz);
	}

	#[test]
	fn test_defaults_validate() {
		assert!(default_parameters().validate().is_ok());
	}

	#[test]
	fn test_builder_overrides_single_field() {
		let params = ParameterSet::builder()
			.request_retention(0.85)
			.enable_fuzz(false)
			.build();
		assert_eq!(params.request_retention, 0.85);
		assert!(!params.enable_fuzz);
		assert_eq!(params.weights, FSRS6_WEIGHTS);
	}

	#[test]
	fn test_partial_json_fills_defaults() {
		let params: ParameterSet =
			serde_json::from_str(r#"{"relearn_steps": [], "leech_threshold": 4}"#)
				.expect("valid config");
		assert!(params.relearn_steps.is_empty());
		assert_eq!(params.leech_threshold, 4);
		assert_eq!(params.learning_steps.as_slice(), &[1.0, 10.0]);
		assert_eq!(params.weights, FSRS6_WEIGHTS);
	}

	#[test]
	fn test_validate_rejects_retention_out_of_range() {
		let params = ParameterSet {
			request_retention: 1.2,
			..ParameterSet::default()
		};
		let err = params.validate().expect_err("retention above 1");
		assert!(matches!(
			err,
			SchedulerError::InvalidParameter {
				field: "request_retention",
				..
			}
		));
	}

	#[test]
	fn test_validate_rejects_non_positive_step() {
		let params = ParameterSet {
			learning_steps: smallvec![1.0, 0.0],
			..ParameterSet::default()
		};
		assert!(params.validate().is_err());
	}

	#[test]
	fn test_validate_rejects_nan_weight() {
		let mut params = ParameterSet::default();
		params.weights[9] = f64::NAN;
		let err = params.validate().expect_err("nan weight");
		assert_eq!(err.to_string(), "Invalid parameter `weights`: w9 is not finite");
	}

	#[test]
	fn test_validate_rejects_step_longer_than_maximum_interval() {
		let params = ParameterSet {
			learning_steps: smallvec![1e20],
			..ParameterSet::default()
		};
		assert!(params.validate().is_err());

		let params = ParameterSet {
			maximum_interval: 1,
			relearn_steps: smallvec![24.0 * 60.0 + 1.0],
			..ParameterSet::default()
		};
		assert!(params.validate().is_err());
	}

	#[test]
	fn test_validate_rejects_maximum_interval_above_ceiling() {
		let params = ParameterSet {
			maximum_interval: u32::MAX,
			..ParameterSet::default()
		};
		let err = params.validate().expect_err("maximum interval above ceiling");
		assert!(matches!(
			err,
			SchedulerError::InvalidParameter {
				field: "maximum_interval",
				..
			}
		));
	}

	#[test]
	fn test_validate_rejects_lapse_floor_above_maximum() {
		let params = ParameterSet {
			maximum_interval: 30,
			minimum_lapse_interval: 60,
			..ParameterSet::default()
		};
		assert!(params.validate().is_err());
	}
}
