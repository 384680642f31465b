//! Card State
//!
//! The per-card memory state the caller stores between reviews, the grade a
//! learner reports, and the audit record each review produces.

use chrono::{DateTime, TimeDelta, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::params::DEFAULT_STARTING_EASE;

/// Difficulty assigned to a card that has never been reviewed.
pub const NEW_CARD_DIFFICULTY: f64 = 5.0;

/// Seconds in a day, for converting durations to fractional days.
pub(crate) const SECONDS_PER_DAY: f64 = 86_400.0;

/// User-reported recall quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
	/// Failed to recall
	#[display("again")]
	Again = 1,
	/// Recalled with serious difficulty
	#[display("hard")]
	Hard = 2,
	/// Recalled after some hesitation
	#[display("good")]
	Good = 3,
	/// Recalled effortlessly
	#[display("easy")]
	Easy = 4,
}

impl Grade {
	/// All grades in ascending order.
	pub const ALL: [Self; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

	/// Numeric value (1-4) as used in the model formulas.
	#[inline]
	#[must_use]
	pub const fn value(self) -> u8 {
		self as u8
	}

	/// Numeric value as a float.
	#[inline]
	#[must_use]
	pub fn as_f64(self) -> f64 {
		f64::from(self.value())
	}

	/// Whether the learner recalled the card at all.
	#[inline]
	#[must_use]
	pub const fn is_recall(self) -> bool {
		!matches!(self, Self::Again)
	}
}

impl TryFrom<u8> for Grade {
	type Error = SchedulerError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(Self::Again),
			2 => Ok(Self::Hard),
			3 => Ok(Self::Good),
			4 => Ok(Self::Easy),
			other => Err(SchedulerError::InvalidGrade(other)),
		}
	}
}

/// Lifecycle phase of a card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
	/// Never reviewed
	#[default]
	#[display("new")]
	New,
	/// Working through the learning steps
	#[display("learning")]
	Learning,
	/// Graduated; scheduled by the memory model
	#[display("review")]
	Review,
	/// Lapsed; working through the relearning steps
	#[display("relearning")]
	Relearning,
}

/// A card's scheduling state.
///
/// Owned by the caller. [`crate::review`] never mutates a card in place; it
/// returns an updated copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
	/// Lifecycle phase
	pub state: CardState,
	/// Days until recall probability decays to the target (0 while new)
	pub stability: f64,
	/// Inherent hardness, 1-10
	pub difficulty: f64,
	/// Recall probability computed at the last review
	pub retrievability: f64,
	/// Legacy SM-2 ease factor (≥ 1.3)
	pub ease_factor: f64,
	/// Index into the active step list; 0 when not stepping
	pub current_step: u32,
	/// Total reviews
	pub review_count: u32,
	/// Total lapses
	pub lapse_count: u32,
	/// When the card should resurface
	pub due_at: DateTime<Utc>,
	/// When the card was last reviewed
	pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl Card {
	/// A fresh card, due immediately.
	#[must_use]
	pub const fn new(now: DateTime<Utc>) -> Self {
		Self {
			state: CardState::New,
			stability: 0.0,
			difficulty: NEW_CARD_DIFFICULTY,
			retrievability: 0.0,
			ease_factor: DEFAULT_STARTING_EASE,
			current_step: 0,
			review_count: 0,
			lapse_count: 0,
			due_at: now,
			last_reviewed_at: None,
		}
	}

	/// Whether the card should be shown at `now`.
	#[must_use]
	pub fn is_due(&self, now: DateTime<Utc>) -> bool {
		self.due_at <= now
	}

	/// Fractional days since the last review (0 if never reviewed or if
	/// `now` precedes it).
	#[must_use]
	pub fn elapsed_days(&self, now: DateTime<Utc>) -> f64 {
		self.last_reviewed_at.map_or(0.0, |last| days_between(last, now))
	}
}

/// Immutable record of one review, for the caller's audit trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewLogEntry {
	/// Grade given
	pub grade: Grade,
	/// State before the review
	pub state_before: CardState,
	/// State after the review
	pub state_after: CardState,
	/// Stability before the review
	pub stability_before: f64,
	/// Stability after the review
	pub stability_after: f64,
	/// Difficulty before the review
	pub difficulty_before: f64,
	/// Difficulty after the review
	pub difficulty_after: f64,
	/// Recall probability at the moment of review
	pub retrievability: f64,
	/// Days since the previous review
	pub elapsed_days: f64,
	/// Interval granted, in fractional days
	pub scheduled_days: f64,
	/// When the review happened
	pub reviewed_at: DateTime<Utc>,
}

impl ReviewLogEntry {
	/// Interval granted by this review.
	#[must_use]
	pub fn interval(&self) -> TimeDelta {
		days_to_delta(self.scheduled_days)
	}
}

/// Fractional days from `from` to `to`, never negative.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
	let seconds = (to - from).num_seconds().max(0);
	seconds as f64 / SECONDS_PER_DAY
}

/// Fractional days as a duration, rounded to the second.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn days_to_delta(days: f64) -> TimeDelta {
	TimeDelta::seconds((days * SECONDS_PER_DAY).round() as i64)
}

/// Duration as fractional days.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn delta_to_days(delta: TimeDelta) -> f64 {
	delta.num_seconds() as f64 / SECONDS_PER_DAY
}

#[cfg(test)]
mod tests {
	use super::*;

	fn epoch() -> DateTime<Utc> {
		DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
	}

	#[test]
	fn test_grade_from_u8() {
		assert_eq!(Grade::try_from(1), Ok(Grade::Again));
		assert_eq!(Grade::try_from(4), Ok(Grade::Easy));
		assert_eq!(Grade::try_from(0), Err(SchedulerError::InvalidGrade(0)));
		assert_eq!(Grade::try_from(5), Err(SchedulerError::InvalidGrade(5)));
	}

	#[test]
	fn test_only_again_is_a_failed_recall() {
		assert!(!Grade::Again.is_recall());
		assert!(Grade::Hard.is_recall());
		assert!(Grade::Good.is_recall());
		assert!(Grade::Easy.is_recall());
	}

	#[test]
	fn test_grade_display() {
		assert_eq!(Grade::Again.to_string(), "again");
		assert_eq!(Grade::Easy.to_string(), "easy");
		assert_eq!(CardState::Relearning.to_string(), "relearning");
	}

	#[test]
	fn test_new_card() {
		let now = epoch();
		let card = Card::new(now);
		assert_eq!(card.state, CardState::New);
		assert!(card.stability.abs() < f64::EPSILON);
		assert!(card.is_due(now));
		assert!(card.last_reviewed_at.is_none());
		assert!(card.elapsed_days(now).abs() < f64::EPSILON);
	}

	#[test]
	fn test_not_due_before_due_at() {
		let now = epoch();
		let card = Card {
			due_at: now + TimeDelta::days(2),
			..Card::new(now)
		};
		assert!(!card.is_due(now + TimeDelta::days(1)));
		assert!(card.is_due(now + TimeDelta::days(2)));
	}

	#[test]
	fn test_elapsed_days_clock_skew() {
		let now = epoch();
		let card = Card {
			last_reviewed_at: Some(now + TimeDelta::hours(3)),
			..Card::new(now)
		};
		// Reviewed "in the future" - treat as no elapsed time
		assert!(card.elapsed_days(now).abs() < f64::EPSILON);
	}

	#[test]
	fn test_elapsed_days_fractional() {
		let now = epoch();
		let card = Card {
			last_reviewed_at: Some(now - TimeDelta::hours(36)),
			..Card::new(now)
		};
		assert!((card.elapsed_days(now) - 1.5).abs() < 1e-9);
	}

	#[test]
	fn test_card_serde_uses_lowercase_state() {
		let card = Card::new(epoch());
		let json = serde_json::to_string(&card).unwrap_or_default();
		assert!(json.contains(r#""state":"new""#));
		let back: Card = serde_json::from_str(&json).unwrap_or_else(|_| Card::new(epoch()));
		assert_eq!(back, card);
	}
}
