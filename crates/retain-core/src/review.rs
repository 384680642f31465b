//! Review State Machine
//!
//! One call per human review event. Given a card and a grade it decides the
//! phase transition, runs the memory model, plans the interval and returns a
//! new card plus an audit record.
//!
//! ```text
//!   New ──Hard/Good──▶ Learning ──Good (last step)/Easy──▶ Review
//!    │                                                     │  ▲
//!    ├──Easy──────────────────────────────────────────────▶│  │
//!    │                                              Again  ▼  │ Good (last step)/Easy
//!    └──Again──────────────────────────────────────▶ Relearning
//! ```
//!
//! The transition itself ([`compute_transition`]) is side-effect free and
//! takes an already-drawn fuzz factor. [`review`] and the preview module both
//! go through it, so a preview can never disagree with the real review.

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::card::{delta_to_days, Card, CardState, Grade, ReviewLogEntry};
use crate::error::Result;
use crate::interval::{plan_fixed_with_factor, plan_lapse_with_factor, plan_with_factor, step_at};
use crate::memory::{
	draw_fuzz_factor, initial_difficulty, initial_stability, next_stability, post_lapse_stability,
	retrievability, short_term_stability, update_difficulty, MIN_STABILITY,
};
use crate::params::{ParameterSet, MIN_EASE};

/// Ease added on Easy in the review phase.
pub const EASY_EASE_BONUS: f64 = 0.15;
/// Ease removed on a lapse in the review phase.
pub const LAPSE_EASE_PENALTY: f64 = 0.2;

/// Result of one review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
	/// The card after the review
	pub card: Card,
	/// Audit record for the caller to append
	pub log: ReviewLogEntry,
	/// The card just crossed a leech threshold. Suspension is the caller's call.
	pub leech: bool,
}

/// Everything a review decides, before it is applied to a card.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
	/// Phase after the review
	pub state: CardState,
	/// Step index after the review
	pub step: u32,
	/// New stability
	pub stability: f64,
	/// New difficulty
	pub difficulty: f64,
	/// Recall probability at review time
	pub retrievability: f64,
	/// Days since the previous review
	pub elapsed_days: f64,
	/// New ease factor
	pub ease_factor: f64,
	/// Time until the card is due again
	pub interval: TimeDelta,
	/// `interval` in fractional days
	pub scheduled_days: f64,
	/// This review counts as a lapse
	pub lapsed: bool,
}

/// Where the card goes after the review.
#[derive(Clone, Copy, Debug)]
enum Next {
	/// Stay in (or enter) a step list
	Step {
		state: CardState,
		step: usize,
		delay: TimeDelta,
	},
	/// Graduate to review at a fixed day count
	Graduate(u32),
	/// Review via the post-lapse policy
	Lapse,
	/// Review via the planner with a grade multiplier
	Schedule(f64),
}

/// Enter or repeat the step at `index`, or fall through when the list is empty.
fn at_step(state: CardState, steps: &[f64], index: usize, otherwise: Next) -> Next {
	match step_at(steps, index) {
		Some(delay) => Next::Step {
			state,
			step: index.min(steps.len() - 1),
			delay,
		},
		None => otherwise,
	}
}

/// Move past step `index`; past the last step the card graduates.
fn advance(state: CardState, steps: &[f64], index: usize, graduate: Next) -> Next {
	let next = index + 1;
	if next < steps.len() {
		at_step(state, steps, next, graduate)
	} else {
		graduate
	}
}

/// Leech predicate: flagged at `threshold` lapses and every `threshold / 2`
/// lapses after that. A threshold of 0 disables it.
#[must_use]
pub const fn is_leech(lapse_count: u32, threshold: u32) -> bool {
	if threshold == 0 || lapse_count < threshold {
		return false;
	}
	let every = if threshold / 2 == 0 { 1 } else { threshold / 2 };
	(lapse_count - threshold) % every == 0
}

fn same_day(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
	last.is_some_and(|last| last.date_naive() == now.date_naive())
}

/// Compute a review's outcome without touching the card.
///
/// `fuzz_factor` is one draw from [`draw_fuzz_factor`] (or 1.0 for no fuzz).
#[must_use]
pub fn compute_transition(
	card: &Card,
	grade: Grade,
	params: &ParameterSet,
	now: DateTime<Utc>,
	fuzz_factor: f64,
) -> Transition {
	let elapsed_days = card.elapsed_days(now);
	let r = retrievability(elapsed_days, card.stability, params.decay());

	// Memory update
	let (stability, difficulty) = if card.state == CardState::New {
		(
			initial_stability(grade, params),
			initial_difficulty(grade, params),
		)
	} else {
		let s = card.stability.max(MIN_STABILITY);
		let d = card.difficulty;
		let stability = if same_day(card.last_reviewed_at, now) {
			short_term_stability(s, grade, params)
		} else if !grade.is_recall() {
			post_lapse_stability(s, d, r, params)
		} else {
			next_stability(s, d, r, grade, params)
		};
		(stability, update_difficulty(d, grade, params))
	};

	// Phase transition
	let learning = params.learning_steps.as_slice();
	let relearn = params.relearn_steps.as_slice();
	let step = card.current_step as usize;
	let graduate_good = Next::Graduate(params.graduating_interval_good);
	let graduate_easy = Next::Graduate(params.graduating_interval_easy);

	let (next, lapsed) = {
		use CardState::{Learning, New, Relearning, Review};
		use Grade::{Again, Easy, Good, Hard};

		match (card.state, grade) {
			(New, Again) => (at_step(Relearning, relearn, 0, Next::Lapse), false),
			(New, Hard) => (at_step(Learning, learning, 0, graduate_good), false),
			(New, Good) => (advance(Learning, learning, 0, graduate_good), false),
			(New | Learning, Easy) => (graduate_easy, false),

			(Learning, Again) => (at_step(Learning, learning, 0, graduate_good), true),
			(Learning, Hard) => (at_step(Learning, learning, step, graduate_good), false),
			(Learning, Good) => (advance(Learning, learning, step, graduate_good), false),

			(Review, Again) => (at_step(Relearning, relearn, 0, Next::Lapse), true),
			(Review, Hard) => (Next::Schedule(params.hard_multiplier), false),
			(Review, Good) => (Next::Schedule(1.0), false),
			(Review, Easy) => (Next::Schedule(params.easy_multiplier), false),

			(Relearning, Again) => (at_step(Relearning, relearn, 0, Next::Lapse), true),
			(Relearning, Hard) => (at_step(Relearning, relearn, step, Next::Lapse), false),
			(Relearning, Good) => (advance(Relearning, relearn, step, Next::Lapse), false),
			(Relearning, Easy) => (Next::Lapse, false),
		}
	};

	// Ease only moves in the review phase; first graduation resets it
	let ease_factor = match (card.state, grade, next) {
		(CardState::Review, Grade::Again, _) => card.ease_factor - LAPSE_EASE_PENALTY,
		(CardState::Review, Grade::Easy, _) => card.ease_factor + EASY_EASE_BONUS,
		(CardState::New | CardState::Learning, _, Next::Graduate(_)) => params.starting_ease,
		_ => card.ease_factor,
	}
	.max(MIN_EASE);

	let (state, step, scheduled_days, interval) = match next {
		Next::Step { state, step, delay } => (state, step, delta_to_days(delay), delay),
		Next::Graduate(days) => whole_days(plan_fixed_with_factor(days, params, fuzz_factor)),
		Next::Lapse => whole_days(plan_lapse_with_factor(stability, params, fuzz_factor)),
		Next::Schedule(multiplier) => {
			whole_days(plan_with_factor(stability, multiplier, params, fuzz_factor))
		}
	};

	Transition {
		state,
		step: u32::try_from(step).unwrap_or(u32::MAX),
		stability,
		difficulty,
		retrievability: r,
		elapsed_days,
		ease_factor,
		interval,
		scheduled_days,
		lapsed,
	}
}

#[allow(clippy::cast_possible_truncation)]
fn whole_days(days: f64) -> (CardState, usize, f64, TimeDelta) {
	(CardState::Review, 0, days, TimeDelta::days(days as i64))
}

/// Review a card.
///
/// # Arguments
///
/// * `card` - Current card state (not modified)
/// * `grade` - 1 (Again), 2 (Hard), 3 (Good) or 4 (Easy)
/// * `params` - Deck configuration
/// * `now` - Review time
/// * `rng` - Fuzz source; exactly one value is drawn per call
///
/// # Errors
///
/// Returns [`crate::SchedulerError::InvalidGrade`] for a grade outside
/// `1..=4`, before any computation.
#[instrument(level = "debug", skip_all, fields(state = %card.state, grade = grade))]
pub fn review<R: Rng + ?Sized>(
	card: &Card,
	grade: u8,
	params: &ParameterSet,
	now: DateTime<Utc>,
	rng: &mut R,
) -> Result<ReviewOutcome> {
	let grade = Grade::try_from(grade)?;
	let transition = compute_transition(card, grade, params, now, draw_fuzz_factor(rng));
	Ok(apply(card, grade, params, now, transition))
}

fn apply(
	card: &Card,
	grade: Grade,
	params: &ParameterSet,
	now: DateTime<Utc>,
	t: Transition,
) -> ReviewOutcome {
	let lapse_count = if t.lapsed {
		card.lapse_count.saturating_add(1)
	} else {
		card.lapse_count
	};
	let leech = t.lapsed && is_leech(lapse_count, params.leech_threshold);

	debug!(
		from = %card.state,
		to = %t.state,
		stability = t.stability,
		difficulty = t.difficulty,
		retrievability = t.retrievability,
		scheduled_days = t.scheduled_days,
		"review scheduled"
	);
	if leech {
		warn!(lapse_count, threshold = params.leech_threshold, "card flagged as leech");
	}

	let log = ReviewLogEntry {
		grade,
		state_before: card.state,
		state_after: t.state,
		stability_before: card.stability,
		stability_after: t.stability,
		difficulty_before: card.difficulty,
		difficulty_after: t.difficulty,
		retrievability: t.retrievability,
		elapsed_days: t.elapsed_days,
		scheduled_days: t.scheduled_days,
		reviewed_at: now,
	};

	let card = Card {
		state: t.state,
		stability: t.stability,
		difficulty: t.difficulty,
		retrievability: t.retrievability,
		ease_factor: t.ease_factor,
		current_step: t.step,
		review_count: card.review_count.saturating_add(1),
		lapse_count,
		due_at: now.checked_add_signed(t.interval).unwrap_or(DateTime::<Utc>::MAX_UTC),
		last_reviewed_at: Some(now),
	};

	ReviewOutcome { card, log, leech }
}

/// Recall probability of a card at `now`, without reviewing it.
#[must_use]
pub fn current_retrievability(card: &Card, params: &ParameterSet, now: DateTime<Utc>) -> f64 {
	retrievability(card.elapsed_days(now), card.stability, params.decay())
}
