//! Property tests for the memory model and the review state machine.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use retain_core::memory::interval;
use retain_core::{
	initial_difficulty, post_lapse_stability, preview_all, retrievability, review,
	short_term_stability, update_difficulty, Card, CardState, Grade, ParameterSet, SchedulerError,
	INTERVAL_CEILING, MAX_DIFFICULTY, MIN_DIFFICULTY,
};

fn epoch() -> DateTime<Utc> {
	DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn grade() -> impl Strategy<Value = Grade> {
	prop::sample::select(Grade::ALL.to_vec())
}

fn state() -> impl Strategy<Value = CardState> {
	prop::sample::select(vec![
		CardState::New,
		CardState::Learning,
		CardState::Review,
		CardState::Relearning,
	])
}

prop_compose! {
	fn card()(
		state in state(),
		stability in 0.01f64..1000.0,
		difficulty in 1.0f64..=10.0,
		step in 0u32..3,
		lapses in 0u32..20,
		age_minutes in 0i64..(400 * 24 * 60),
	) -> (Card, DateTime<Utc>) {
		let last = epoch();
		let card = Card {
			state,
			stability,
			difficulty,
			retrievability: 1.0,
			ease_factor: 2.5,
			current_step: step,
			review_count: lapses + 1,
			lapse_count: lapses,
			due_at: last,
			last_reviewed_at: (state != CardState::New).then_some(last),
		};
		(card, last + TimeDelta::minutes(age_minutes))
	}
}

prop_compose! {
	fn extreme_params()(maximum_interval in 1u32..=INTERVAL_CEILING)(
		request_retention in prop_oneof![1e-300f64..1e-6, 0.01f64..=1.0],
		learning in prop::collection::vec(1e-6f64..=1.0, 0..4),
		relearn in prop::collection::vec(1e-6f64..=1.0, 0..4),
		graduating_interval_good in 1u32..=u32::MAX,
		graduating_interval_easy in 1u32..=u32::MAX,
		hard_multiplier in 1e-6f64..1e6,
		easy_multiplier in 1e-6f64..1e6,
		interval_multiplier in 1e-6f64..1e6,
		lapse_multiplier in prop_oneof![Just(0.0f64), 1e-6f64..1e6],
		minimum_lapse_interval in 1u32..=maximum_interval,
		maximum_interval in Just(maximum_interval),
		enable_fuzz in any::<bool>(),
	) -> ParameterSet {
		// Steps up to the longest one validation accepts
		let longest = f64::from(maximum_interval) * 24.0 * 60.0;
		ParameterSet {
			request_retention,
			learning_steps: learning.iter().map(|f| f * longest).collect(),
			relearn_steps: relearn.iter().map(|f| f * longest).collect(),
			graduating_interval_good,
			graduating_interval_easy,
			hard_multiplier,
			easy_multiplier,
			interval_multiplier,
			lapse_multiplier,
			maximum_interval,
			minimum_lapse_interval,
			enable_fuzz,
			..ParameterSet::defaults()
		}
	}
}

proptest! {
	#[test]
	fn difficulty_stays_in_bounds(d in 1.0f64..=10.0, grade in grade()) {
		let params = ParameterSet::defaults();
		let updated = update_difficulty(d, grade, &params);
		prop_assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&updated));
		let initial = initial_difficulty(grade, &params);
		prop_assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&initial));
	}

	#[test]
	fn recall_is_certain_with_no_elapsed_time(s in 0.01f64..36500.0) {
		let decay = ParameterSet::defaults().decay();
		prop_assert!((retrievability(0.0, s, decay) - 1.0).abs() < 1e-12);
	}

	#[test]
	fn recall_never_rises_with_time(
		s in 0.01f64..1000.0,
		t1 in 0.0f64..1000.0,
		dt in 0.0f64..1000.0,
	) {
		let decay = ParameterSet::defaults().decay();
		prop_assert!(retrievability(t1 + dt, s, decay) <= retrievability(t1, s, decay));
	}

	#[test]
	fn interval_grows_with_stability(
		s in 0.01f64..10_000.0,
		ds in 0.0f64..10_000.0,
		r in 0.5f64..0.99,
	) {
		prop_assert!(interval(s + ds, r) >= interval(s, r));
	}

	#[test]
	fn same_day_success_never_shrinks_stability(s in 0.01f64..36500.0, easy in any::<bool>()) {
		let grade = if easy { Grade::Easy } else { Grade::Good };
		prop_assert!(short_term_stability(s, grade, &ParameterSet::defaults()) >= s);
	}

	#[test]
	fn lapse_never_raises_stability(
		s in 0.01f64..36500.0,
		d in 1.0f64..=10.0,
		r in 0.0f64..=1.0,
	) {
		prop_assert!(post_lapse_stability(s, d, r, &ParameterSet::defaults()) <= s);
	}

	#[test]
	fn out_of_range_grade_is_rejected(
		(card, now) in card(),
		grade in prop_oneof![Just(0u8), 5u8..=255],
	) {
		let before = card.clone();
		let params = ParameterSet::defaults();
		let result = review(&card, grade, &params, now, &mut StdRng::seed_from_u64(1));
		prop_assert_eq!(result.err(), Some(SchedulerError::InvalidGrade(grade)));
		prop_assert_eq!(card, before);
	}

	#[test]
	fn preview_covers_every_grade((card, now) in card()) {
		let preview = preview_all(&card, &ParameterSet::defaults(), now);
		prop_assert_eq!(preview.len(), 4);
		prop_assert!(preview.values().all(|d| *d > TimeDelta::zero()));
	}

	#[test]
	fn review_moves_due_date_forward(
		(card, now) in card(),
		grade in grade(),
		seed in any::<u64>(),
	) {
		let params = ParameterSet::defaults();
		let mut rng = StdRng::seed_from_u64(seed);
		let outcome = review(&card, grade.value(), &params, now, &mut rng).unwrap();
		prop_assert!(outcome.card.due_at > now);
		prop_assert_eq!(outcome.card.review_count, card.review_count + 1);
		prop_assert!(outcome.card.lapse_count >= card.lapse_count);
		prop_assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&outcome.card.difficulty));
		prop_assert!(outcome.card.stability > 0.0);
	}

	#[test]
	fn accepted_parameters_never_break_scheduling(
		params in extreme_params(),
		(card, now) in card(),
		grade in grade(),
		seed in any::<u64>(),
	) {
		prop_assert!(params.validate().is_ok());

		let preview = preview_all(&card, &params, now);
		prop_assert_eq!(preview.len(), 4);
		prop_assert!(preview.values().all(|d| *d > TimeDelta::zero()));

		let mut rng = StdRng::seed_from_u64(seed);
		let outcome = review(&card, grade.value(), &params, now, &mut rng).unwrap();
		prop_assert!(outcome.card.due_at > now);
		prop_assert!(outcome.log.scheduled_days <= f64::from(params.maximum_interval));
	}
}
