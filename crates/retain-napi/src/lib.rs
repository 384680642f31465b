//! Node.js bindings for the retain-core review scheduler.
//!
//! Cards and parameters cross the boundary as plain objects. Timestamps are
//! epoch milliseconds.

// napi-rs requires owned types at the FFI boundary - can't use references
#![allow(clippy::needless_pass_by_value)]
// Millisecond timestamps fit comfortably in i64/f64
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use chrono::{DateTime, Utc};
use napi::bindgen_prelude::*;
use napi_derive::napi;
use rand::rngs::StdRng;
use rand::{thread_rng, SeedableRng};

use retain_core::{
	params::WEIGHT_COUNT, Card, CardState, ParameterSet, ReviewLogEntry, SchedulerError,
	Steps,
};

// ============================================================================
// JS Types
// ============================================================================

/// Card memory state.
#[napi(object)]
#[derive(Clone)]
pub struct JsCard {
	/// "new", "learning", "review" or "relearning"
	pub state: String,
	pub stability: f64,
	pub difficulty: f64,
	/// Recall probability at the last review
	pub retrievability: f64,
	pub ease_factor: f64,
	pub current_step: u32,
	pub review_count: u32,
	pub lapse_count: u32,
	/// Next due time (epoch ms)
	pub due_at_ms: f64,
	/// Last review time (epoch ms), absent for new cards
	pub last_reviewed_at_ms: Option<f64>,
}

/// Scheduler parameters. Omitted fields take their defaults.
#[napi(object)]
#[derive(Clone, Default)]
pub struct JsParameterSet {
	/// FSRS-6 weights (exactly 21)
	pub weights: Option<Vec<f64>>,
	/// Target recall probability (default: 0.9)
	pub request_retention: Option<f64>,
	/// Learning steps in minutes (default: [1, 10])
	pub learning_steps: Option<Vec<f64>>,
	/// Relearning steps in minutes (default: [10])
	pub relearn_steps: Option<Vec<f64>>,
	/// Days after graduating with Good (default: 1)
	pub graduating_interval_good: Option<u32>,
	/// Days after graduating with Easy (default: 4)
	pub graduating_interval_easy: Option<u32>,
	/// Ease factor on graduation (default: 2.5)
	pub starting_ease: Option<f64>,
	/// Multiplier on Hard review intervals (default: 1.2)
	pub hard_multiplier: Option<f64>,
	/// Multiplier on Easy review intervals (default: 1.3)
	pub easy_multiplier: Option<f64>,
	/// Multiplier on every review interval (default: 1.0)
	pub interval_multiplier: Option<f64>,
	/// Post-lapse stability multiplier, 0 to disable (default: 0)
	pub lapse_multiplier: Option<f64>,
	/// Longest interval in days (default: 36500)
	pub maximum_interval: Option<u32>,
	/// Shortest post-lapse interval in days (default: 1)
	pub minimum_lapse_interval: Option<u32>,
	/// Lapses before a card is flagged, 0 to disable (default: 8)
	pub leech_threshold: Option<u32>,
	/// Randomize review intervals by up to ±5% (default: true)
	pub enable_fuzz: Option<bool>,
}

/// Audit record for one review.
#[napi(object)]
pub struct JsReviewLogEntry {
	pub grade: u32,
	pub state_before: String,
	pub state_after: String,
	pub stability_before: f64,
	pub stability_after: f64,
	pub difficulty_before: f64,
	pub difficulty_after: f64,
	pub retrievability: f64,
	pub elapsed_days: f64,
	pub scheduled_days: f64,
	/// Review time (epoch ms)
	pub reviewed_at_ms: f64,
}

/// Result of reviewing a card.
#[napi(object)]
pub struct JsReviewOutcome {
	pub card: JsCard,
	pub log: JsReviewLogEntry,
	/// Whether this review flagged the card as a leech
	pub leech: bool,
}

/// What one grade would schedule.
#[napi(object)]
pub struct JsGradeInterval {
	/// Grade value (1-4)
	pub grade: u32,
	/// "again", "hard", "good" or "easy"
	pub label: String,
	/// Interval until the card is due (ms)
	pub interval_ms: f64,
}

// ============================================================================
// Scheduling
// ============================================================================

/// Default scheduler parameters.
#[napi]
pub fn default_parameters() -> JsParameterSet {
	params_to_js(&retain_core::default_parameters())
}

/// Parse and validate parameters from a JSON string.
///
/// Missing keys take their defaults.
#[napi]
pub fn parse_parameters(json: String) -> Result<JsParameterSet> {
	let params: ParameterSet = serde_json::from_str(&json)
		.map_err(|e| Error::new(Status::InvalidArg, format!("Invalid parameters JSON: {e}")))?;
	params.validate().map_err(scheduler_error_to_napi)?;
	Ok(params_to_js(&params))
}

/// A card that has never been reviewed, due at `now_ms`.
#[napi]
pub fn new_card(now_ms: f64) -> Result<JsCard> {
	Ok(card_to_js(&Card::new(ms_to_datetime(now_ms)?)))
}

/// Review a card with a grade (1 = Again, 2 = Hard, 3 = Good, 4 = Easy).
///
/// # Arguments
///
/// * `card` - Current card state
/// * `grade` - Learner's grade
/// * `now_ms` - Review time (epoch ms)
/// * `params` - Optional scheduler parameters
/// * `seed` - Optional fuzz seed for reproducible intervals
#[napi]
pub fn review(
	card: JsCard,
	grade: u32,
	now_ms: f64,
	params: Option<JsParameterSet>,
	seed: Option<u32>,
) -> Result<JsReviewOutcome> {
	let card = js_to_card(&card)?;
	let params = js_to_params(params.unwrap_or_default())?;
	let now = ms_to_datetime(now_ms)?;
	let grade = u8::try_from(grade).map_err(|_| {
		Error::new(Status::InvalidArg, format!("invalid grade {grade}, expected 1-4"))
	})?;

	let outcome = match seed {
		Some(seed) => {
			let mut rng = StdRng::seed_from_u64(u64::from(seed));
			retain_core::review(&card, grade, &params, now, &mut rng)
		}
		None => retain_core::review(&card, grade, &params, now, &mut thread_rng()),
	}
	.map_err(scheduler_error_to_napi)?;

	Ok(JsReviewOutcome {
		card: card_to_js(&outcome.card),
		log: log_to_js(&outcome.log),
		leech: outcome.leech,
	})
}

/// Interval each grade would produce, without reviewing the card.
///
/// Unfuzzed, in grade order.
#[napi]
pub fn preview_all(
	card: JsCard,
	now_ms: f64,
	params: Option<JsParameterSet>,
) -> Result<Vec<JsGradeInterval>> {
	let card = js_to_card(&card)?;
	let params = js_to_params(params.unwrap_or_default())?;
	let now = ms_to_datetime(now_ms)?;

	Ok(retain_core::preview_all(&card, &params, now)
		.into_iter()
		.map(|(grade, interval)| JsGradeInterval {
			grade: u32::from(grade.value()),
			label: grade.to_string(),
			interval_ms: interval.num_milliseconds() as f64,
		})
		.collect())
}

/// Probability of recalling the card at `now_ms`.
#[napi]
pub fn current_retrievability(
	card: JsCard,
	now_ms: f64,
	params: Option<JsParameterSet>,
) -> Result<f64> {
	let card = js_to_card(&card)?;
	let params = js_to_params(params.unwrap_or_default())?;
	Ok(retain_core::current_retrievability(&card, &params, ms_to_datetime(now_ms)?))
}

/// Library version.
#[napi]
pub fn version() -> String {
	retain_core::VERSION.to_string()
}

// ============================================================================
// Type Conversions
// ============================================================================

fn scheduler_error_to_napi(e: SchedulerError) -> Error {
	Error::new(Status::InvalidArg, e.to_string())
}

fn ms_to_datetime(ms: f64) -> Result<DateTime<Utc>> {
	if !ms.is_finite() {
		return Err(Error::new(Status::InvalidArg, format!("Invalid timestamp: {ms}")));
	}
	DateTime::from_timestamp_millis(ms as i64)
		.ok_or_else(|| Error::new(Status::InvalidArg, format!("Timestamp out of range: {ms}")))
}

fn datetime_to_ms(at: DateTime<Utc>) -> f64 {
	at.timestamp_millis() as f64
}

fn parse_state(state: &str) -> Result<CardState> {
	match state {
		"new" => Ok(CardState::New),
		"learning" => Ok(CardState::Learning),
		"review" => Ok(CardState::Review),
		"relearning" => Ok(CardState::Relearning),
		other => Err(Error::new(Status::InvalidArg, format!("Unknown card state: {other}"))),
	}
}

fn js_to_card(c: &JsCard) -> Result<Card> {
	Ok(Card {
		state: parse_state(&c.state)?,
		stability: c.stability,
		difficulty: c.difficulty,
		retrievability: c.retrievability,
		ease_factor: c.ease_factor,
		current_step: c.current_step,
		review_count: c.review_count,
		lapse_count: c.lapse_count,
		due_at: ms_to_datetime(c.due_at_ms)?,
		last_reviewed_at: c.last_reviewed_at_ms.map(ms_to_datetime).transpose()?,
	})
}

fn card_to_js(c: &Card) -> JsCard {
	JsCard {
		state: c.state.to_string(),
		stability: c.stability,
		difficulty: c.difficulty,
		retrievability: c.retrievability,
		ease_factor: c.ease_factor,
		current_step: c.current_step,
		review_count: c.review_count,
		lapse_count: c.lapse_count,
		due_at_ms: datetime_to_ms(c.due_at),
		last_reviewed_at_ms: c.last_reviewed_at.map(datetime_to_ms),
	}
}

fn log_to_js(l: &ReviewLogEntry) -> JsReviewLogEntry {
	JsReviewLogEntry {
		grade: u32::from(l.grade.value()),
		state_before: l.state_before.to_string(),
		state_after: l.state_after.to_string(),
		stability_before: l.stability_before,
		stability_after: l.stability_after,
		difficulty_before: l.difficulty_before,
		difficulty_after: l.difficulty_after,
		retrievability: l.retrievability,
		elapsed_days: l.elapsed_days,
		scheduled_days: l.scheduled_days,
		reviewed_at_ms: datetime_to_ms(l.reviewed_at),
	}
}

fn js_to_params(p: JsParameterSet) -> Result<ParameterSet> {
	let defaults = ParameterSet::defaults();

	let weights = match p.weights {
		Some(w) => <[f64; WEIGHT_COUNT]>::try_from(w.as_slice()).map_err(|_| {
			scheduler_error_to_napi(SchedulerError::InvalidParameter {
				field: "weights",
				reason: format!("expected {WEIGHT_COUNT} weights, got {}", w.len()),
			})
		})?,
		None => defaults.weights,
	};

	let params = ParameterSet {
		weights,
		request_retention: p.request_retention.unwrap_or(defaults.request_retention),
		learning_steps: p.learning_steps.map_or(defaults.learning_steps, Steps::from_vec),
		relearn_steps: p.relearn_steps.map_or(defaults.relearn_steps, Steps::from_vec),
		graduating_interval_good: p
			.graduating_interval_good
			.unwrap_or(defaults.graduating_interval_good),
		graduating_interval_easy: p
			.graduating_interval_easy
			.unwrap_or(defaults.graduating_interval_easy),
		starting_ease: p.starting_ease.unwrap_or(defaults.starting_ease),
		hard_multiplier: p.hard_multiplier.unwrap_or(defaults.hard_multiplier),
		easy_multiplier: p.easy_multiplier.unwrap_or(defaults.easy_multiplier),
		interval_multiplier: p.interval_multiplier.unwrap_or(defaults.interval_multiplier),
		lapse_multiplier: p.lapse_multiplier.unwrap_or(defaults.lapse_multiplier),
		maximum_interval: p.maximum_interval.unwrap_or(defaults.maximum_interval),
		minimum_lapse_interval: p
			.minimum_lapse_interval
			.unwrap_or(defaults.minimum_lapse_interval),
		leech_threshold: p.leech_threshold.unwrap_or(defaults.leech_threshold),
		enable_fuzz: p.enable_fuzz.unwrap_or(defaults.enable_fuzz),
	};
	params.validate().map_err(scheduler_error_to_napi)?;
	Ok(params)
}

fn params_to_js(p: &ParameterSet) -> JsParameterSet {
	JsParameterSet {
		weights: Some(p.weights.to_vec()),
		request_retention: Some(p.request_retention),
		learning_steps: Some(p.learning_steps.to_vec()),
		relearn_steps: Some(p.relearn_steps.to_vec()),
		graduating_interval_good: Some(p.graduating_interval_good),
		graduating_interval_easy: Some(p.graduating_interval_easy),
		starting_ease: Some(p.starting_ease),
		hard_multiplier: Some(p.hard_multiplier),
		easy_multiplier: Some(p.easy_multiplier),
		interval_multiplier: Some(p.interval_multiplier),
		lapse_multiplier: Some(p.lapse_multiplier),
		maximum_interval: Some(p.maximum_interval),
		minimum_lapse_interval: Some(p.minimum_lapse_interval),
		leech_threshold: Some(p.leech_threshold),
		enable_fuzz: Some(p.enable_fuzz),
	}
}
