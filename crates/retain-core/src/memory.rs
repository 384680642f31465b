//! Memory Model
//!
//! The FSRS-6 mathematics of forgetting.
//!
//! A memory is described by three numbers:
//! 1. **Stability** `S` (days): how slowly it decays
//! 2. **Difficulty** `D` (1-10): how hard the fact is for this learner
//! 3. **Retrievability** `R` (0-1): probability of recall right now
//!
//! Forgetting curve: `R(t, S) = (1 + (t / 9S)^w20)^-1`
//!
//! Every function here is pure. Randomness for fuzzing is supplied by the
//! caller so that scheduling can be replayed.

use rand::Rng;

use crate::card::Grade;
use crate::params::ParameterSet;

/// Difficulty lower bound.
pub const MIN_DIFFICULTY: f64 = 1.0;
/// Difficulty upper bound.
pub const MAX_DIFFICULTY: f64 = 10.0;
/// Smallest stability the model will produce (days).
pub const MIN_STABILITY: f64 = 0.01;
/// Largest stability the model will produce (days).
pub const MAX_STABILITY: f64 = 36_500.0;

/// Intervals shorter than this (days) are never fuzzed.
pub const FUZZ_MIN_INTERVAL: f64 = 2.5;
/// Fuzz factor range: `interval × [1 - FUZZ_SPREAD, 1 + FUZZ_SPREAD]`.
pub const FUZZ_SPREAD: f64 = 0.05;

#[inline]
fn clamp_difficulty(d: f64) -> f64 {
	d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

#[inline]
fn clamp_stability(s: f64) -> f64 {
	if s.is_nan() {
		return MIN_STABILITY;
	}
	s.clamp(MIN_STABILITY, MAX_STABILITY)
}

// ============================================================================
// Forgetting Curve
// ============================================================================

/// Probability that a memory is still retrievable.
///
/// `R = (1 + (t / 9S)^w20)^-1`
///
/// # Arguments
///
/// * `elapsed_days` - Days since the last review (negative treated as 0)
/// * `stability` - Memory stability in days
/// * `decay` - Curve shape `w20`
///
/// # Returns
///
/// Recall probability in [0, 1]. Non-positive stability yields 0 rather
/// than NaN.
#[must_use]
pub fn retrievability(elapsed_days: f64, stability: f64, decay: f64) -> f64 {
	if stability <= 0.0 || !stability.is_finite() {
		return 0.0;
	}
	let t = elapsed_days.max(0.0);
	let r = (1.0 + (t / (9.0 * stability)).powf(decay)).recip();
	r.clamp(0.0, 1.0)
}

/// Days until retrievability falls to `desired_retention`.
///
/// `I = S · ln(r) / ln(0.9)`
///
/// With `r = 0.9` the interval equals the stability. At `r ≥ 1` stability is
/// returned unchanged. Floors at 1 day.
#[must_use]
pub fn interval(stability: f64, desired_retention: f64) -> f64 {
	if desired_retention >= 1.0 {
		return stability.max(1.0);
	}
	let r = desired_retention.max(f64::MIN_POSITIVE);
	(stability * (r.ln() / 0.9_f64.ln())).max(1.0)
}

// ============================================================================
// Initial State
// ============================================================================

/// First-review stability: `S0 = w[grade - 1]`.
#[inline]
#[must_use]
pub fn initial_stability(grade: Grade, params: &ParameterSet) -> f64 {
	clamp_stability(params.w(usize::from(grade.value()) - 1))
}

/// First-review difficulty: `D0 = w4 - w5·(grade - 3)`, clamped to [1, 10].
#[inline]
#[must_use]
pub fn initial_difficulty(grade: Grade, params: &ParameterSet) -> f64 {
	clamp_difficulty(params.w(5).mul_add(-(grade.as_f64() - 3.0), params.w(4)))
}

// ============================================================================
// Difficulty Update
// ============================================================================

/// Next difficulty after a review.
///
/// 1. Grade delta: `+2·w6` (Again), `+w6` (Hard), `0` (Good), `-w6` (Easy)
/// 2. Linear damping toward the ceiling: `D' = D + ΔD·(10 - D)/10`
/// 3. Mean reversion toward `w4`: `D'' = w7·w4 + (1 - w7)·D'`
///
/// Result is clamped to [1, 10].
#[must_use]
pub fn update_difficulty(difficulty: f64, grade: Grade, params: &ParameterSet) -> f64 {
	let w6 = params.w(6);
	let delta = match grade {
		Grade::Again => 2.0 * w6,
		Grade::Hard => w6,
		Grade::Good => 0.0,
		Grade::Easy => -w6,
	};
	let damped = delta.mul_add((MAX_DIFFICULTY - difficulty) / MAX_DIFFICULTY, difficulty);
	let w7 = params.w(7);
	clamp_difficulty(w7.mul_add(params.w(4), (1.0 - w7) * damped))
}

// ============================================================================
// Stability Update
// ============================================================================

/// Stability after a successful recall.
///
/// `S' = S · (e^w8 · (11 - D) · S^-w9 · (e^(w10·(1-R)) - 1) · hard · easy + 1)`
///
/// Where `hard = w15` only for Hard and `easy = w16` only for Easy. Lower
/// retrievability at recall time produces a larger gain (spacing effect).
#[must_use]
pub fn next_stability(
	stability: f64,
	difficulty: f64,
	retrievability: f64,
	grade: Grade,
	params: &ParameterSet,
) -> f64 {
	let hard_penalty = if grade == Grade::Hard { params.w(15) } else { 1.0 };
	let easy_bonus = if grade == Grade::Easy { params.w(16) } else { 1.0 };

	let growth = params.w(8).exp()
		* (11.0 - difficulty)
		* stability.powf(-params.w(9))
		* (params.w(10) * (1.0 - retrievability)).exp_m1()
		* hard_penalty
		* easy_bonus;

	clamp_stability(stability * (growth + 1.0))
}

/// Stability after a lapse. Never exceeds the pre-lapse stability.
///
/// `S' = min(S, w11 · D^-w12 · ((S+1)^w13 - 1) · e^(w14·(1-R)))`
#[must_use]
pub fn post_lapse_stability(
	stability: f64,
	difficulty: f64,
	retrievability: f64,
	params: &ParameterSet,
) -> f64 {
	let forgotten = params.w(11)
		* difficulty.powf(-params.w(12))
		* ((stability + 1.0).powf(params.w(13)) - 1.0)
		* (params.w(14) * (1.0 - retrievability)).exp();

	clamp_stability(forgotten.min(stability))
}

/// Stability after a same-day review.
///
/// `S' = S · e^(w17·(grade - 3 + w18)) · S^-w19`
///
/// For Good and Easy the result never drops below `S`: cramming can fail to
/// help but must not hurt.
#[must_use]
pub fn short_term_stability(stability: f64, grade: Grade, params: &ParameterSet) -> f64 {
	let increase = (params.w(17) * (grade.as_f64() - 3.0 + params.w(18))).exp()
		* stability.powf(-params.w(19));
	let mut next = stability * increase;
	if grade >= Grade::Good {
		next = next.max(stability);
	}
	clamp_stability(next)
}

// ============================================================================
// Fuzz
// ============================================================================

/// Draw one fuzz factor in `[1 - FUZZ_SPREAD, 1 + FUZZ_SPREAD]`.
pub fn draw_fuzz_factor<R: Rng + ?Sized>(rng: &mut R) -> f64 {
	rng.gen_range((1.0 - FUZZ_SPREAD)..=(1.0 + FUZZ_SPREAD))
}

/// Apply an already-drawn fuzz factor.
///
/// Identity when fuzz is disabled or the interval is under
/// [`FUZZ_MIN_INTERVAL`] days.
#[inline]
#[must_use]
pub fn fuzz_with_factor(interval: f64, enabled: bool, factor: f64) -> f64 {
	if enabled && interval >= FUZZ_MIN_INTERVAL {
		interval * factor
	} else {
		interval
	}
}

/// Randomly perturb an interval by up to ±5% so cards reviewed together
/// don't all come due on the same day.
pub fn apply_fuzz<R: Rng + ?Sized>(interval: f64, enabled: bool, rng: &mut R) -> f64 {
	if enabled && interval >= FUZZ_MIN_INTERVAL {
		interval * draw_fuzz_factor(rng)
	} else {
		interval
	}
}
