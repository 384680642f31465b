//! # Retain Core
//!
//! Review scheduling for spaced-repetition flashcards, built on the FSRS-6
//! memory model.
//!
//! ## Core Concepts
//!
//! Every card carries a memory state:
//!
//! 1. **Stability** `S` - days for recall probability to decay to the target
//! 2. **Difficulty** `D` - inherent hardness on a 1-10 scale
//! 3. **Retrievability** `R` - probability of recall right now
//!    ```text
//!    R(t, S) = (1 + (t / 9S)^w20)^-1
//!    ```
//!
//! A learner's grade (Again, Hard, Good, Easy) updates `S` and `D`. The next
//! interval is the time until `R` falls to the requested retention:
//!
//! ```text
//! I = S · ln(retention) / ln(0.9)
//! ```
//!
//! Around the model sits an Anki-style phase machine: new cards step through
//! short learning intervals, graduate to review, and drop into relearning when
//! forgotten.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeDelta, Utc};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use retain_core::{default_parameters, preview_all, review, Card, CardState, Grade};
//!
//! let params = default_parameters();
//! let mut rng = StdRng::seed_from_u64(7);
//! let now = Utc::now();
//!
//! let card = Card::new(now);
//!
//! // What would each button do?
//! let preview = preview_all(&card, &params, now);
//! assert_eq!(preview[&Grade::Good], TimeDelta::minutes(10));
//!
//! // Learner pressed Good
//! let outcome = review(&card, 3, &params, now, &mut rng).unwrap();
//! assert_eq!(outcome.card.state, CardState::Learning);
//! assert_eq!(outcome.card.due_at, now + TimeDelta::minutes(10));
//! ```
//!
//! ## Determinism
//!
//! Nothing here reads the clock or a global random generator. `now` and the
//! fuzz source are always passed in, so any review can be replayed.
//!
//! ## References
//!
//! - Ye, J. et al. *A Stochastic Shortest Path Algorithm for Optimizing Spaced
//!   Repetition Scheduling* (KDD 2022) - the DSR model behind FSRS
//! - Wozniak, P. (1990). *Optimization of learning* - SM-2 ease factors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod card;
pub mod error;
pub mod interval;
pub mod memory;
pub mod params;
pub mod preview;
pub mod review;

pub use card::{Card, CardState, Grade, ReviewLogEntry, NEW_CARD_DIFFICULTY};
pub use error::{Result, SchedulerError};
pub use interval::{plan, plan_lapse, step_delay};
pub use memory::{
	apply_fuzz,
	// Initial state
	initial_difficulty,
	initial_stability,
	// Updates
	next_stability,
	post_lapse_stability,
	// Forgetting curve
	retrievability,
	short_term_stability,
	update_difficulty,
	MAX_DIFFICULTY,
	MAX_STABILITY,
	MIN_DIFFICULTY,
	MIN_STABILITY,
};
pub use params::{
	default_parameters, ParameterSet, Steps, FSRS6_WEIGHTS, INTERVAL_CEILING, MIN_EASE,
};
pub use preview::{preview_all, preview_all_with_rng, Preview};
pub use review::{
	compute_transition, current_retrievability, is_leech, review, ReviewOutcome, Transition,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
