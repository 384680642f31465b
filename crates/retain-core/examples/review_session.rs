//! Review Session Example
//!
//! Follows one card from its first study session through a month of reviews:
//! 1. Learn it with two short steps
//! 2. Review it on each due date
//! 3. Forget it once and relearn it
//!
//! Before every answer the four buttons are previewed, the way a flashcard
//! app labels them.
//!
//! Run with: `cargo run --example review_session`

use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use retain_core::{
	current_retrievability, default_parameters, preview_all, review, Card, Grade, ParameterSet,
};

fn format_interval(interval: TimeDelta) -> String {
	if interval < TimeDelta::hours(1) {
		format!("{}m", interval.num_minutes().max(1))
	} else if interval < TimeDelta::days(1) {
		format!("{}h", interval.num_hours())
	} else {
		format!("{}d", interval.num_days())
	}
}

fn show_buttons(card: &Card, params: &ParameterSet, now: DateTime<Utc>) {
	let preview = preview_all(card, params, now);
	let labels: Vec<String> = preview
		.iter()
		.map(|(grade, interval)| format!("{grade} {}", format_interval(*interval)))
		.collect();
	println!("  buttons: {}", labels.join(" · "));
}

fn main() {
	println!("=== Review Session ===\n");

	let params = default_parameters();
	let mut rng = StdRng::seed_from_u64(2024);
	let Some(start) = DateTime::from_timestamp(1_700_000_000, 0) else {
		return;
	};

	// Day 0: first look, two learning steps, then a month of spaced reviews
	// with one lapse in the middle
	let answers = [
		Grade::Good,
		Grade::Good,
		Grade::Good,
		Grade::Easy,
		Grade::Again,
		Grade::Good,
		Grade::Good,
		Grade::Hard,
		Grade::Good,
	];

	let mut card = Card::new(start);
	let mut now = start;

	for grade in answers {
		println!(
			"[{}] {} card, R = {:.2}",
			now.format("%Y-%m-%d %H:%M"),
			card.state,
			current_retrievability(&card, &params, now)
		);
		show_buttons(&card, &params, now);

		let outcome = match review(&card, grade.value(), &params, now, &mut rng) {
			Ok(outcome) => outcome,
			Err(e) => {
				eprintln!("review failed: {e}");
				return;
			}
		};

		println!(
			"  answered {grade}: {} -> {}, S = {:.2}d, D = {:.2}, next in {}",
			outcome.log.state_before,
			outcome.log.state_after,
			outcome.card.stability,
			outcome.card.difficulty,
			format_interval(outcome.log.interval())
		);
		if outcome.leech {
			println!("  (leech: this card keeps lapsing)");
		}
		println!();

		card = outcome.card;
		now = card.due_at;
	}

	println!("=== Summary ===\n");
	println!("Reviews: {}", card.review_count);
	println!("Lapses:  {}", card.lapse_count);
	println!("Ease:    {:.2}", card.ease_factor);
	println!("Next due {}", card.due_at.format("%Y-%m-%d"));
}
