//! Error types for scheduling operations.

/// Errors that can occur while scheduling a review.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
	/// Grade outside `1..=4` (Again, Hard, Good, Easy).
	#[error("Invalid grade {0}: must be 1 (again), 2 (hard), 3 (good) or 4 (easy)")]
	InvalidGrade(u8),

	/// A parameter set field is outside its domain.
	#[error("Invalid parameter `{field}`: {reason}")]
	InvalidParameter {
		/// Name of the offending field
		field: &'static str,
		/// What is wrong with it
		reason: String,
	},
}

impl SchedulerError {
	/// Check if this error was caused by the grade rather than the configuration.
	#[must_use]
	pub const fn is_invalid_grade(&self) -> bool {
		matches!(self, Self::InvalidGrade(_))
	}

	pub(crate) fn invalid_parameter(field: &'static str, reason: impl Into<String>) -> Self {
		Self::InvalidParameter {
			field,
			reason: reason.into(),
		}
	}
}

/// Result type alias for scheduling operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
