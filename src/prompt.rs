//! Learning levels and the prompt templates sent to the completion endpoint.

use std::fmt;
use std::str::FromStr;

/// Audience level selected by the user; it only changes the prompt wording.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LearningLevel {
    /// Primary school learners.
    #[default]
    Child,
    /// Secondary school learners.
    Teenager,
    /// Adults approaching a topic for the first time.
    AdultNovice,
}

impl LearningLevel {
    /// All levels in the order they are offered to the user.
    pub const ALL: [LearningLevel; 3] = [
        LearningLevel::Child,
        LearningLevel::Teenager,
        LearningLevel::AdultNovice,
    ];

    /// Label shown in the selector and substituted into the prompt.
    pub fn label(self) -> &'static str {
        match self {
            LearningLevel::Child => "5-12 year old",
            LearningLevel::Teenager => "Teenager",
            LearningLevel::AdultNovice => "Adult with minimal knowledge",
        }
    }

    /// Short identifier accepted on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            LearningLevel::Child => "child",
            LearningLevel::Teenager => "teenager",
            LearningLevel::AdultNovice => "adult-novice",
        }
    }
}

impl fmt::Display for LearningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string names no known [`LearningLevel`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseLevelError {
    input: String,
}

impl ParseLevelError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known = LearningLevel::ALL
            .iter()
            .map(|level| level.slug())
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "unknown learning level '{}'; expected one of: {}",
            self.input, known
        )
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for LearningLevel {
    type Err = ParseLevelError;

    /// Accepts either the slug or the display label, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LearningLevel::ALL
            .into_iter()
            .find(|level| {
                level.slug().eq_ignore_ascii_case(wanted)
                    || level.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ParseLevelError {
                input: s.to_string(),
            })
    }
}

/// Builds the prompt for the first answer to `query`.
pub fn help_prompt(level: LearningLevel, query: &str) -> String {
    format!(
        "As a {}, I need help with: {}. Please provide a step-by-step explanation.",
        level.label(),
        query
    )
}

/// Builds the prompt asking for a more detailed answer to `query`.
///
/// The amplified query is wrapped by the same template as [`help_prompt`], so
/// the request carries two consecutive periods after the detail sentence.
pub fn detailed_help_prompt(level: LearningLevel, query: &str) -> String {
    help_prompt(
        level,
        &format!("{query}. Please explain it in more detail."),
    )
}
