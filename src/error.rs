use thiserror::Error;

use crate::scoring::outcome::Base;

/// Reasons a scorer operation refused to run.
///
/// Every variant except `Storage` is raised before any state is touched, so a
/// caller can surface the message and let the scorer try again.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("roster is empty: add players before starting a game")]
    EmptyRoster,

    #[error("player '{0}' is not on the roster")]
    PlayerNotInRoster(String),

    #[error("batter out of turn: expected '{expected}', got '{got}'")]
    BatterOutOfTurn { expected: String, got: String },

    #[error("no game in progress")]
    NoActiveGame,

    #[error("a game is already in progress; end or reset it first")]
    GameInProgress,

    #[error("cannot {action} while {batting} is batting")]
    WrongHalf {
        action: &'static str,
        batting: &'static str,
    },

    #[error("runner on {0} needs a fate for this play")]
    MissingRunnerFate(Base),

    #[error("fate given for {0}, but no runner is there")]
    NoRunnerOnBase(Base),

    #[error("two runners placed on {0}")]
    BaseConflict(Base),

    #[error("runner on {from} cannot advance to {to}")]
    InvalidAdvance { from: Base, to: Base },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("season record {0} not found")]
    SeasonRecordNotFound(usize),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ScoringError {
    /// True for errors caused by scorer input rather than by storage.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, ScoringError::Storage(_))
    }
}

/// Failure to parse one of the closed text enums (outcome, half, role, result).
#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
