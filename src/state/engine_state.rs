/// Session state definitions for the crawl engine lifecycle
use std::fmt;

/// Represents the lifecycle state of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created but not started
    Idle,

    /// Depth loop in progress
    Running,

    // ===== Terminal States =====
    /// Stopped normally because a budget or the depth limit was reached
    Finished,

    /// Stopped because a round failed or the session was cancelled
    Aborted,
}

impl SessionState {
    /// Returns true if the depth loop can no longer make progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Aborted)
    }

    /// Returns true while the engine is working on the session
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Checks whether moving from this state to `next` is allowed
    ///
    /// Terminal sessions may go back to `Running` only to continue a crawl
    /// from a single resource.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Finished)
                | (Self::Running, Self::Aborted)
                | (Self::Finished, Self::Running)
                | (Self::Aborted, Self::Running)
        )
    }

    /// Converts the state to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Aborted => "aborted",
        }
    }

    /// Parses a state from a database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "running" => Some(Self::Running),
            "finished" => Some(Self::Finished),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }

    /// Returns all possible session states
    pub fn all() -> &'static [SessionState] {
        &[Self::Idle, Self::Running, Self::Finished, Self::Aborted]
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
