use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

mod event;
mod tally;
mod vote;

#[cfg(feature = "github")]
pub mod github;

pub use event::*;
pub use tally::*;
pub use vote::*;

pub type GithubHandle = String;

/// A user's current stance on a single proposal, derived from their
/// latest qualifying comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VoteChoice {
    Agree,
    Disagree,
    Abstain,
    Participating,
    None,
}

impl VoteChoice {
    pub fn is_directional(self) -> bool {
        matches!(
            self,
            VoteChoice::Agree | VoteChoice::Disagree | VoteChoice::Abstain
        )
    }
}

/// Proposal-level status shown to dashboard readers. Never set directly;
/// always the output of the tally engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProposalState {
    #[default]
    Waiting,
    Agreed,
    Blocked,
    Accepted,
    Passed,
    Rejected,
    Dead,
}

/// Derived vote projection for one (proposal, user) pair. `last_vote`
/// stays `None` for users who have only participated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub choice: VoteChoice,
    pub last_vote: Option<chrono::DateTime<chrono::Utc>>,
}
