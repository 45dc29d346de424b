use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::{ProposalState, VoteChoice};

use crate::db::types::{ProposalRecord, UserRecord, VoteRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub number: u64,
    pub title: String,
    pub proposer: String,
    pub state: ProposalState,
    pub closed: bool,
    pub merged: bool,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl From<ProposalRecord> for ProposalResponse {
    fn from(record: ProposalRecord) -> Self {
        Self {
            number: record.number as u64,
            title: record.title,
            proposer: record.proposer,
            state: record.state.parse().unwrap_or_default(),
            closed: record.closed,
            merged: record.merged,
            opened_at: record.opened_at,
            closed_at: record.closed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub login: String,
    pub contributor: bool,
    pub choice: VoteChoice,
    pub last_vote: Option<DateTime<Utc>>,
}

impl From<VoteRecord> for VoteResponse {
    fn from(record: VoteRecord) -> Self {
        Self {
            choice: record.choice.parse().unwrap_or(VoteChoice::Participating),
            login: record.login,
            contributor: record.contributor,
            last_vote: record.last_vote,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalDetailResponse {
    #[serde(flatten)]
    pub proposal: ProposalResponse,
    pub body: String,
    pub votes: Vec<VoteResponse>,
}

impl ProposalDetailResponse {
    pub fn new(record: ProposalRecord, votes: Vec<VoteRecord>) -> Self {
        let body = record.body.clone();
        Self {
            proposal: record.into(),
            body,
            votes: votes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub contributors: Vec<String>,
    pub others: Vec<String>,
}

impl From<Vec<UserRecord>> for UsersResponse {
    fn from(users: Vec<UserRecord>) -> Self {
        let (contributors, others) = users
            .into_iter()
            .partition::<Vec<_>, _>(|user| user.contributor);
        Self {
            contributors: contributors.into_iter().map(|user| user.login).collect(),
            others: others.into_iter().map(|user| user.login).collect(),
        }
    }
}
