use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub number: i32,
    pub title: String,
    pub body: String,
    pub proposer: String,
    pub state: String,
    pub closed: bool,
    pub merged: bool,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct VoteRecord {
    pub login: String,
    pub contributor: bool,
    pub choice: String,
    pub last_vote: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRecord {
    pub login: String,
    pub contributor: bool,
}
