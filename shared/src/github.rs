use chrono::{DateTime, Utc};
use octocrab::models::{issues::Comment, pulls::PullRequest};
use thiserror::Error;

use crate::GithubHandle;

/// The pull-request fields the sync mirrors locally.
#[derive(Debug, Clone)]
pub struct PrMetadata {
    pub number: u64,
    pub proposer: GithubHandle,
    pub title: String,
    pub body: String,
    pub created: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed: bool,
}

impl PrMetadata {
    pub fn is_merged(&self) -> bool {
        self.merged.is_some()
    }
}

#[derive(Debug, Error)]
#[error("pull request is missing required fields")]
pub struct IncompletePullRequest;

impl TryFrom<PullRequest> for PrMetadata {
    type Error = IncompletePullRequest;

    fn try_from(pr: PullRequest) -> Result<Self, IncompletePullRequest> {
        let body = pr
            .body
            .or(pr.body_text)
            .or(pr.body_html)
            .unwrap_or_default();

        if let (Some(user), Some(created_at), Some(updated_at)) =
            (pr.user, pr.created_at, pr.updated_at)
        {
            Ok(Self {
                number: pr.number,
                proposer: user.login,
                title: pr.title.unwrap_or_default(),
                body,
                created: created_at,
                updated_at,
                merged: pr.merged_at,
                closed_at: pr.closed_at,
                closed: pr.closed_at.is_some(),
            })
        } else {
            Err(IncompletePullRequest)
        }
    }
}

/// One issue comment, reduced to what the vote parser needs.
#[derive(Debug, Clone)]
pub struct CommentRepr {
    pub author: GithubHandle,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl From<Comment> for CommentRepr {
    fn from(comment: Comment) -> Self {
        Self {
            author: comment.user.login,
            // Creation time, not update time: votes are ordered by when
            // they were cast.
            timestamp: comment.created_at,
            text: comment
                .body
                .or(comment.body_html)
                .or(comment.body_text)
                .unwrap_or_default(),
        }
    }
}
