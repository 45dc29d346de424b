use serde::Deserialize;
use thiserror::Error;

/// Webhook payload missing fields the sync needs. Dropped at the boundary
/// and acknowledged to the sender, never propagated into the orchestrator.
#[derive(Debug, Error)]
#[error("malformed {kind} event: {reason}")]
pub struct MalformedEvent {
    pub kind: String,
    pub reason: String,
}

impl MalformedEvent {
    fn new(kind: &str, reason: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}

/// A validated inbound event. Everything the sender can deliver collapses
/// into one of these before it reaches the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEvent {
    /// New comment on an open pull request.
    CommentCreated { number: u64 },
    PullRequestOpened { number: u64 },
    PullRequestClosed { number: u64, merged: bool },
    /// Anything we acknowledge but do not act on.
    Ignored,
}

#[derive(Debug, Deserialize)]
struct IssueCommentPayload {
    action: Option<String>,
    issue: Option<IssuePayload>,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    number: Option<u64>,
    state: Option<String>,
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    action: Option<String>,
    number: Option<u64>,
    pull_request: Option<PullRequestBody>,
}

#[derive(Debug, Deserialize)]
struct PullRequestBody {
    merged: Option<bool>,
    merged_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl WebhookEvent {
    /// Validates a raw delivery into a tagged event. `kind` is the value
    /// of the sender's event-type header.
    pub fn parse(kind: &str, payload: &serde_json::Value) -> Result<Self, MalformedEvent> {
        match kind {
            "issue_comment" => Self::parse_issue_comment(payload),
            "pull_request" => Self::parse_pull_request(payload),
            _ => Ok(WebhookEvent::Ignored),
        }
    }

    fn parse_issue_comment(payload: &serde_json::Value) -> Result<Self, MalformedEvent> {
        let payload: IssueCommentPayload = serde_json::from_value(payload.clone())
            .map_err(|e| MalformedEvent::new("issue_comment", e.to_string()))?;

        if payload.action.as_deref() != Some("created") {
            return Ok(WebhookEvent::Ignored);
        }

        let issue = payload
            .issue
            .ok_or_else(|| MalformedEvent::new("issue_comment", "missing issue"))?;
        let number = issue
            .number
            .ok_or_else(|| MalformedEvent::new("issue_comment", "missing issue.number"))?;

        // Plain issue comments and comments on already-closed proposals
        // are acknowledged without triggering a recompute.
        if issue.pull_request.is_none() || issue.state.as_deref() != Some("open") {
            return Ok(WebhookEvent::Ignored);
        }

        Ok(WebhookEvent::CommentCreated { number })
    }

    fn parse_pull_request(payload: &serde_json::Value) -> Result<Self, MalformedEvent> {
        let payload: PullRequestPayload = serde_json::from_value(payload.clone())
            .map_err(|e| MalformedEvent::new("pull_request", e.to_string()))?;

        let action = match payload.action.as_deref() {
            Some(action @ ("opened" | "closed")) => action,
            _ => return Ok(WebhookEvent::Ignored),
        };

        let number = payload
            .number
            .ok_or_else(|| MalformedEvent::new("pull_request", "missing number"))?;

        Ok(match action {
            "opened" => WebhookEvent::PullRequestOpened { number },
            _ => {
                let merged = payload
                    .pull_request
                    .map(|pr| pr.merged.unwrap_or(false) || pr.merged_at.is_some())
                    .unwrap_or(false);
                WebhookEvent::PullRequestClosed { number, merged }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn comment_on_open_pull_request() {
        let payload = json!({
            "action": "created",
            "issue": {
                "number": 42,
                "state": "open",
                "pull_request": { "url": "https://api.github.com/..." }
            },
            "comment": { "body": ":+1:" }
        });
        assert_eq!(
            WebhookEvent::parse("issue_comment", &payload).unwrap(),
            WebhookEvent::CommentCreated { number: 42 }
        );
    }

    #[test]
    fn comment_on_plain_issue_is_ignored() {
        let payload = json!({
            "action": "created",
            "issue": { "number": 42, "state": "open" }
        });
        assert_eq!(
            WebhookEvent::parse("issue_comment", &payload).unwrap(),
            WebhookEvent::Ignored
        );
    }

    #[test]
    fn comment_on_closed_pull_request_is_ignored() {
        let payload = json!({
            "action": "created",
            "issue": { "number": 42, "state": "closed", "pull_request": {} }
        });
        assert_eq!(
            WebhookEvent::parse("issue_comment", &payload).unwrap(),
            WebhookEvent::Ignored
        );
    }

    #[test]
    fn comment_without_issue_number_is_malformed() {
        let payload = json!({
            "action": "created",
            "issue": { "state": "open", "pull_request": {} }
        });
        let err = WebhookEvent::parse("issue_comment", &payload).unwrap_err();
        assert!(err.reason.contains("issue.number"));
    }

    #[test]
    fn edited_comment_is_ignored() {
        let payload = json!({
            "action": "edited",
            "issue": { "number": 42, "state": "open", "pull_request": {} }
        });
        assert_eq!(
            WebhookEvent::parse("issue_comment", &payload).unwrap(),
            WebhookEvent::Ignored
        );
    }

    #[test]
    fn pull_request_opened() {
        let payload = json!({ "action": "opened", "number": 7 });
        assert_eq!(
            WebhookEvent::parse("pull_request", &payload).unwrap(),
            WebhookEvent::PullRequestOpened { number: 7 }
        );
    }

    #[test]
    fn pull_request_closed_carries_merge_flag() {
        let payload = json!({
            "action": "closed",
            "number": 7,
            "pull_request": { "merged": true }
        });
        assert_eq!(
            WebhookEvent::parse("pull_request", &payload).unwrap(),
            WebhookEvent::PullRequestClosed {
                number: 7,
                merged: true
            }
        );

        let payload = json!({ "action": "closed", "number": 7, "pull_request": {} });
        assert_eq!(
            WebhookEvent::parse("pull_request", &payload).unwrap(),
            WebhookEvent::PullRequestClosed {
                number: 7,
                merged: false
            }
        );
    }

    #[test]
    fn pull_request_without_number_is_malformed() {
        let payload = json!({ "action": "closed" });
        assert!(WebhookEvent::parse("pull_request", &payload).is_err());
    }

    #[test]
    fn unrelated_event_kinds_are_ignored() {
        let payload = json!({ "action": "created" });
        assert_eq!(
            WebhookEvent::parse("push", &payload).unwrap(),
            WebhookEvent::Ignored
        );
        assert_eq!(
            WebhookEvent::parse("pull_request", &json!({ "action": "synchronize", "number": 1 }))
                .unwrap(),
            WebhookEvent::Ignored
        );
    }
}
