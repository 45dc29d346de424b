use chrono::{DateTime, Utc};

use crate::GithubHandle;

/// A single comment's parsed directional signal, or mere participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Agree,
    Disagree,
    Abstain,
    Participate,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteIntent {
    pub author: GithubHandle,
    pub timestamp: DateTime<Utc>,
    pub kind: IntentKind,
}

const AGREE_MARKERS: [&str; 3] = [":+1:", ":thumbsup:", "\u{1f44d}"];
const DISAGREE_MARKERS: [&str; 3] = [":-1:", ":thumbsdown:", "\u{1f44e}"];
const ABSTAIN_MARKERS: [&str; 3] = [":hand:", ":raised_hand:", "\u{270b}"];

/// Extracts the vote intent from one comment. Pure: the same input always
/// yields the same output, which is what makes resyncs idempotent.
///
/// A proposer's comments never count on their own proposal, not even as
/// participation. Anyone else without a recognized marker participates.
pub fn parse_comment(
    proposer: &str,
    author: &str,
    body: &str,
    timestamp: DateTime<Utc>,
) -> VoteIntent {
    let kind = if author == proposer {
        IntentKind::None
    } else {
        parse_marker(body).unwrap_or(IntentKind::Participate)
    };

    VoteIntent {
        author: author.to_string(),
        timestamp,
        kind,
    }
}

fn parse_marker(body: &str) -> Option<IntentKind> {
    let body = body.to_lowercase();

    let found = |markers: &[&str]| markers.iter().any(|marker| body.contains(marker));

    if found(&AGREE_MARKERS) {
        Some(IntentKind::Agree)
    } else if found(&DISAGREE_MARKERS) {
        Some(IntentKind::Disagree)
    } else if found(&ABSTAIN_MARKERS) {
        Some(IntentKind::Abstain)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn recognizes_vote_markers() {
        let cases = [
            ("I think this is great :+1:", IntentKind::Agree),
            ("LGTM \u{1f44d}", IntentKind::Agree),
            (":THUMBSUP:", IntentKind::Agree),
            ("not convinced :-1:", IntentKind::Disagree),
            ("\u{1f44e} needs work", IntentKind::Disagree),
            ("sitting this one out :hand:", IntentKind::Abstain),
            ("\u{270b}", IntentKind::Abstain),
        ];

        for (body, expected) in cases {
            let intent = parse_comment("frank", "alice", body, at(0));
            assert_eq!(intent.kind, expected, "body: {body}");
        }
    }

    #[test]
    fn unmarked_comment_counts_as_participation() {
        let intent = parse_comment("frank", "alice", "what about clause 3?", at(0));
        assert_eq!(intent.kind, IntentKind::Participate);
        assert_eq!(intent.author, "alice");
    }

    #[test]
    fn proposer_comments_never_count() {
        let intent = parse_comment("frank", "frank", "obviously :+1: from me", at(0));
        assert_eq!(intent.kind, IntentKind::None);

        let intent = parse_comment("frank", "frank", "bump", at(1));
        assert_eq!(intent.kind, IntentKind::None);
    }

    #[test]
    fn agree_takes_precedence_over_other_markers() {
        let intent = parse_comment("frank", "alice", ":+1: although :-1: for style", at(0));
        assert_eq!(intent.kind, IntentKind::Agree);
    }
}
