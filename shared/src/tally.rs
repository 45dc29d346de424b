use std::collections::{BTreeMap, HashSet};

use crate::{GithubHandle, IntentKind, ProposalState, Vote, VoteChoice, VoteIntent};

/// Result of folding a proposal's comment history: each participant's
/// current vote plus the derived aggregate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub votes: BTreeMap<GithubHandle, Vote>,
    pub state: ProposalState,
}

/// Recomputes the vote projection for one proposal from scratch.
///
/// Intents are folded in ascending timestamp order; a later directional
/// intent supersedes an earlier one, with no memory of past objections.
/// Only contributor votes drive the aggregate state, but every user with
/// a qualifying intent appears in the per-user map.
pub fn tally(
    intents: &[VoteIntent],
    contributors: &HashSet<GithubHandle>,
    closed: bool,
    merged: bool,
) -> Tally {
    let mut ordered: Vec<&VoteIntent> = intents.iter().collect();
    ordered.sort_by_key(|intent| intent.timestamp);

    let mut votes: BTreeMap<GithubHandle, Vote> = BTreeMap::new();
    for intent in ordered {
        let choice = match intent.kind {
            IntentKind::Agree => VoteChoice::Agree,
            IntentKind::Disagree => VoteChoice::Disagree,
            IntentKind::Abstain => VoteChoice::Abstain,
            IntentKind::Participate => {
                votes.entry(intent.author.clone()).or_insert(Vote {
                    choice: VoteChoice::Participating,
                    last_vote: None,
                });
                continue;
            }
            IntentKind::None => continue,
        };

        votes.insert(
            intent.author.clone(),
            Vote {
                choice,
                last_vote: Some(intent.timestamp),
            },
        );
    }

    let state = aggregate_state(&votes, contributors, closed, merged);

    Tally { votes, state }
}

fn aggregate_state(
    votes: &BTreeMap<GithubHandle, Vote>,
    contributors: &HashSet<GithubHandle>,
    closed: bool,
    merged: bool,
) -> ProposalState {
    let counted = |choice: VoteChoice| {
        votes
            .iter()
            .filter(|(login, vote)| vote.choice == choice && contributors.contains(*login))
            .count()
    };

    let agrees = counted(VoteChoice::Agree);
    let disagrees = counted(VoteChoice::Disagree);
    let directional = agrees + disagrees + counted(VoteChoice::Abstain);

    if closed {
        if disagrees == 0 {
            if agrees > 0 {
                ProposalState::Accepted
            } else {
                ProposalState::Passed
            }
        } else if merged {
            ProposalState::Rejected
        } else {
            ProposalState::Dead
        }
    } else if disagrees > 0 {
        ProposalState::Blocked
    } else if directional == 0 {
        ProposalState::Waiting
    } else {
        ProposalState::Agreed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn intent(author: &str, kind: IntentKind, secs: i64) -> VoteIntent {
        VoteIntent {
            author: author.to_string(),
            timestamp: at(secs),
            kind,
        }
    }

    fn contributors(logins: &[&str]) -> HashSet<GithubHandle> {
        logins.iter().map(|login| login.to_string()).collect()
    }

    #[test]
    fn no_comments_on_open_proposal_is_waiting() {
        let result = tally(&[], &contributors(&["alice"]), false, false);
        assert_eq!(result.state, ProposalState::Waiting);
        assert!(result.votes.is_empty());
    }

    #[test]
    fn single_contributor_agreement_is_agreed() {
        let intents = [intent("alice", IntentKind::Agree, 1)];
        let result = tally(&intents, &contributors(&["alice"]), false, false);
        assert_eq!(result.state, ProposalState::Agreed);
        assert_eq!(result.votes["alice"].choice, VoteChoice::Agree);
        assert_eq!(result.votes["alice"].last_vote, Some(at(1)));
    }

    #[test]
    fn latest_directional_intent_wins() {
        let intents = [
            intent("alice", IntentKind::Agree, 1),
            intent("alice", IntentKind::Disagree, 2),
        ];
        let result = tally(&intents, &contributors(&["alice"]), false, false);
        assert_eq!(result.votes["alice"].choice, VoteChoice::Disagree);
        assert_eq!(result.votes["alice"].last_vote, Some(at(2)));
        assert_eq!(result.state, ProposalState::Blocked);
    }

    #[test]
    fn objection_withdrawn_by_later_agreement() {
        let intents = [
            intent("alice", IntentKind::Disagree, 1),
            intent("alice", IntentKind::Agree, 2),
        ];
        let result = tally(&intents, &contributors(&["alice"]), false, false);
        assert_eq!(result.votes["alice"].choice, VoteChoice::Agree);
        assert_eq!(result.state, ProposalState::Agreed);
    }

    #[test]
    fn participation_does_not_touch_last_vote() {
        let intents = [
            intent("alice", IntentKind::Participate, 1),
            intent("bob", IntentKind::Agree, 2),
            intent("bob", IntentKind::Participate, 3),
        ];
        let result = tally(&intents, &contributors(&["alice", "bob"]), false, false);
        assert_eq!(result.votes["alice"].choice, VoteChoice::Participating);
        assert_eq!(result.votes["alice"].last_vote, None);
        assert_eq!(result.votes["bob"].choice, VoteChoice::Agree);
        assert_eq!(result.votes["bob"].last_vote, Some(at(2)));
    }

    #[test]
    fn non_contributor_disagreement_does_not_block() {
        let intents = [
            intent("alice", IntentKind::Agree, 1),
            intent("mallory", IntentKind::Disagree, 2),
        ];
        let result = tally(&intents, &contributors(&["alice"]), false, false);
        assert_eq!(result.state, ProposalState::Agreed);
        // Still visible in the per-user map.
        assert_eq!(result.votes["mallory"].choice, VoteChoice::Disagree);
    }

    #[test]
    fn closed_with_agreement_and_no_objection_is_accepted() {
        let intents = [
            intent("alice", IntentKind::Agree, 1),
            intent("bob", IntentKind::Agree, 2),
        ];
        let result = tally(&intents, &contributors(&["alice", "bob"]), true, true);
        assert_eq!(result.state, ProposalState::Accepted);
    }

    #[test]
    fn closed_without_any_vote_is_passed() {
        let result = tally(&[], &contributors(&["alice"]), true, true);
        assert_eq!(result.state, ProposalState::Passed);
    }

    #[test]
    fn closed_unmerged_with_objection_is_dead() {
        let intents = [intent("alice", IntentKind::Disagree, 1)];
        let result = tally(&intents, &contributors(&["alice"]), true, false);
        assert_eq!(result.state, ProposalState::Dead);
    }

    #[test]
    fn closed_merged_with_objection_is_rejected() {
        let intents = [
            intent("alice", IntentKind::Agree, 1),
            intent("bob", IntentKind::Disagree, 2),
        ];
        let result = tally(&intents, &contributors(&["alice", "bob"]), true, true);
        assert_eq!(result.state, ProposalState::Rejected);
    }

    #[test]
    fn out_of_order_delivery_is_normalized() {
        let intents = [
            intent("alice", IntentKind::Disagree, 5),
            intent("alice", IntentKind::Agree, 9),
            intent("alice", IntentKind::Abstain, 1),
        ];
        let result = tally(&intents, &contributors(&["alice"]), false, false);
        assert_eq!(result.votes["alice"].choice, VoteChoice::Agree);
    }

    #[test]
    fn recompute_is_deterministic() {
        let intents = [
            intent("alice", IntentKind::Agree, 1),
            intent("bob", IntentKind::Participate, 2),
            intent("carol", IntentKind::Disagree, 3),
            intent("carol", IntentKind::Abstain, 4),
        ];
        let contributors = contributors(&["alice", "carol"]);
        let first = tally(&intents, &contributors, false, false);
        let second = tally(&intents, &contributors, false, false);
        assert_eq!(first, second);
    }
}
