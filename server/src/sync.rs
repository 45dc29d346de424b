use std::collections::BTreeSet;
use std::sync::Arc;

use futures::{stream, StreamExt};
use itertools::{Either, Itertools};
use serde::Serialize;
use tracing::{error, info, instrument};

use shared::{parse_comment, tally, ProposalState, WebhookEvent};

use crate::db::DB;
use crate::github_pull::GithubClient;
use crate::types::SyncError;

/// How many proposals may fetch concurrently during a full resync.
/// Comments within one proposal always fetch and fold sequentially.
const RESYNC_CONCURRENCY: usize = 8;

#[derive(Clone)]
pub struct SyncContext {
    pub github: Arc<GithubClient>,
    pub db: DB,
}

/// Per-proposal outcome of a bulk resync.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub synced: Vec<u64>,
    pub failed: Vec<FailedProposal>,
}

#[derive(Debug, Serialize)]
pub struct FailedProposal {
    pub number: u64,
    pub error: String,
}

/// Refreshes the contributor list and recomputes every open proposal:
/// all externally-open pull requests plus anything still open locally.
/// One proposal's failure never aborts the rest of the batch.
pub async fn full_resync(context: &SyncContext) -> SyncReport {
    match context.github.fetch_collaborators().await {
        Ok(logins) => {
            if let Err(e) = context.db.refresh_contributors(&logins).await {
                error!("Failed to refresh contributors: {e}");
            }
        }
        // Stale contributor flags are better than skipping the resync.
        Err(e) => error!("Failed to fetch collaborators: {e}"),
    }

    let mut numbers = BTreeSet::new();
    match context.github.list_open_pulls().await {
        Ok(open) => numbers.extend(open),
        Err(e) => error!("Failed to list open pull requests: {e}"),
    }
    match context.db.open_numbers().await {
        Ok(open) => numbers.extend(open),
        Err(e) => error!("Failed to list locally-open proposals: {e}"),
    }

    let results: Vec<(u64, Result<ProposalState, SyncError>)> = stream::iter(numbers)
        .map(|number| async move { (number, sync_proposal(context, number).await) })
        .buffer_unordered(RESYNC_CONCURRENCY)
        .collect()
        .await;

    let (synced, failed) = results
        .into_iter()
        .partition_map(|(number, result)| match result {
            Ok(_) => Either::Left(number),
            Err(e) => Either::Right(FailedProposal {
                number,
                error: e.to_string(),
            }),
        });

    let report = SyncReport { synced, failed };
    info!(
        "Full resync finished: {} synced, {} failed",
        report.synced.len(),
        report.failed.len()
    );
    report
}

/// Recomputes one proposal's vote projection from freshly fetched data.
/// Creates the proposal locally on first reference.
#[instrument(skip(context))]
pub async fn sync_proposal(
    context: &SyncContext,
    number: u64,
) -> Result<ProposalState, SyncError> {
    sync_with(context, number, None).await
}

async fn sync_with(
    context: &SyncContext,
    number: u64,
    close: Option<bool>,
) -> Result<ProposalState, SyncError> {
    let mut meta = context.github.fetch_pull_request(number).await?;
    if let Some(merged) = close {
        // The close event can outrun the API's view of the transition.
        meta.closed = true;
        if merged && meta.merged.is_none() {
            meta.merged = Some(meta.closed_at.unwrap_or(meta.updated_at));
        }
    }

    let comments = context.github.fetch_comments(number).await?;

    context.db.ensure_user(&meta.proposer).await?;
    let authors: Vec<_> = comments.iter().map(|comment| &comment.author).unique().collect();
    for author in authors {
        context.db.ensure_user(author).await?;
    }

    let intents: Vec<_> = comments
        .iter()
        .map(|comment| {
            parse_comment(
                &meta.proposer,
                &comment.author,
                &comment.text,
                comment.timestamp,
            )
        })
        .collect();

    let contributors = context.db.contributors().await?;
    let result = tally(&intents, &contributors, meta.closed, meta.is_merged());

    context.db.upsert_proposal(&meta, result.state).await?;
    context
        .db
        .replace_votes(number, result.state, &result.votes)
        .await?;

    info!("Synced proposal #{number}: {}", result.state);
    Ok(result.state)
}

/// Applies one validated webhook event. Replaying an event re-runs the
/// same pure recompute keyed by number, so delivery retries are harmless.
pub async fn handle_event(context: &SyncContext, event: WebhookEvent) -> Result<(), SyncError> {
    match event {
        WebhookEvent::CommentCreated { number } | WebhookEvent::PullRequestOpened { number } => {
            sync_proposal(context, number).await?;
        }
        WebhookEvent::PullRequestClosed { number, merged } => {
            sync_with(context, number, Some(merged)).await?;
        }
        WebhookEvent::Ignored => {}
    }
    Ok(())
}
