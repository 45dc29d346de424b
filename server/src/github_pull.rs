use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

use octocrab::Octocrab;
use rocket::fairing::AdHoc;
use rocket_db_pools::Database;
use serde::Serialize;
use tracing::instrument;

use shared::github::{CommentRepr, PrMetadata};
use shared::GithubHandle;

use crate::db::DB;
use crate::sync::{self, SyncContext};
use crate::types::SyncError;

/// Connection settings for the tracked repository. Created once at
/// process start, immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub owner: String,
    pub repo: String,
}

pub struct GithubClient {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

impl GithubClient {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let octocrab = Octocrab::builder().personal_token(config.token).build()?;
        Ok(Self {
            octocrab,
            owner: config.owner,
            repo: config.repo,
        })
    }

    /// Current collaborators of the tracked repository. These are the
    /// users whose votes count toward consensus decisions.
    #[instrument(skip(self))]
    pub async fn fetch_collaborators(&self) -> Result<Vec<GithubHandle>, SyncError> {
        let route = format!("/repos/{}/{}/collaborators", self.owner, self.repo);
        let mut logins = Vec::new();
        let mut page = 1;
        loop {
            let users: Vec<octocrab::models::Author> = self
                .octocrab
                .get(&route, Some(&PageParams { per_page: 100, page }))
                .await?;
            let last_page = users.len() < 100;
            logins.extend(users.into_iter().map(|user| user.login));
            if last_page {
                break;
            }
            page += 1;
        }
        Ok(logins)
    }

    #[instrument(skip(self))]
    pub async fn fetch_pull_request(&self, number: u64) -> Result<PrMetadata, SyncError> {
        let pr = self
            .octocrab
            .pulls(&self.owner, &self.repo)
            .get(number)
            .await
            .map_err(|e| not_found_or_source(number, e))?;
        Ok(PrMetadata::try_from(pr)?)
    }

    /// Every comment on the pull request, all pages, ascending by
    /// creation time. Callers never see partial pages.
    #[instrument(skip(self))]
    pub async fn fetch_comments(&self, number: u64) -> Result<Vec<CommentRepr>, SyncError> {
        let page = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .list_comments(number)
            .per_page(100)
            .send()
            .await
            .map_err(|e| not_found_or_source(number, e))?;
        let comments = self.octocrab.all_pages(page).await?;

        let mut comments: Vec<CommentRepr> = comments.into_iter().map(Into::into).collect();
        comments.sort_by_key(|comment| comment.timestamp);
        Ok(comments)
    }

    /// Numbers of every externally-open pull request.
    #[instrument(skip(self))]
    pub async fn list_open_pulls(&self) -> Result<Vec<u64>, SyncError> {
        let page = self
            .octocrab
            .pulls(&self.owner, &self.repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(100)
            .send()
            .await?;
        let pulls = self.octocrab.all_pages(page).await?;
        Ok(pulls.into_iter().map(|pr| pr.number).collect())
    }
}

fn not_found_or_source(number: u64, err: octocrab::Error) -> SyncError {
    match &err {
        octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404 => {
            SyncError::NotFound(number)
        }
        _ => err.into(),
    }
}

pub fn stage(github: GithubClient, sleep_duration: Duration, running: Arc<AtomicBool>) -> AdHoc {
    AdHoc::on_ignite("GitHub resync", move |rocket| async move {
        rocket.manage(Arc::new(github)).attach(AdHoc::on_liftoff(
            "Resyncs open proposals every X minutes",
            move |rocket| {
                Box::pin(async move {
                    let db = DB::fetch(rocket)
                        .expect("Failed to get DB connection")
                        .clone();
                    let github: Arc<GithubClient> = rocket
                        .state()
                        .cloned()
                        .expect("Failed to get github client");

                    rocket::tokio::spawn(async move {
                        let context = SyncContext { github, db };
                        let mut interval = rocket::tokio::time::interval(sleep_duration);
                        while running.load(std::sync::atomic::Ordering::Relaxed) {
                            interval.tick().await;

                            let report = sync::full_resync(&context).await;
                            for failed in &report.failed {
                                rocket::error!(
                                    "Resync of proposal #{} failed: {}",
                                    failed.number,
                                    failed.error
                                );
                            }
                        }
                    });
                })
            },
        ))
    })
}
