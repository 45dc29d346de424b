use std::collections::{BTreeMap, HashSet};

use rocket::fairing::{self, AdHoc};
use rocket::{Build, Rocket};
use rocket_db_pools::Database;
use sqlx::PgPool;

use shared::github::PrMetadata;
use shared::{GithubHandle, ProposalState, Vote};

pub mod types;

use types::{ProposalRecord, UserRecord, VoteRecord};

#[derive(Database, Clone, Debug)]
#[database("votebot")]
pub struct DB(PgPool);

impl DB {
    /// Creates the user on first sync encounter. An existing row keeps
    /// its contributor flag.
    pub async fn ensure_user(&self, login: &str) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO users (login) VALUES ($1) ON CONFLICT (login) DO NOTHING")
            .bind(login)
            .execute(&self.0)
            .await?;
        Ok(())
    }

    /// Replaces the contributor set wholesale: everyone in `logins` ends
    /// up flagged, everyone else unflagged. One transaction.
    pub async fn refresh_contributors(&self, logins: &[GithubHandle]) -> sqlx::Result<()> {
        let mut tx = self.0.begin().await?;

        sqlx::query("UPDATE users SET contributor = FALSE WHERE contributor")
            .execute(tx.as_mut())
            .await?;

        for login in logins {
            sqlx::query(
                r#"
                INSERT INTO users (login, contributor) VALUES ($1, TRUE)
                ON CONFLICT (login) DO UPDATE SET contributor = TRUE
                "#,
            )
            .bind(login)
            .execute(tx.as_mut())
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn contributors(&self) -> sqlx::Result<HashSet<GithubHandle>> {
        let logins: Vec<(String,)> = sqlx::query_as("SELECT login FROM users WHERE contributor")
            .fetch_all(&self.0)
            .await?;
        Ok(logins.into_iter().map(|(login,)| login).collect())
    }

    pub async fn list_users(&self) -> sqlx::Result<Vec<UserRecord>> {
        sqlx::query_as("SELECT login, contributor FROM users ORDER BY login")
            .fetch_all(&self.0)
            .await
    }

    pub async fn upsert_proposal(
        &self,
        meta: &PrMetadata,
        state: ProposalState,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO proposals
                (number, title, body, proposer, state, closed, merged,
                 opened_at, closed_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (number) DO UPDATE
            SET title = EXCLUDED.title,
                body = EXCLUDED.body,
                proposer = EXCLUDED.proposer,
                state = EXCLUDED.state,
                closed = EXCLUDED.closed,
                merged = EXCLUDED.merged,
                closed_at = EXCLUDED.closed_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(meta.number as i32)
        .bind(&meta.title)
        .bind(&meta.body)
        .bind(&meta.proposer)
        .bind(state.to_string())
        .bind(meta.closed)
        .bind(meta.is_merged())
        .bind(meta.created)
        .bind(meta.closed_at)
        .bind(meta.updated_at)
        .execute(&self.0)
        .await?;
        Ok(())
    }

    /// Full replacement of a proposal's vote projection. Delete, insert
    /// and state update commit together, so a crash mid-write leaves the
    /// previous projection intact.
    pub async fn replace_votes(
        &self,
        number: u64,
        state: ProposalState,
        votes: &BTreeMap<GithubHandle, Vote>,
    ) -> sqlx::Result<()> {
        let mut tx = self.0.begin().await?;

        let (proposal_id,): (i32,) = sqlx::query_as("SELECT id FROM proposals WHERE number = $1")
            .bind(number as i32)
            .fetch_one(tx.as_mut())
            .await?;

        sqlx::query("DELETE FROM votes WHERE proposal_id = $1")
            .bind(proposal_id)
            .execute(tx.as_mut())
            .await?;

        for (login, vote) in votes {
            sqlx::query(
                r#"
                INSERT INTO votes (proposal_id, user_id, choice, last_vote)
                SELECT $1, id, $3, $4 FROM users WHERE login = $2
                "#,
            )
            .bind(proposal_id)
            .bind(login)
            .bind(vote.choice.to_string())
            .bind(vote.last_vote)
            .execute(tx.as_mut())
            .await?;
        }

        sqlx::query("UPDATE proposals SET state = $2 WHERE id = $1")
            .bind(proposal_id)
            .bind(state.to_string())
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_proposal(&self, number: u64) -> sqlx::Result<Option<ProposalRecord>> {
        sqlx::query_as(
            r#"
            SELECT number, title, body, proposer, state, closed, merged,
                   opened_at, closed_at, updated_at
            FROM proposals WHERE number = $1
            "#,
        )
        .bind(number as i32)
        .fetch_optional(&self.0)
        .await
    }

    pub async fn proposal_votes(&self, number: u64) -> sqlx::Result<Vec<VoteRecord>> {
        sqlx::query_as(
            r#"
            SELECT u.login, u.contributor, v.choice, v.last_vote
            FROM votes v
            JOIN users u ON u.id = v.user_id
            JOIN proposals p ON p.id = v.proposal_id
            WHERE p.number = $1
            ORDER BY u.login
            "#,
        )
        .bind(number as i32)
        .fetch_all(&self.0)
        .await
    }

    pub async fn list_open(&self) -> sqlx::Result<Vec<ProposalRecord>> {
        self.list_proposals(false).await
    }

    pub async fn list_closed(&self) -> sqlx::Result<Vec<ProposalRecord>> {
        self.list_proposals(true).await
    }

    async fn list_proposals(&self, closed: bool) -> sqlx::Result<Vec<ProposalRecord>> {
        sqlx::query_as(
            r#"
            SELECT number, title, body, proposer, state, closed, merged,
                   opened_at, closed_at, updated_at
            FROM proposals WHERE closed = $1
            ORDER BY number DESC
            "#,
        )
        .bind(closed)
        .fetch_all(&self.0)
        .await
    }

    pub async fn open_numbers(&self) -> sqlx::Result<Vec<u64>> {
        let rows: Vec<(i32,)> = sqlx::query_as("SELECT number FROM proposals WHERE NOT closed")
            .fetch_all(&self.0)
            .await?;
        Ok(rows.into_iter().map(|(number,)| number as u64).collect())
    }
}

async fn run_migrations(rocket: Rocket<Build>) -> fairing::Result {
    match DB::fetch(&rocket) {
        Some(db) => match sqlx::migrate!("./migrations").run(&**db).await {
            Ok(_) => Ok(rocket),
            Err(e) => {
                tracing::error!("Failed to initialize SQLx database: {}", e);
                Err(rocket)
            }
        },
        None => Err(rocket),
    }
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("SQLx Stage", |rocket| async {
        rocket
            .attach(DB::init())
            .attach(AdHoc::try_on_ignite("SQLx Migrations", run_migrations))
    })
}
