use std::sync::Arc;

use rocket::fairing::AdHoc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

use crate::db::DB;
use crate::github_pull::GithubClient;
use crate::sync::{self, SyncContext};
use crate::types::SyncError;

use super::types::{ProposalDetailResponse, ProposalResponse};

#[rocket::get("/")]
async fn list_open(db: &State<DB>) -> Option<Json<Vec<ProposalResponse>>> {
    let proposals = match db.list_open().await {
        Ok(value) => value,
        Err(e) => {
            rocket::error!("Failed to list open proposals: {e}");
            return None;
        }
    };
    Some(Json(proposals.into_iter().map(Into::into).collect()))
}

#[rocket::get("/closed")]
async fn list_closed(db: &State<DB>) -> Option<Json<Vec<ProposalResponse>>> {
    let proposals = match db.list_closed().await {
        Ok(value) => value,
        Err(e) => {
            rocket::error!("Failed to list closed proposals: {e}");
            return None;
        }
    };
    Some(Json(proposals.into_iter().map(Into::into).collect()))
}

#[rocket::get("/<number>")]
async fn get_proposal(number: u64, db: &State<DB>) -> Option<Json<ProposalDetailResponse>> {
    let proposal = match db.find_proposal(number).await {
        Ok(value) => value?,
        Err(e) => {
            rocket::error!("Failed to get proposal #{number}: {e}");
            return None;
        }
    };
    let votes = match db.proposal_votes(number).await {
        Ok(value) => value,
        Err(e) => {
            rocket::error!("Failed to get votes for proposal #{number}: {e}");
            return None;
        }
    };
    Some(Json(ProposalDetailResponse::new(proposal, votes)))
}

#[rocket::post("/<number>/update")]
async fn update_proposal(
    number: u64,
    github: &State<Arc<GithubClient>>,
    db: &State<DB>,
) -> Result<Json<ProposalDetailResponse>, Status> {
    let context = SyncContext {
        github: github.inner().clone(),
        db: db.inner().clone(),
    };

    if let Err(e) = sync::sync_proposal(&context, number).await {
        rocket::error!("Failed to sync proposal #{number}: {e}");
        return Err(match e {
            SyncError::NotFound(_) => Status::NotFound,
            SyncError::SourceUnavailable(_) => Status::BadGateway,
            _ => Status::InternalServerError,
        });
    }

    let proposal = db
        .find_proposal(number)
        .await
        .map_err(|_| Status::InternalServerError)?
        .ok_or(Status::NotFound)?;
    let votes = db
        .proposal_votes(number)
        .await
        .map_err(|_| Status::InternalServerError)?;

    Ok(Json(ProposalDetailResponse::new(proposal, votes)))
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing proposal entrypoints", |rocket| async {
        rocket.mount(
            "/proposals",
            rocket::routes![list_open, list_closed, get_proposal, update_proposal],
        )
    })
}
