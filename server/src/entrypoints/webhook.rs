use std::sync::Arc;

use rocket::fairing::AdHoc;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::serde::json::Json;
use rocket::State;

use shared::WebhookEvent;

use crate::db::DB;
use crate::github_pull::GithubClient;
use crate::sync::{self, SyncContext, SyncReport};

/// The sender's event-kind header. Deliveries without it are rejected
/// before the body is even parsed.
pub struct GithubEventHeader(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for GithubEventHeader {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, ()> {
        match request.headers().get_one("X-GitHub-Event") {
            Some(kind) => Outcome::Success(GithubEventHeader(kind.to_string())),
            None => Outcome::Error((Status::BadRequest, ())),
        }
    }
}

/// Always acknowledges: a retry storm from the sender helps nobody.
/// Hard failures are logged for operator follow-up instead.
#[rocket::post("/webhook", data = "<payload>")]
async fn webhook(
    event: GithubEventHeader,
    payload: Json<serde_json::Value>,
    github: &State<Arc<GithubClient>>,
    db: &State<DB>,
) -> Status {
    let event = match WebhookEvent::parse(&event.0, &payload) {
        Ok(event) => event,
        Err(e) => {
            rocket::warn!("Dropping webhook delivery: {e}");
            return Status::Ok;
        }
    };

    let context = SyncContext {
        github: github.inner().clone(),
        db: db.inner().clone(),
    };
    if let Err(e) = sync::handle_event(&context, event).await {
        rocket::error!("Webhook processing failed: {e}");
    }

    Status::Ok
}

#[rocket::post("/update")]
async fn update_all(github: &State<Arc<GithubClient>>, db: &State<DB>) -> Json<SyncReport> {
    let context = SyncContext {
        github: github.inner().clone(),
        db: db.inner().clone(),
    };
    Json(sync::full_resync(&context).await)
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing webhook entrypoints", |rocket| async {
        rocket.mount("/", rocket::routes![webhook, update_all])
    })
}
