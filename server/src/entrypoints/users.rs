use rocket::fairing::AdHoc;
use rocket::serde::json::Json;
use rocket::State;

use crate::db::DB;

use super::types::UsersResponse;

#[rocket::get("/")]
async fn list_users(db: &State<DB>) -> Option<Json<UsersResponse>> {
    let users = match db.list_users().await {
        Ok(value) => value,
        Err(e) => {
            rocket::error!("Failed to list users: {e}");
            return None;
        }
    };
    Some(Json(users.into()))
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing user entrypoints", |rocket| async {
        rocket.mount("/users", rocket::routes![list_users])
    })
}
