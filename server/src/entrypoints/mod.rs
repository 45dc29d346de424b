use rocket::fairing::AdHoc;

pub mod proposals;
pub mod types;
pub mod users;
pub mod webhook;

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket
            .attach(proposals::stage())
            .attach(users::stage())
            .attach(webhook::stage())
    })
}
