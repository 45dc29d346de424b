use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use votebot_server::github_pull::{self, Config, GithubClient};
use votebot_server::{db, entrypoints};

#[derive(Debug, serde::Deserialize)]
pub struct Env {
    github_token: String,
    /// "owner/repo" of the repository whose pull requests are voted on.
    github_repository: String,
    sleep_duration_in_minutes: Option<u32>,
}

#[rocket::launch]
async fn rocket() -> _ {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty());
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let env = envy::from_env::<Env>().expect("Failed to load environment variables");
    let (owner, repo) = env
        .github_repository
        .split_once('/')
        .expect("GITHUB_REPOSITORY must be of the form owner/repo");

    let github = GithubClient::new(Config {
        token: env.github_token,
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
    .expect("Failed to create GitHub client");

    let sleep_duration =
        Duration::from_secs(env.sleep_duration_in_minutes.unwrap_or(10) as u64 * 60);
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    rocket::build()
        .attach(db::stage())
        .attach(github_pull::stage(github, sleep_duration, running))
        .attach(rocket::fairing::AdHoc::on_shutdown(
            "Stop periodic resync",
            |_| {
                Box::pin(async move {
                    running_clone.store(false, Ordering::Relaxed);
                })
            },
        ))
        .attach(entrypoints::stage())
}
