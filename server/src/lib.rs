pub mod db;
pub mod entrypoints;
pub mod github_pull;
pub mod sync;
pub mod types;
