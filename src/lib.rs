// Library root: re-exports all modules so integration tests and the season
// orchestrator can access the crate's public API.

pub mod audit;
pub mod config;
pub mod db;
pub mod injury;
pub mod roster;
