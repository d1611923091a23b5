pub mod bank;
pub mod clock;
pub mod config;
pub mod duration;
pub mod import;
pub mod ledger;
pub mod models;
pub mod reconcile;
pub mod sync;
pub mod token_store;
