pub mod config;
pub mod logging;

pub mod batch;
pub mod cost;
pub mod delivery;
pub mod http;
pub mod identity;
pub mod job;
pub mod pacer;
pub mod period;
pub mod report;
pub mod retry;
pub mod subscriptions;
