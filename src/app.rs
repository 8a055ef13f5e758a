pub mod activity;
pub mod orchestrator;
pub mod poller;
pub mod scheduler;
pub mod trigger;
