pub mod activity;
pub mod clock;
pub mod fetch;
