pub mod failure;
pub mod fetch_state;
pub mod polling;
