pub mod dashboard;
pub mod events;
pub mod favorites;
pub mod state;
