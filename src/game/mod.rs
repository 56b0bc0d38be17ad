//! Game simulation modules

pub mod actions;
pub mod geometry;
pub mod physics;
pub mod room;
pub mod sim;
pub mod snapshot;
pub mod state;
pub mod ticker;

pub use room::{LeaveOutcome, RoomError, RoomRegistry, SeatHandle, SeatId};
