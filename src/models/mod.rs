pub mod checkin;
pub mod event;
pub mod participant;
pub mod stats;
pub mod user;

pub use checkin::*;
pub use event::*;
pub use participant::*;
pub use stats::*;
pub use user::*;
