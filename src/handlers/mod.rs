pub mod auth;
pub mod checkin;
pub mod events;
pub mod health;
pub mod images;
pub mod participants;
pub mod stats;
pub mod users;

pub use auth::*;
pub use checkin::*;
pub use events::*;
pub use health::*;
pub use images::*;
pub use participants::*;
pub use stats::*;
pub use users::*;

use serde::Serialize;

/// Success envelope: every JSON body is `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}
