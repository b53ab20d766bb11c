pub mod identity;
pub mod like_state;
pub mod models;

pub use identity::AuthenticatedUser;
pub use like_state::{LikeAction, LikeState};
pub use models::*;
