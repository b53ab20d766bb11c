//! Like/unlike transitions for a (user, target) pair.
//!
//! The state is never stored: a like row existing *is* `Liked`.

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    NotLiked,
    Liked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Like,
    Unlike,
}

impl LikeState {
    pub fn from_row_exists(exists: bool) -> Self {
        if exists {
            LikeState::Liked
        } else {
            LikeState::NotLiked
        }
    }

    /// Apply `action`, returning the next state or the typed rejection.
    pub fn transition(self, action: LikeAction) -> ServiceResult<LikeState> {
        match (self, action) {
            (LikeState::NotLiked, LikeAction::Like) => Ok(LikeState::Liked),
            (LikeState::Liked, LikeAction::Unlike) => Ok(LikeState::NotLiked),
            (LikeState::Liked, LikeAction::Like) => Err(ServiceError::AlreadyLiked),
            (LikeState::NotLiked, LikeAction::Unlike) => Err(ServiceError::NotLiked),
        }
    }
}

impl LikeAction {
    /// Counter delta applied when the transition succeeds
    pub fn delta(self) -> i64 {
        match self {
            LikeAction::Like => 1,
            LikeAction::Unlike => -1,
        }
    }
}
