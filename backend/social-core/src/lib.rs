//! Posts, comments, likes and shares with transactional counter upkeep.

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod repository;
pub mod services;

pub use domain::AuthenticatedUser;
pub use error::{ServiceError, ServiceResult};
pub use services::{FeedMutation, MutationHandler, MutationOutcome, SocialService};
