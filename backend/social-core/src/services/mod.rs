pub mod authorization;
pub mod counters;
pub mod dispatch;
pub mod social;
pub mod transaction;

pub use authorization::{require_authenticated, require_owner};
pub use counters::{apply_delta, Counter, CounterService};
pub use dispatch::{FeedMutation, MutationHandler, MutationOutcome};
pub use social::{DeleteOutcome, LikeOutcome, ShareOutcome, SocialService};
pub use transaction::execute_mutation;
