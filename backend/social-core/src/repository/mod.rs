pub mod comments;
pub mod likes;
pub mod posts;
pub mod shares;
pub mod users;

pub use comments::CommentRepository;
pub use likes::{LikeRepository, LikeTarget};
pub use posts::PostRepository;
pub use shares::ShareRepository;
pub use users::UserRepository;
