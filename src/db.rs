pub mod user_repo;
pub use user_repo::{UserRepository, UserStore};
pub mod workspace_repo;
pub use workspace_repo::{WorkspaceRepository, WorkspaceStore};
