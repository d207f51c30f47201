pub mod repository;
pub mod worktree;

pub use repository::RepoCache;
pub use worktree::Snapshot;
