//! Git transport and working-copy management.

pub mod mirror;
pub mod parse;
pub mod transport;
pub mod types;

pub use mirror::RepositoryMirror;
pub use transport::{GitCli, Transport};
pub use types::PullOutcome;
