//! Git access through the system `git` binary

pub mod system_git;

pub use system_git::SystemGit;
