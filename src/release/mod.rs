//! Release side of the pipeline
//!
//! - [`trigger`]: which VCS events start a release
//! - [`bundle`]: the fixed set of files one release carries
//! - [`notes`]: generated or locally rendered release notes
//! - [`github`]: the release API and its `gh` implementation
//! - [`publisher`]: the join plus the single release call

pub mod bundle;
pub mod github;
pub mod notes;
pub mod publisher;
pub mod trigger;

