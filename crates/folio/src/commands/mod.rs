//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod watch;

pub(crate) use build::BuildArgs;
pub(crate) use watch::WatchArgs;
