//! CLI command implementations.

pub mod common;
pub mod drag;
pub mod init;
pub mod load;
pub mod periods;
pub mod warm;
