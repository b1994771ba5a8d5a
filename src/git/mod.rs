//! Git process boundary.

pub mod runner;

pub use runner::{GitRunner, SystemGit};
