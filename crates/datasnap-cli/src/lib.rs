//! Library side of the `datasnap` command-line tool.

pub mod data;
pub mod jobs;
pub mod logging;
