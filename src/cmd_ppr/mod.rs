//! Subcommand modules for the `ppr` binary.

pub mod nj;
pub mod partition;
pub mod refine;
