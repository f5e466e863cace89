//! Run and environment model handed to contributors.
//!
//! # Responsibility
//! - Define the run shapes a contributor may receive.
//! - Define the environment map contributors mutate.
//!
//! # Invariants
//! - The orchestration system owns runs; contributors only borrow them.
//! - One `EnvVars` instance belongs to exactly one run.

pub mod env_vars;
pub mod run;
