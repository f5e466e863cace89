//! Environment contribution extension point.
//!
//! This module defines the contribution capability extensions implement, the
//! per-type classification that steers the bridge between its two entry
//! points, and the ordered registry the orchestration layer drives.

pub mod capability;
pub mod contributor;
pub mod kernel;
