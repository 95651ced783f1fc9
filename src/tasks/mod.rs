//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expired-entry sweep: removes expired cache entries at configured intervals

mod cleanup;

pub use cleanup::spawn_sweep_task;
