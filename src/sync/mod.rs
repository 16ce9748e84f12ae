//! Push orchestration over a spawned receiver.

pub mod server_mode;

pub use server_mode::{push_over, sync_push};
