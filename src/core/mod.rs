//! Process-wide state: shutdown flag and the resources Ctrl+C must release.

mod state;

pub use state::{is_shutdown, register_scratch_dir, register_server, setup_shutdown_handler};
