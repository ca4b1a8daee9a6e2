// Server module entry point
// Listener setup, connection handling, accept loop and signal handling

pub mod accept_loop;
pub mod connection;
pub mod listener;
pub mod signal;

pub use accept_loop::{run_accept_loop, wait_for_drain};
pub use listener::create_reusable_listener;
pub use signal::{start_signal_handler, SignalHandler};
