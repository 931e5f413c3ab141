pub mod builder;
pub mod handler;
pub mod listener;

pub use builder::{shutdown_signal, ServerBuilder};
pub use handler::RequestHandler;
pub use listener::bind_tcp;
