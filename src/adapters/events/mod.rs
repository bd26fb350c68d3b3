//! Event publishing adapters.
//!
//! - `InMemoryEventBus` - In-process capture for tests
//! - `HttpFanoutPublisher` - Fire-and-forget HTTP delivery to subscribed extensions

mod fanout_publisher;
mod in_memory;

pub use fanout_publisher::{notification_body, HttpFanoutConfig, HttpFanoutPublisher};
pub use in_memory::InMemoryEventBus;
