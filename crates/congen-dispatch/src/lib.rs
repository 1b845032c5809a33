//! Congen Dispatch
//!
//! Publishes generation jobs on a durable topic exchange, routed by the caller's
//! identity. Consumers (the generation workers) live outside this repository.

pub mod amqp;
pub mod bus;
pub mod factory;
pub mod memory;
pub mod publisher;

pub use amqp::AmqpBus;
pub use bus::{BusError, BusResult, MessageBus};
pub use factory::create_bus;
pub use memory::{MemoryBus, PublishedMessage};
pub use publisher::DispatchPublisher;
