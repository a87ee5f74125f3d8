//! The messaging core (C1 + C2): an in-process pub/sub transport with
//! subscription routing by type / source / wildcard, correlation-id
//! replies, delivery acknowledgements with timeout, and broadcast.

pub mod envelope;
pub mod errors;
pub mod subscription;
pub mod transport;

pub use envelope::{Message, MessageBuilder, DEFAULT_CONTENT_TYPE};
pub use errors::{HandlerError, TransportError};
pub use subscription::{Handler, HandlerFuture, HandlerResult, Predicate, Subscription, SubscriptionId};
pub use transport::{InProcessTransport, TransportConfig};
