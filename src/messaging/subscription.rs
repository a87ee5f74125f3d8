//! Subscription records and the predicate language that selects which
//! handler sees a given message (C2).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::envelope::Message;
use super::errors::HandlerError;

/// Error side of a handler invocation; `Ok(())` means the handler ran to
/// completion without raising.
pub type HandlerResult = Result<(), HandlerError>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// A subscribed callback. Boxed as a trait object so closures and
/// function items can both be registered without a generic parameter
/// leaking into `Transport`.
pub type Handler = Arc<dyn Fn(Message) -> HandlerFuture + Send + Sync>;

/// Selects which messages a subscription's handler is invoked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    All,
    ByType(String),
    BySource(String),
}

impl Predicate {
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            Predicate::All => true,
            Predicate::ByType(t) => *t == message.message_type,
            Predicate::BySource(s) => *s == message.sender_id,
        }
    }

    fn kind_tag(&self) -> &'static str {
        match self {
            Predicate::All => "all",
            Predicate::ByType(_) => "type",
            Predicate::BySource(_) => "source",
        }
    }
}

/// Identifies a subscription. The predicate kind is embedded in the id
/// itself (rather than requiring a lookup back into the subscription set)
/// so `unsubscribe` can route straight to the right bucket if a transport
/// chooses to shard by kind; a fresh sequence number keeps ids unique
/// within a process regardless of how that sharding is done.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    kind: &'static str,
    sequence: u64,
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.sequence)
    }
}

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl SubscriptionId {
    fn fresh(predicate: &Predicate) -> Self {
        Self {
            kind: predicate.kind_tag(),
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
        }
    }
}

/// `{id, predicate, handler}` as the spec's data model names it.
#[derive(Clone)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub predicate: Predicate,
    pub handler: Handler,
}

impl Subscription {
    pub fn new(predicate: Predicate, handler: Handler) -> Self {
        Self {
            id: SubscriptionId::fresh(&predicate),
            predicate,
            handler,
        }
    }

    pub fn matches(&self, message: &Message) -> bool {
        self.predicate.matches(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(message_type: &str, sender_id: &str) -> Message {
        Message::builder(message_type, sender_id).build()
    }

    #[test]
    fn all_matches_every_message() {
        assert!(Predicate::All.matches(&msg("Ping", "t1")));
        assert!(Predicate::All.matches(&msg("Anything", "t9")));
    }

    #[test]
    fn by_type_matches_only_that_type() {
        let pred = Predicate::ByType("Ping".into());
        assert!(pred.matches(&msg("Ping", "t1")));
        assert!(!pred.matches(&msg("Pong", "t1")));
    }

    #[test]
    fn by_source_matches_only_that_sender() {
        let pred = Predicate::BySource("t1".into());
        assert!(pred.matches(&msg("Ping", "t1")));
        assert!(!pred.matches(&msg("Ping", "t2")));
    }

    #[test]
    fn fresh_ids_are_unique_and_carry_predicate_kind() {
        let a = SubscriptionId::fresh(&Predicate::All);
        let b = SubscriptionId::fresh(&Predicate::ByType("Ping".into()));
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("all-"));
        assert!(b.to_string().starts_with("type-"));
    }
}
