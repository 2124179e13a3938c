//! Publish-subscribe plumbing between the data feed, the controls and the
//! dashboard.
//!
//! [`LocalBus`] dispatches on the calling thread, one message at a time.
//! Handlers never see the bus itself: whatever they publish goes into an
//! [`Outbox`] and is queued behind the message being handled, so every
//! handler runs to completion before the next one starts.

use std::collections::{BTreeMap, VecDeque};

use crate::models::{Dataset, Entry, Meta, PlacesPayload, SummaryRow};
use crate::state::UiState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Topic {
    Meta,
    Summary,
    Places,
    Datasets,
    Entries,
    Init,
    ToolChange,
    StateChange,
}

impl Topic {
    pub fn name(&self) -> &'static str {
        match self {
            Topic::Meta => "data.meta",
            Topic::Summary => "data.summary",
            Topic::Places => "data.places",
            Topic::Datasets => "data.datasets",
            Topic::Entries => "data.entries",
            Topic::Init => "init",
            Topic::ToolChange => "tool.change",
            Topic::StateChange => "state.change",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Payload {
    Meta(Meta),
    Summary(Vec<SummaryRow>),
    Places(PlacesPayload),
    Datasets(Vec<Dataset>),
    Entries(Vec<Entry>),
    State(UiState),
}

#[derive(Debug, Clone)]
pub struct Message {
    pub topic: Topic,
    pub payload: Payload,
}

pub trait Publish {
    fn publish(&mut self, topic: Topic, payload: Payload);
}

pub type Handler = Box<dyn FnMut(&Message, &mut Outbox)>;

pub trait Bus: Publish {
    fn subscribe(&mut self, topic: Topic, handler: Handler);
}

/// Messages published while handling another message.
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<Message>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl Publish for Outbox {
    fn publish(&mut self, topic: Topic, payload: Payload) {
        self.messages.push(Message { topic, payload });
    }
}

#[derive(Default)]
pub struct LocalBus {
    handlers: BTreeMap<Topic, Vec<Handler>>,
    queue: VecDeque<Message>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish everything collected in `outbox`, in order.
    pub fn flush(&mut self, outbox: Outbox) {
        self.queue.extend(outbox.messages);
        self.drain();
    }

    fn drain(&mut self) {
        while let Some(message) = self.queue.pop_front() {
            let Some(handlers) = self.handlers.get_mut(&message.topic) else {
                tracing::trace!(topic = message.topic.name(), "no subscribers");
                continue;
            };
            tracing::trace!(
                topic = message.topic.name(),
                subscribers = handlers.len(),
                "dispatching"
            );
            for handler in handlers.iter_mut() {
                let mut outbox = Outbox::new();
                handler(&message, &mut outbox);
                self.queue.extend(outbox.messages);
            }
        }
    }
}

impl Publish for LocalBus {
    fn publish(&mut self, topic: Topic, payload: Payload) {
        self.queue.push_back(Message { topic, payload });
        self.drain();
    }
}

impl Bus for LocalBus {
    fn subscribe(&mut self, topic: Topic, handler: Handler) {
        self.handlers.entry(topic).or_default().push(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &'static str) -> Handler {
        let log = Rc::clone(log);
        Box::new(move |msg: &Message, _: &mut Outbox| {
            log.borrow_mut().push(format!("{label}:{}", msg.topic.name()));
        })
    }

    #[test]
    fn test_delivers_to_all_subscribers_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = LocalBus::new();
        bus.subscribe(Topic::StateChange, recorder(&log, "a"));
        bus.subscribe(Topic::StateChange, recorder(&log, "b"));
        bus.subscribe(Topic::Meta, recorder(&log, "c"));

        bus.publish(Topic::StateChange, Payload::State(UiState::default()));

        assert_eq!(*log.borrow(), vec!["a:state.change", "b:state.change"]);
    }

    #[test]
    fn test_unsubscribed_topic_is_dropped() {
        let mut bus = LocalBus::new();
        bus.publish(Topic::Summary, Payload::Summary(vec![]));
        assert!(bus.queue.is_empty());
    }

    #[test]
    fn test_nested_publications_run_after_current_handler() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = LocalBus::new();

        let first = Rc::clone(&log);
        bus.subscribe(
            Topic::ToolChange,
            Box::new(move |msg: &Message, out: &mut Outbox| {
                out.publish(Topic::StateChange, msg.payload.clone());
                first.borrow_mut().push("tool:first".to_string());
            }),
        );
        bus.subscribe(Topic::ToolChange, recorder(&log, "tool:second"));
        bus.subscribe(Topic::StateChange, recorder(&log, "state"));

        bus.publish(Topic::ToolChange, Payload::State(UiState::default()));

        assert_eq!(
            *log.borrow(),
            vec!["tool:first", "tool:second:tool.change", "state:state.change"]
        );
    }

    #[test]
    fn test_flush_outbox() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = LocalBus::new();
        bus.subscribe(Topic::Init, recorder(&log, "x"));
        bus.subscribe(Topic::Entries, recorder(&log, "y"));

        let mut outbox = Outbox::new();
        outbox.publish(Topic::Entries, Payload::Entries(vec![]));
        outbox.publish(Topic::Init, Payload::State(UiState::default()));
        assert_eq!(outbox.messages().len(), 2);
        bus.flush(outbox);

        assert_eq!(*log.borrow(), vec!["y:data.entries", "x:init"]);
    }
}
