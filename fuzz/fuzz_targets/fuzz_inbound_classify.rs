//! Fuzz target: inbound message path
//!
//! Splits arbitrary bytes into a topic and a payload, then pushes them
//! through `InboundMessage::new` and `CommandTopics::classify`, verifying:
//! - No panics on oversized or non-UTF-8 input
//! - Only the payload `"1"` on a command feed yields a command
//!
//! cargo fuzz run fuzz_inbound_classify

#![no_main]

use doorwatch::app::commands::{CommandTopics, TRIGGER_PAYLOAD};
use doorwatch::config::SystemConfig;
use doorwatch::telemetry::inbound::{InboundMessage, InboundQueue, TransportEvent};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(split).min(rest.len());
    let (topic_bytes, payload) = rest.split_at(split);
    let Ok(topic) = core::str::from_utf8(topic_bytes) else {
        return;
    };

    let topics = CommandTopics::from_config(&SystemConfig::default());
    if let Some(_cmd) = topics.classify(topic, payload) {
        assert_eq!(payload, TRIGGER_PAYLOAD);
        assert!(topic == topics.reset.as_str() || topic == topics.status.as_str());
    }

    if let Some(msg) = InboundMessage::new(topic, payload) {
        assert_eq!(msg.topic.as_str(), topic);
        assert_eq!(msg.payload.as_slice(), payload);

        let queue = InboundQueue::new();
        assert!(queue.push(TransportEvent::Message(msg)));
        assert!(queue.pop().is_some());
        assert!(queue.pop().is_none());
    }
});
