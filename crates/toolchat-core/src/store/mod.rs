//! Message store
//!
//! Ordered transcripts keyed by conversation id. The outer lock is held only to find or
//! create a conversation; each transcript has its own lock, so unrelated conversations
//! never contend with each other.

mod history;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::types::{Message, MessageRole};

type Transcript = Arc<Mutex<Vec<Message>>>;

/// In-memory transcripts for every conversation in the process
#[derive(Debug, Default)]
pub struct MessageStore {
    conversations: RwLock<HashMap<String, Transcript>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn transcript(&self, id: &str) -> Option<Transcript> {
        self.conversations.read().get(id).cloned()
    }

    fn transcript_or_create(&self, id: &str) -> Transcript {
        if let Some(existing) = self.transcript(id) {
            return existing;
        }
        Arc::clone(
            self.conversations
                .write()
                .entry(id.to_string())
                .or_default(),
        )
    }

    /// Append a message, creating the conversation if needed
    pub fn append(&self, id: &str, message: Message) {
        self.transcript_or_create(id).lock().push(message);
    }

    /// Append several messages in order under one lock
    pub fn extend(&self, id: &str, messages: impl IntoIterator<Item = Message>) {
        self.transcript_or_create(id).lock().extend(messages);
    }

    /// Snapshot of the transcript; empty if the conversation does not exist
    pub fn get(&self, id: &str) -> Vec<Message> {
        self.transcript(id)
            .map(|t| t.lock().clone())
            .unwrap_or_default()
    }

    /// Create the conversation seeded with one system message. No-op if it exists.
    ///
    /// Returns `true` if the conversation was created.
    pub fn ensure(&self, id: &str, system_prompt: &str) -> bool {
        if self.transcript(id).is_some() {
            return false;
        }
        let mut conversations = self.conversations.write();
        if conversations.contains_key(id) {
            return false;
        }
        conversations.insert(
            id.to_string(),
            Arc::new(Mutex::new(vec![Message::system(system_prompt)])),
        );
        true
    }

    /// Replace the transcript with a single system message
    pub fn reset(&self, id: &str, system_prompt: &str) {
        let transcript = self.transcript_or_create(id);
        let mut messages = transcript.lock();
        messages.clear();
        messages.push(Message::system(system_prompt));
    }

    /// Rewrite the leading system message, inserting one if the transcript has none
    pub fn set_system_prompt(&self, id: &str, system_prompt: &str) {
        let transcript = self.transcript_or_create(id);
        let mut messages = transcript.lock();
        match messages.first_mut() {
            Some(first) if first.role == MessageRole::System => {
                first.content = system_prompt.to_string();
            }
            _ => messages.insert(0, Message::system(system_prompt)),
        }
    }

    /// Drop a conversation. Returns `true` if it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.conversations.write().remove(id).is_some()
    }

    /// Whether the conversation exists
    pub fn contains(&self, id: &str) -> bool {
        self.conversations.read().contains_key(id)
    }

    /// Ids of all conversations, in no particular order
    pub fn conversation_ids(&self) -> Vec<String> {
        self.conversations.read().keys().cloned().collect()
    }

    /// Number of messages in a conversation
    pub fn len(&self, id: &str) -> usize {
        self.transcript(id).map(|t| t.lock().len()).unwrap_or(0)
    }

    /// Whether the conversation is absent or empty
    pub fn is_empty(&self, id: &str) -> bool {
        self.len(id) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_seeds_once() {
        let store = MessageStore::new();
        assert!(store.ensure("c1", "be helpful"));
        assert!(!store.ensure("c1", "ignored"));

        let messages = store.get("c1");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], Message::system("be helpful"));
    }

    #[test]
    fn test_append_preserves_order() {
        let store = MessageStore::new();
        store.ensure("c1", "sys");
        store.append("c1", Message::user("one"));
        store.extend("c1", vec![Message::assistant("two"), Message::user("three")]);

        let contents: Vec<String> = store.get("c1").into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["sys", "one", "two", "three"]);
    }

    #[test]
    fn test_unknown_conversation_is_empty() {
        let store = MessageStore::new();
        assert!(store.get("nope").is_empty());
        assert!(store.is_empty("nope"));
        assert!(!store.contains("nope"));
    }

    #[test]
    fn test_reset_and_set_system_prompt() {
        let store = MessageStore::new();
        store.ensure("c1", "old");
        store.append("c1", Message::user("hi"));

        store.set_system_prompt("c1", "new");
        assert_eq!(store.get("c1")[0].content, "new");
        assert_eq!(store.len("c1"), 2);

        store.reset("c1", "fresh");
        assert_eq!(store.get("c1"), vec![Message::system("fresh")]);
    }

    #[test]
    fn test_set_system_prompt_inserts_when_missing() {
        let store = MessageStore::new();
        store.append("c1", Message::user("hi"));
        store.set_system_prompt("c1", "sys");

        let messages = store.get("c1");
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].content, "hi");
    }

    #[test]
    fn test_remove() {
        let store = MessageStore::new();
        store.ensure("a", "sys");
        store.ensure("b", "sys");
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert_eq!(store.conversation_ids(), vec!["b".to_string()]);
    }

    #[test]
    fn test_concurrent_conversations() {
        let store = Arc::new(MessageStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let id = format!("conv-{}", i);
                    store.ensure(&id, "sys");
                    for n in 0..50 {
                        store.append(&id, Message::user(n.to_string()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.conversation_ids().len(), 8);
        for i in 0..8 {
            let messages = store.get(&format!("conv-{}", i));
            assert_eq!(messages.len(), 51);
            assert_eq!(messages[50].content, "49");
        }
    }
}
