//! In-memory conversation state
//!
//! The store is the single source of truth a front-end renders from. All
//! mutation goes through the methods below; every mutation publishes a fresh
//! snapshot on a `watch` channel so observers re-render without polling.

use serde::Serialize;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::watch;

use super::{Message, Role};
use crate::core::MemoryStore;

/// Errors from the conversation store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Conversation has no messages")]
    EmptyConversation,

    #[error("Last message is not an assistant message")]
    LastMessageNotAssistant,

    #[error("Replacement must be an assistant message")]
    ReplacementNotAssistant,

    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

/// Observable state of one viewed conversation
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub conversation_id: Option<String>,
    pub title: Option<String>,
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_preloaded: bool,
    #[serde(skip)]
    title_settled: bool,
    #[serde(skip)]
    owner: Option<String>,
}

impl ConversationSnapshot {
    fn new() -> Self {
        Self {
            conversation_id: None,
            title: None,
            messages: Vec::new(),
            is_loading: false,
            // Starts true so the empty state is not flashed before history arrives
            is_preloaded: true,
            title_settled: false,
            owner: None,
        }
    }
}

pub struct ConversationStore {
    state: watch::Sender<ConversationSnapshot>,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConversationSnapshot::new());
        Self { state }
    }

    /// A store for a conversation that starts empty (no history to load)
    pub fn fresh() -> Self {
        let store = Self::new();
        store.state.send_modify(|s| s.is_preloaded = false);
        store
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.state.subscribe()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.state.borrow().conversation_id.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// User id the conversation belongs to, once known
    pub fn owner(&self) -> Option<String> {
        self.state.borrow().owner.clone()
    }

    /// Number of live subscribers
    pub fn observer_count(&self) -> usize {
        self.state.receiver_count()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.borrow().messages.clone()
    }

    pub fn append(&self, message: Message) {
        self.state.send_modify(|s| s.messages.push(message));
    }

    /// Replace the in-flight assistant message.
    ///
    /// Only valid while the tail of the conversation is an assistant message.
    pub fn replace_last(&self, message: Message) -> Result<(), StoreError> {
        if message.role != Role::Assistant {
            return Err(StoreError::ReplacementNotAssistant);
        }

        let mut outcome = Ok(());
        self.state.send_if_modified(|s| match s.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                *last = message;
                true
            }
            Some(_) => {
                outcome = Err(StoreError::LastMessageNotAssistant);
                false
            }
            None => {
                outcome = Err(StoreError::EmptyConversation);
                false
            }
        });
        outcome
    }

    /// Load persisted history for `conversation_id`.
    ///
    /// `is_preloaded` flips to false once the load has finished, whatever
    /// its result.
    pub async fn hydrate(
        &self,
        memory: &MemoryStore,
        conversation_id: &str,
    ) -> Result<(), StoreError> {
        let loaded = memory.get_chat(conversation_id).await;

        let mut outcome = Ok(());
        self.state.send_modify(|s| {
            s.is_preloaded = false;
            match loaded {
                Ok(Some(record)) => {
                    s.conversation_id = Some(record.id);
                    s.owner = record.user_id;
                    s.title = record.title;
                    s.title_settled = true;
                    s.messages = record.chats.into_iter().map(Message::from).collect();
                }
                Ok(None) => outcome = Err(StoreError::NotFound(conversation_id.to_string())),
                Err(e) => outcome = Err(StoreError::Persistence(e)),
            }
        });
        outcome
    }

    /// Remove every message
    pub fn clear(&self) {
        self.state.send_modify(|s| s.messages.clear());
    }

    pub(crate) fn adopt_conversation(&self, conversation_id: String, title: String, owner: String) {
        self.state.send_modify(|s| {
            s.conversation_id = Some(conversation_id);
            s.title = Some(title);
            s.owner = Some(owner);
        });
    }

    /// Set the derived title unless one was already settled
    pub(crate) fn settle_title(&self, title: String) -> bool {
        self.state.send_if_modified(|s| {
            if s.title_settled {
                return false;
            }
            s.title = Some(title);
            s.title_settled = true;
            true
        })
    }

    fn claim(&self) -> bool {
        self.state.send_if_modified(|s| {
            if s.is_loading {
                false
            } else {
                s.is_loading = true;
                true
            }
        })
    }

    /// Claim the single in-flight turn; `None` while another turn is running
    pub(crate) fn try_begin_turn(&self) -> Option<TurnGuard<&Self>> {
        self.claim().then(|| TurnGuard { store: self })
    }

    /// Like [`Self::try_begin_turn`], with a claim that can move to another task
    pub(crate) fn try_claim_turn(store: &Arc<Self>) -> Option<TurnGuard<Arc<Self>>> {
        store.claim().then(|| TurnGuard {
            store: store.clone(),
        })
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the single-flight claim when dropped
pub(crate) struct TurnGuard<S: Deref<Target = ConversationStore>> {
    store: S,
}

impl<S: Deref<Target = ConversationStore>> TurnGuard<S> {
    pub(crate) fn store(&self) -> &ConversationStore {
        &self.store
    }
}

impl<S: Deref<Target = ConversationStore>> Drop for TurnGuard<S> {
    fn drop(&mut self) {
        self.store.state.send_modify(|s| s.is_loading = false);
    }
}
