//! Research pipeline
//!
//! One turn of the research assistant:
//! 1. Appends the user's question (creating the durable conversation if needed)
//! 2. Derives search keywords from the question
//! 3. Searches for related papers and folds up to three into the prompt
//! 4. Streams the generated answer, reformatting the whole buffer per chunk
//! 5. Extracts references and persists the finished answer
//!
//! Keyword extraction and paper search may fail without failing the turn.
//! Generation failures replace the in-flight message with a classified error.

use futures::StreamExt;
use serde::Serialize;
use std::ops::Deref;
use std::sync::Arc;

use crate::config::ModelCatalog;
use crate::conversation::store::TurnGuard;
use crate::conversation::{ConversationStore, Message, Paper, Role};
use crate::identity::Identity;
use crate::monitor::{ApiStatus, ConnectivityHandle};
use crate::providers::{BackendError, ErrorKind, ResearchBackend};

use super::decode::Utf8Accumulator;
use super::format::format_response;
use super::memory::{MemoryStore, StoredChat};
use super::offline::OfflineResponder;
use super::prompt::build_augmented_prompt;
use super::references;

/// Number of keywords kept when deriving a conversation title
const TITLE_WORDS: usize = 6;

/// How a submitted turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "error_kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The answer streamed to completion and was persisted
    Completed,
    /// Generation failed; the assistant message holds the classified error
    Failed(ErrorKind),
    /// The backend was unreachable; a local reply was shown
    Offline,
    /// Another turn is in flight; nothing changed
    Busy,
    /// The question was blank; nothing changed
    Empty,
    /// No identity to create a new conversation for; nothing changed
    Unauthenticated,
}

/// Orchestrates turns against the research backend
pub struct ResearchPipeline {
    backend: Arc<dyn ResearchBackend>,
    memory: Arc<MemoryStore>,
    connectivity: ConnectivityHandle,
    catalog: ModelCatalog,
    offline: OfflineResponder,
}

impl ResearchPipeline {
    pub fn new(
        backend: Arc<dyn ResearchBackend>,
        memory: Arc<MemoryStore>,
        connectivity: ConnectivityHandle,
        catalog: ModelCatalog,
        offline: OfflineResponder,
    ) -> Self {
        Self {
            backend,
            memory,
            connectivity,
            catalog,
            offline,
        }
    }

    pub fn status(&self) -> ApiStatus {
        self.connectivity.status()
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// Run one turn against `store`.
    ///
    /// All failures end up in the conversation; the returned outcome is
    /// informational only.
    pub async fn submit(
        &self,
        store: &ConversationStore,
        identity: Option<&Identity>,
        text: &str,
        model: Option<&str>,
    ) -> TurnOutcome {
        if let Some(rejected) = reject(store, identity, text) {
            return rejected;
        }

        let Some(turn) = store.try_begin_turn() else {
            tracing::debug!("Turn already in flight, ignoring submit");
            return TurnOutcome::Busy;
        };

        self.run_turn(turn.store(), identity, text.trim(), model)
            .await
    }

    /// Like [`Self::submit`], for a caller that already claimed the turn
    pub(crate) async fn submit_claimed<S>(
        &self,
        turn: TurnGuard<S>,
        identity: Option<&Identity>,
        text: &str,
        model: Option<&str>,
    ) -> TurnOutcome
    where
        S: Deref<Target = ConversationStore>,
    {
        if let Some(rejected) = reject(turn.store(), identity, text) {
            return rejected;
        }

        self.run_turn(turn.store(), identity, text.trim(), model)
            .await
    }

    async fn run_turn(
        &self,
        store: &ConversationStore,
        identity: Option<&Identity>,
        text: &str,
        model: Option<&str>,
    ) -> TurnOutcome {
        let existing = store.conversation_id();
        store.append(Message::user(text));

        let is_new = existing.is_none();
        let conversation_id = match (existing, identity) {
            (Some(id), _) => Some(id),
            (None, Some(identity)) => self.create_conversation(store, identity, text).await,
            (None, None) => None,
        };

        if let Some(id) = &conversation_id {
            self.persist(id, StoredChat::new(Role::User, text, Vec::new()))
                .await;
        }

        store.append(Message::placeholder());

        if !self.connectivity.is_connected() {
            tracing::info!(status = ?self.status(), "Backend unavailable, answering offline");
            let reply = self.offline.respond(text).await;
            commit(store, Message::assistant(reply));
            return TurnOutcome::Offline;
        }

        let model = self.catalog.resolve(model);
        match self
            .run_online(store, conversation_id.as_deref(), is_new, text, model)
            .await
        {
            Ok(()) => TurnOutcome::Completed,
            Err(e) => {
                let kind = e.kind();
                tracing::error!(
                    conversation_id = conversation_id.as_deref().unwrap_or("-"),
                    ?kind,
                    "Research turn failed: {}",
                    e
                );
                commit(store, Message::assistant(kind.user_message()));
                TurnOutcome::Failed(kind)
            }
        }
    }

    async fn create_conversation(
        &self,
        store: &ConversationStore,
        identity: &Identity,
        text: &str,
    ) -> Option<String> {
        match self.memory.create_chat(&identity.user_id, text).await {
            Ok(id) => {
                tracing::info!(conversation_id = %id, "Created conversation");
                store.adopt_conversation(id.clone(), text.to_string(), identity.user_id.clone());
                Some(id)
            }
            Err(e) => {
                tracing::warn!("Failed to create conversation record: {}", e);
                None
            }
        }
    }

    async fn run_online(
        &self,
        store: &ConversationStore,
        conversation_id: Option<&str>,
        is_new: bool,
        text: &str,
        model: &str,
    ) -> Result<(), BackendError> {
        let keywords = self.extract_keywords(model, text).await;

        if is_new {
            if let Some(title) = title_from_keywords(&keywords) {
                if store.settle_title(title.clone()) {
                    if let Some(id) = conversation_id {
                        if let Err(e) = self.memory.set_title(id, &title).await {
                            tracing::warn!(conversation_id = id, "Failed to store title: {}", e);
                        }
                    }
                }
            }
        }

        let papers = self.search_papers(&keywords).await;
        let prompt = build_augmented_prompt(text, &papers);

        let mut stream = self.backend.generate(model, &prompt).await?;

        let mut decoder = Utf8Accumulator::new();
        let mut raw = String::new();
        let mut formatted = String::new();
        let mut received = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            received += chunk.len();
            raw.push_str(&decoder.push(&chunk));
            formatted = format_response(&raw);
            commit(store, Message::assistant(formatted.clone()));
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            raw.push_str(&tail);
            formatted = format_response(&raw);
        }

        if raw.is_empty() {
            return Err(BackendError::NoStream);
        }
        tracing::debug!(bytes = received, papers = papers.len(), "Generation finished");

        let mut cited = references::extract(&raw);
        if cited.is_empty() {
            cited = papers;
        }

        if let Some(id) = conversation_id {
            self.persist(id, StoredChat::new(Role::Assistant, formatted.as_str(), cited.clone()))
                .await;
        }

        let mut message = Message::assistant(formatted);
        if !cited.is_empty() {
            message = message.with_references(cited);
        }
        commit(store, message);

        Ok(())
    }

    async fn extract_keywords(&self, model: &str, text: &str) -> String {
        match self.backend.extract_keywords(model, text).await {
            Ok(keywords) => keywords.trim().to_string(),
            Err(e) => {
                tracing::warn!(stage = "keywords", "Keyword extraction failed: {}", e);
                String::new()
            }
        }
    }

    async fn search_papers(&self, keywords: &str) -> Vec<Paper> {
        if keywords.is_empty() {
            return Vec::new();
        }

        match self.backend.search_papers(keywords).await {
            Ok(papers) => papers,
            Err(e) => {
                tracing::warn!(stage = "papers", "Paper search failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn persist(&self, conversation_id: &str, chat: StoredChat) {
        if let Err(e) = self.memory.append_chat(conversation_id, &chat).await {
            tracing::warn!(
                conversation_id,
                role = chat.role.as_str(),
                "Failed to persist message: {}",
                e
            );
        }
    }
}

/// Outcome for a submit that must not touch the conversation at all
fn reject(
    store: &ConversationStore,
    identity: Option<&Identity>,
    text: &str,
) -> Option<TurnOutcome> {
    if text.trim().is_empty() {
        return Some(TurnOutcome::Empty);
    }
    if store.conversation_id().is_none() && identity.is_none() {
        tracing::warn!("Refusing to start a conversation without an identity");
        return Some(TurnOutcome::Unauthenticated);
    }
    None
}

/// Replace the in-flight assistant message
fn commit(store: &ConversationStore, message: Message) {
    if let Err(e) = store.replace_last(message) {
        tracing::error!("Conversation tail is not an assistant message: {}", e);
    }
}

/// First few keywords, without quotes or punctuation
pub fn title_from_keywords(keywords: &str) -> Option<String> {
    let words: Vec<String> = keywords
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .map(|word| word.trim_matches('-').to_string())
        .filter(|word| !word.is_empty())
        .take(TITLE_WORDS)
        .collect();

    (!words.is_empty()).then(|| words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompts_builtin::OFFLINE_NOTICE;
    use crate::conversation::PLACEHOLDER;
    use crate::providers::fake::{FakeBackend, Generation};
    use std::sync::atomic::Ordering;
    use tokio::sync::Notify;

    struct Harness {
        pipeline: Arc<ResearchPipeline>,
        backend: Arc<FakeBackend>,
        memory: Arc<MemoryStore>,
    }

    async fn harness(backend: FakeBackend, status: ApiStatus) -> Harness {
        let backend = Arc::new(backend);
        let memory = Arc::new(MemoryStore::new_in_memory_async().await.unwrap());
        let pipeline = Arc::new(ResearchPipeline::new(
            backend.clone(),
            memory.clone(),
            ConnectivityHandle::fixed(status),
            ModelCatalog::default(),
            OfflineResponder::default(),
        ));
        Harness {
            pipeline,
            backend,
            memory,
        }
    }

    fn user() -> Identity {
        Identity::new("user-1")
    }

    async fn persisted(memory: &MemoryStore, store: &ConversationStore) -> Vec<StoredChat> {
        let id = store.conversation_id().expect("conversation created");
        memory.get_chat(&id).await.unwrap().unwrap().chats
    }

    #[tokio::test]
    async fn test_completed_turn() {
        let h = harness(
            FakeBackend::new()
                .with_keywords("long covid")
                .streaming(&["Long COVID ", "affects many."]),
            ApiStatus::Connected,
        )
        .await;
        let store = ConversationStore::fresh();

        let outcome = h
            .pipeline
            .submit(&store, Some(&user()), "  What is long COVID?  ", None)
            .await;

        assert_eq!(outcome, TurnOutcome::Completed);
        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::user("What is long COVID?"));
        assert_eq!(messages[1].content, "Long COVID affects many.");
        assert!(!store.is_loading());

        let chats = persisted(&h.memory, &store).await;
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[1].message, "Long COVID affects many.");
    }

    #[tokio::test]
    async fn test_streaming_reconciliation() {
        let h = harness(
            FakeBackend::new().streaming(&["Hel", "lo wor", "ld"]),
            ApiStatus::Connected,
        )
        .await;
        let store = Arc::new(ConversationStore::fresh());

        let mut rx = store.subscribe();
        let observer = tokio::spawn(async move {
            let mut seen: Vec<String> = Vec::new();
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                if let Some(last) = snapshot.messages.last() {
                    if last.role == Role::Assistant
                        && !last.is_placeholder()
                        && seen.last() != Some(&last.content)
                    {
                        seen.push(last.content.clone());
                    }
                }
                if !snapshot.is_loading && snapshot.messages.len() == 2 {
                    break;
                }
            }
            seen
        });

        let outcome = h
            .pipeline
            .submit(&store, Some(&user()), "Say hello", None)
            .await;
        assert_eq!(outcome, TurnOutcome::Completed);

        let seen = observer.await.unwrap();
        assert_eq!(
            seen,
            vec![
                format_response("Hel"),
                format_response("Hello wor"),
                format_response("Hello world"),
            ]
        );

        let chats = persisted(&h.memory, &store).await;
        assert_eq!(chats.last().unwrap().message, format_response("Hello world"));
    }

    #[tokio::test]
    async fn test_single_flight() {
        let gate = Arc::new(Notify::new());
        let h = harness(
            FakeBackend::new().streaming(&["done"]).gated(gate.clone()),
            ApiStatus::Connected,
        )
        .await;
        let store = Arc::new(ConversationStore::fresh());

        let first = {
            let pipeline = h.pipeline.clone();
            let store = store.clone();
            tokio::spawn(async move {
                pipeline
                    .submit(&store, Some(&Identity::new("user-1")), "first", None)
                    .await
            })
        };

        let mut rx = store.subscribe();
        rx.wait_for(|s| s.is_loading && s.messages.len() == 2)
            .await
            .unwrap();

        let second = h
            .pipeline
            .submit(&store, Some(&user()), "second", None)
            .await;
        assert_eq!(second, TurnOutcome::Busy);
        assert_eq!(store.messages().len(), 2);
        assert!(store.messages()[1].is_placeholder());

        gate.notify_one();
        assert_eq!(first.await.unwrap(), TurnOutcome::Completed);

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "done");
        assert_eq!(h.backend.generate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_soft_failures_keep_question_unchanged() {
        let h = harness(
            FakeBackend::new()
                .failing_keywords("keyword service down")
                .streaming(&["Answer"]),
            ApiStatus::Connected,
        )
        .await;
        let store = ConversationStore::fresh();

        let outcome = h
            .pipeline
            .submit(&store, Some(&user()), "What is CRISPR?", None)
            .await;

        assert_eq!(outcome, TurnOutcome::Completed);
        assert_eq!(h.backend.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.backend.last_prompt().as_deref(), Some("What is CRISPR?"));
    }

    #[tokio::test]
    async fn test_search_failure_is_not_fatal() {
        let h = harness(
            FakeBackend::new()
                .with_keywords("crispr")
                .failing_search("429 Too Many Requests")
                .streaming(&["Answer"]),
            ApiStatus::Connected,
        )
        .await;
        let store = ConversationStore::fresh();

        let outcome = h
            .pipeline
            .submit(&store, Some(&user()), "What is CRISPR?", None)
            .await;

        assert_eq!(outcome, TurnOutcome::Completed);
        assert_eq!(h.backend.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.backend.last_prompt().as_deref(), Some("What is CRISPR?"));
        assert!(store.messages()[1].references.is_none());
    }

    #[tokio::test]
    async fn test_papers_augment_prompt_and_become_references() {
        let papers = vec![
            Paper {
                title: Some("CRISPR-Cas9 in practice".into()),
                url: Some("http://a".into()),
                ..Paper::default()
            },
            Paper::unparsed("Base editing"),
        ];
        let h = harness(
            FakeBackend::new()
                .with_keywords("crispr")
                .with_papers(papers.clone())
                .streaming(&["CRISPR edits genes."]),
            ApiStatus::Connected,
        )
        .await;
        let store = ConversationStore::fresh();

        h.pipeline
            .submit(&store, Some(&user()), "What is CRISPR?", None)
            .await;

        let prompt = h.backend.last_prompt().unwrap();
        assert!(prompt.starts_with("What is CRISPR?\n\n"));
        assert!(prompt.contains("Paper 1: 'CRISPR-Cas9 in practice'"));
        assert!(prompt.contains("Paper 2: 'Base editing'"));

        assert_eq!(store.messages()[1].references.as_ref(), Some(&papers));
        let chats = persisted(&h.memory, &store).await;
        assert_eq!(chats[1].references, papers);
    }

    #[tokio::test]
    async fn test_references_section_wins_over_search_results() {
        let h = harness(
            FakeBackend::new()
                .with_keywords("crispr")
                .with_papers(vec![Paper::unparsed("From search")])
                .streaming(&[
                    "Answer.\n\n## References\n",
                    "1. Doudna, J. A. (2014). The new frontier of genome engineering. Science, 346(6213), 1258096.\n",
                ]),
            ApiStatus::Connected,
        )
        .await;
        let store = ConversationStore::fresh();

        h.pipeline
            .submit(&store, Some(&user()), "What is CRISPR?", None)
            .await;

        let references = store.messages()[1].references.clone().unwrap();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].year, Some(2014));
        assert_eq!(references[0].venue.as_deref(), Some("Science"));
    }

    #[tokio::test]
    async fn test_failed_to_fetch_is_network_error() {
        let h = harness(
            FakeBackend::new().with_generation(Generation::Reject(
                "TypeError: Failed to fetch".into(),
            )),
            ApiStatus::Connected,
        )
        .await;
        let store = ConversationStore::fresh();

        let outcome = h
            .pipeline
            .submit(&store, Some(&user()), "What is CRISPR?", None)
            .await;

        assert_eq!(outcome, TurnOutcome::Failed(ErrorKind::Network));
        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "What is CRISPR?");
        assert_eq!(messages[1].content, ErrorKind::Network.user_message());
        assert_ne!(messages[1].content, ErrorKind::Unknown.user_message());
        assert!(!store.is_loading());

        // only the question is persisted
        let chats = persisted(&h.memory, &store).await;
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_replaces_partial_answer() {
        let h = harness(
            FakeBackend::new().with_generation(Generation::BreakAfter(
                vec![b"Partial ans".to_vec()],
                "connection reset".into(),
            )),
            ApiStatus::Connected,
        )
        .await;
        let store = ConversationStore::fresh();

        let outcome = h
            .pipeline
            .submit(&store, Some(&user()), "Question", None)
            .await;

        assert_eq!(outcome, TurnOutcome::Failed(ErrorKind::Unknown));
        assert_eq!(store.messages()[1].content, ErrorKind::Unknown.user_message());
        assert_eq!(store.messages()[0].content, "Question");
    }

    #[tokio::test]
    async fn test_empty_stream_never_leaves_placeholder() {
        let h = harness(FakeBackend::new().streaming(&[]), ApiStatus::Connected).await;
        let store = ConversationStore::fresh();

        let outcome = h
            .pipeline
            .submit(&store, Some(&user()), "Question", None)
            .await;

        assert_eq!(outcome, TurnOutcome::Failed(ErrorKind::Unknown));
        assert_ne!(store.messages()[1].content, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_offline_answers_without_network() {
        let h = harness(FakeBackend::new(), ApiStatus::Error).await;
        let store = ConversationStore::fresh();

        let started = tokio::time::Instant::now();
        let outcome = h
            .pipeline
            .submit(&store, Some(&user()), "What is COVID-19?", None)
            .await;

        assert_eq!(outcome, TurnOutcome::Offline);
        assert_eq!(h.backend.network_calls(), 0);
        assert!(started.elapsed() >= std::time::Duration::from_millis(600));

        let messages = store.messages();
        assert_eq!(messages[0].content, "What is COVID-19?");
        assert!(messages[1].content.contains("SARS-CoV-2"));
        assert_ne!(messages[1].content, OFFLINE_NOTICE);

        // the local reply is not persisted
        let chats = persisted(&h.memory, &store).await;
        assert_eq!(chats.len(), 1);
    }

    #[tokio::test]
    async fn test_offline_while_checking() {
        let h = harness(FakeBackend::new(), ApiStatus::Checking).await;
        let store = ConversationStore::fresh();

        let outcome = h
            .pipeline
            .submit(&store, Some(&user()), "Explain dark matter", None)
            .await;

        assert_eq!(outcome, TurnOutcome::Offline);
        assert_eq!(store.messages()[1].content, OFFLINE_NOTICE);
    }

    #[tokio::test]
    async fn test_rejected_submits_change_nothing() {
        let h = harness(FakeBackend::new().streaming(&["x"]), ApiStatus::Connected).await;
        let store = ConversationStore::fresh();

        assert_eq!(
            h.pipeline.submit(&store, Some(&user()), "   ", None).await,
            TurnOutcome::Empty
        );
        assert_eq!(
            h.pipeline.submit(&store, None, "Question", None).await,
            TurnOutcome::Unauthenticated
        );
        assert!(store.messages().is_empty());
        assert!(!store.is_loading());
        assert_eq!(h.backend.network_calls(), 0);
    }

    #[tokio::test]
    async fn test_claimed_turn_runs_and_releases() {
        let h = harness(FakeBackend::new().streaming(&["Answer"]), ApiStatus::Connected).await;
        let store = Arc::new(ConversationStore::fresh());
        let turn = ConversationStore::try_claim_turn(&store).unwrap();

        assert_eq!(
            h.pipeline.submit(&store, Some(&user()), "Other", None).await,
            TurnOutcome::Busy
        );

        let outcome = h
            .pipeline
            .submit_claimed(turn, Some(&user()), "  Question ", None)
            .await;
        assert_eq!(outcome, TurnOutcome::Completed);
        assert!(!store.is_loading());
        assert_eq!(store.messages()[0].content, "Question");
        assert_eq!(store.owner().as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_existing_conversation_needs_no_identity() {
        let h = harness(FakeBackend::new().streaming(&["Second"]), ApiStatus::Connected).await;
        let id = h.memory.create_chat("user-1", "First").await.unwrap();
        let store = ConversationStore::new();
        store.hydrate(&h.memory, &id).await.unwrap();

        let outcome = h.pipeline.submit(&store, None, "Follow-up", None).await;

        assert_eq!(outcome, TurnOutcome::Completed);
        let chats = h.memory.get_chat(&id).await.unwrap().unwrap().chats;
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].message, "Follow-up");
    }

    #[tokio::test]
    async fn test_title_is_set_once() {
        let h = harness(
            FakeBackend::new()
                .with_keywords("\"CRISPR\" gene-editing, off-target effects!")
                .streaming(&["Answer"]),
            ApiStatus::Connected,
        )
        .await;
        let store = ConversationStore::fresh();

        h.pipeline
            .submit(&store, Some(&user()), "What is CRISPR?", None)
            .await;
        let expected = "CRISPR gene-editing off-target effects";
        assert_eq!(store.snapshot().title.as_deref(), Some(expected));

        h.pipeline
            .submit(&store, Some(&user()), "And base editing?", None)
            .await;
        assert_eq!(store.snapshot().title.as_deref(), Some(expected));

        let id = store.conversation_id().unwrap();
        let record = h.memory.get_chat(&id).await.unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some(expected));
    }

    #[test]
    fn test_title_from_keywords() {
        assert_eq!(
            title_from_keywords("'long covid' neurological symptoms, fatigue; brain fog cognition"),
            Some("long covid neurological symptoms fatigue brain".to_string())
        );
        assert_eq!(title_from_keywords("  \"\" -- "), None);
        assert_eq!(title_from_keywords(""), None);
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_value(TurnOutcome::Failed(ErrorKind::RateLimited)).unwrap(),
            serde_json::json!({"outcome": "failed", "error_kind": "rate_limited"})
        );
        assert_eq!(
            serde_json::to_value(TurnOutcome::Busy).unwrap(),
            serde_json::json!({"outcome": "busy"})
        );
    }
}
