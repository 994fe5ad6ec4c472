//! Chat session cache: one live AI conversation per user.
//!
//! Sessions are seeded from the conversation store on first use and dropped
//! whenever the backend fails, so the next message rebuilds them from stored
//! history.

use kora_core::{
    config::Prompts,
    context::{Context, ContextEntry},
    error::KoraError,
    traits::Provider,
    turn::{ConversationTurn, Sender},
};
use kora_memory::Store;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Placeholder for an image the user sent, as seen by the backend.
pub const SENT_IMAGE: &str = "[Sent an image]";

/// Live conversation state for one user.
pub struct ChatSession {
    user_id: String,
    /// Entries the session was created from, oldest first.
    seed: Vec<ContextEntry>,
    /// Entries sent with the next request, oldest first.
    history: Vec<ContextEntry>,
}

impl ChatSession {
    fn new(user_id: &str, seed: Vec<ContextEntry>) -> Self {
        Self {
            user_id: user_id.to_string(),
            history: seed.clone(),
            seed,
        }
    }

    /// Drop a trailing user entry `matches` accepts: the router stores the
    /// inbound turn before the session sees it.
    fn drop_pending(&mut self, matches: impl Fn(&str) -> bool) {
        if self
            .history
            .last()
            .is_some_and(|e| e.is_user() && matches(&e.content))
        {
            self.history.pop();
        }
    }

    fn push_exchange(&mut self, user: String, reply: String, cap: usize) {
        self.history.push(ContextEntry::user(user));
        self.history.push(ContextEntry::assistant(reply));
        if self.history.len() > cap {
            let excess = self.history.len() - cap;
            self.history.drain(..excess);
        }
    }
}

/// Translate stored turns into backend conversation entries.
pub fn seed_entries(turns: &[ConversationTurn]) -> Vec<ContextEntry> {
    turns
        .iter()
        .map(|turn| match turn.sender {
            Sender::User => ContextEntry::user(turn.render()),
            Sender::Bot => ContextEntry::assistant(turn.render()),
        })
        .collect()
}

type SharedSession = Arc<tokio::sync::Mutex<ChatSession>>;

/// Owns every live chat session.
///
/// The map is behind a plain mutex held only for lookups; each session has
/// its own async lock, so users never wait on each other.
pub struct ChatSessionCache {
    provider: Arc<dyn Provider>,
    store: Store,
    prompts: Prompts,
    seed_limit: usize,
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl ChatSessionCache {
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Store,
        prompts: Prompts,
        seed_limit: usize,
    ) -> Self {
        Self {
            provider,
            store,
            prompts,
            seed_limit: seed_limit.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, user_id: &str) -> Option<SharedSession> {
        match self.sessions.lock() {
            Ok(map) => map.get(user_id).cloned(),
            Err(poisoned) => poisoned.into_inner().get(user_id).cloned(),
        }
    }

    /// The user's live session, created from stored history if absent.
    pub async fn get_or_create(&self, user_id: &str) -> SharedSession {
        if let Some(session) = self.cached(user_id) {
            return session;
        }

        let turns = match self.store.history(user_id, self.seed_limit).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!("session seed for {user_id} unavailable, starting empty: {e}");
                Vec::new()
            }
        };
        let fresh = Arc::new(tokio::sync::Mutex::new(ChatSession::new(
            user_id,
            seed_entries(&turns),
        )));

        let mut map = match self.sessions.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Another task may have created it while the history was loading.
        let session = map.entry(user_id.to_string()).or_insert(fresh).clone();
        debug!("chat session ready for {user_id} ({} seed turns)", turns.len());
        session
    }

    /// Drop the user's session; the next message rebuilds it.
    pub fn invalidate(&self, user_id: &str) {
        let removed = match self.sessions.lock() {
            Ok(mut map) => map.remove(user_id),
            Err(poisoned) => poisoned.into_inner().remove(user_id),
        };
        if removed.is_some() {
            info!("chat session invalidated for {user_id}");
        }
    }

    /// Seed entries of the user's current session, if one is cached.
    pub async fn seed_history(&self, user_id: &str) -> Option<Vec<ContextEntry>> {
        let session = self.cached(user_id)?;
        let guard = session.lock().await;
        Some(guard.seed.clone())
    }

    fn cap(&self) -> usize {
        self.seed_limit * 2
    }

    /// Send a chat turn. A backend failure invalidates the session before
    /// the error is returned.
    pub async fn send(&self, user_id: &str, message: &str) -> Result<String, KoraError> {
        let session = self.get_or_create(user_id).await;
        let mut guard = session.lock().await;
        guard.drop_pending(|content| content == message);

        let context = Context {
            system_prompt: self.prompts.system.clone(),
            history: guard.history.clone(),
            current_message: message.to_string(),
            model: None,
        };

        match self.provider.complete(&context).await {
            Ok(completion) => {
                debug!(
                    "chat reply for {} via {} in {}ms",
                    guard.user_id, completion.provider_used, completion.processing_time_ms
                );
                guard.push_exchange(message.to_string(), completion.text.clone(), self.cap());
                Ok(completion.text)
            }
            Err(e) => {
                drop(guard);
                self.invalidate(user_id);
                Err(e)
            }
        }
    }

    /// Analyze an image the user sent. `caption` is any text that came with it.
    pub async fn analyze_image(
        &self,
        user_id: &str,
        image: &[u8],
        mime_type: &str,
        caption: Option<&str>,
    ) -> Result<String, KoraError> {
        let prompt = match caption {
            Some(caption) => format!(
                "{}\n\nThe user wrote this along with the image: {caption}",
                self.prompts.image_analysis
            ),
            None => self.prompts.image_analysis.clone(),
        };

        match self.provider.analyze_image(image, mime_type, &prompt).await {
            Ok(completion) => {
                let session = self.get_or_create(user_id).await;
                let mut guard = session.lock().await;
                guard.drop_pending(|content| content.starts_with("[Sent an image"));
                guard.push_exchange(SENT_IMAGE.to_string(), completion.text.clone(), self.cap());
                Ok(completion.text)
            }
            Err(e) => {
                self.invalidate(user_id);
                Err(e)
            }
        }
    }
}
