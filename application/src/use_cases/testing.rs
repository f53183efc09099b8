//! Scripted collaborators shared by the use case tests.

use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::llm_gateway::{FragmentStream, GatewayError, LlmGateway};
use async_trait::async_trait;
use council_domain::{
    Conversation, ConversationMessage, ConversationSummary, CouncilOutcome, Message, Model,
    ModelResponse, StreamEvent,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

pub(crate) fn model(id: &str) -> Model {
    Model::new(id).unwrap()
}

#[derive(Clone)]
enum Script {
    Reply(String),
    Fail(GatewayError),
    Stream(Vec<StreamEvent>),
    Delayed(Duration, String),
}

/// Gateway that answers from a per-model script and records every call.
pub(crate) struct ScriptedGateway {
    scripts: HashMap<String, Script>,
    barrier: Option<Arc<Barrier>>,
    calls: Mutex<Vec<(String, Vec<Message>)>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            barrier: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn reply(mut self, model: &str, content: &str) -> Self {
        self.scripts
            .insert(model.to_string(), Script::Reply(content.to_string()));
        self
    }

    pub(crate) fn fail(mut self, model: &str, error: GatewayError) -> Self {
        self.scripts.insert(model.to_string(), Script::Fail(error));
        self
    }

    pub(crate) fn stream(mut self, model: &str, events: Vec<StreamEvent>) -> Self {
        self.scripts.insert(model.to_string(), Script::Stream(events));
        self
    }

    pub(crate) fn delayed(mut self, model: &str, delay: Duration, content: &str) -> Self {
        self.scripts.insert(
            model.to_string(),
            Script::Delayed(delay, content.to_string()),
        );
        self
    }

    /// Make every query wait until `parties` queries are in flight.
    pub(crate) fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    pub(crate) fn query_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_to(&self, model: &str) -> Vec<Vec<Message>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == model)
            .map(|(_, messages)| messages.clone())
            .collect()
    }

    fn record(&self, model: &Model, messages: &[Message]) -> Option<Script> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));
        self.scripts.get(model.as_str()).cloned()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn query(
        &self,
        model: &Model,
        messages: &[Message],
        _timeout: Duration,
    ) -> Result<ModelResponse, GatewayError> {
        let script = self.record(model, messages);
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        match script {
            Some(Script::Reply(content)) => Ok(ModelResponse::new(content)),
            Some(Script::Fail(error)) => Err(error),
            Some(Script::Stream(events)) => Ok(ModelResponse::new(
                events
                    .into_iter()
                    .filter_map(|e| match e {
                        StreamEvent::Delta(text) => Some(text),
                        StreamEvent::Error(_) => None,
                    })
                    .collect::<String>(),
            )),
            Some(Script::Delayed(delay, content)) => {
                tokio::time::sleep(delay).await;
                Ok(ModelResponse::new(content))
            }
            None if self.barrier.is_some() => Ok(ModelResponse::new("ok")),
            None => Err(GatewayError::Other(format!("unscripted model {}", model))),
        }
    }

    fn query_stream(
        &self,
        model: &Model,
        messages: &[Message],
        _timeout: Duration,
    ) -> FragmentStream {
        match self.record(model, messages) {
            Some(Script::Stream(events)) => futures::stream::iter(events).boxed(),
            Some(Script::Reply(content)) => {
                futures::stream::iter(vec![StreamEvent::Delta(content)]).boxed()
            }
            Some(Script::Fail(error)) => {
                futures::stream::iter(vec![StreamEvent::Error(error.to_string())]).boxed()
            }
            Some(Script::Delayed(delay, content)) => futures::stream::once(async move {
                tokio::time::sleep(delay).await;
                StreamEvent::Delta(content)
            })
            .boxed(),
            None => futures::stream::iter(vec![StreamEvent::Error(format!(
                "unscripted model {}",
                model
            ))])
            .boxed(),
        }
    }
}

/// Minimal store kept in a mutex-guarded map.
#[derive(Default)]
pub(crate) struct MemoryStore {
    conversations: Mutex<HashMap<String, Conversation>>,
}

impl MemoryStore {
    pub(crate) fn snapshot(&self, id: &str) -> Conversation {
        self.conversations.lock().unwrap()[id].clone()
    }

    fn with_conversation<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Conversation) -> T,
    ) -> Result<T, StoreError> {
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(f(conversation))
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create(&self, id: &str) -> Result<Conversation, StoreError> {
        let conversation = Conversation::new(id);
        self.conversations
            .lock()
            .unwrap()
            .insert(id.to_string(), conversation.clone());
        Ok(conversation)
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.lock().unwrap().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .values()
            .map(Conversation::summary)
            .collect())
    }

    async fn append_user_message(&self, id: &str, content: &str) -> Result<(), StoreError> {
        self.with_conversation(id, |c| c.messages.push(ConversationMessage::user(content)))
    }

    async fn append_assistant_message(
        &self,
        id: &str,
        outcome: &CouncilOutcome,
    ) -> Result<(), StoreError> {
        self.with_conversation(id, |c| {
            c.messages
                .push(ConversationMessage::assistant(outcome.clone()))
        })
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError> {
        self.with_conversation(id, |c| c.title = title.to_string())
    }
}
