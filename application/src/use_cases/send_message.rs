//! Send Message use case
//!
//! Runs one user turn of a conversation: reads history, stores the user
//! message, gathers retrieval context, runs the council and stores its
//! answer. The first turn of a conversation also gets a generated title.

use crate::ports::context_retriever::{ContextRetriever, NoContextRetriever};
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::run_council::CouncilPipeline;
use async_stream::try_stream;
use council_domain::{
    ContextDocument, Conversation, ConversationSummary, CouncilEvent, CouncilOutcome,
    StageOneResult, StageThreeResult, format_context,
};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors that abort a send
#[derive(Error, Debug)]
pub enum SendMessageError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Everything produced by one batch turn
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageOutput {
    pub stage1: Vec<StageOneResult>,
    pub stage3: StageThreeResult,
    /// Documents the answer was grounded on
    pub context: Vec<ContextDocument>,
    /// Set on the first turn of a conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Use case for sending a message to the council
pub struct SendMessageUseCase<G: LlmGateway + 'static> {
    pipeline: CouncilPipeline<G>,
    store: Arc<dyn ConversationStore>,
    retriever: Arc<dyn ContextRetriever>,
    progress: Arc<dyn ProgressNotifier>,
}

impl<G: LlmGateway + 'static> SendMessageUseCase<G> {
    pub fn new(pipeline: CouncilPipeline<G>, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            pipeline,
            store,
            retriever: Arc::new(NoContextRetriever),
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn ContextRetriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn pipeline(&self) -> &CouncilPipeline<G> {
        &self.pipeline
    }

    /// Create a fresh, empty conversation with a random id.
    pub async fn start_conversation(&self) -> Result<Conversation, SendMessageError> {
        let id = Uuid::new_v4().to_string();
        info!("Starting conversation {}", id);
        Ok(self.store.create(&id).await?)
    }

    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, SendMessageError> {
        Ok(self.store.list().await?)
    }

    /// Run one turn and return the complete answer.
    pub async fn send(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<SendMessageOutput, SendMessageError> {
        let conversation = self.load(conversation_id).await?;
        let is_first_message = conversation.is_empty();
        let history = conversation.chat_history();

        self.store.append_user_message(conversation_id, content).await?;

        let context = self.retrieve(conversation_id, content).await;
        let context_text = format_context(&context);

        let title_future = async {
            if is_first_message {
                Some(self.pipeline.generate_title(content).await)
            } else {
                None
            }
        };
        let (outcome, title) = tokio::join!(
            self.pipeline.run_full_with_progress(
                content,
                &history,
                &context_text,
                self.progress.as_ref(),
            ),
            title_future,
        );

        if let Some(title) = &title {
            self.store.update_title(conversation_id, title).await?;
        }
        self.store
            .append_assistant_message(conversation_id, &outcome)
            .await?;

        Ok(SendMessageOutput {
            stage1: outcome.stage1,
            stage3: outcome.stage3,
            context,
            title,
        })
    }

    /// Run one turn as an ordered sequence of events.
    ///
    /// The sequence always ends with exactly one `complete` or `error`.
    pub fn send_streaming(&self, conversation_id: &str, content: &str) -> BoxStream<'_, CouncilEvent> {
        self.events(conversation_id.to_string(), content.to_string())
            .map(|event| {
                event.unwrap_or_else(|e| {
                    warn!("Streaming send failed: {}", e);
                    CouncilEvent::Error {
                        message: e.to_string(),
                    }
                })
            })
            .boxed()
    }

    fn events(
        &self,
        conversation_id: String,
        content: String,
    ) -> impl Stream<Item = Result<CouncilEvent, SendMessageError>> + Send + '_ {
        try_stream! {
            let conversation = self.load(&conversation_id).await?;
            let is_first_message = conversation.is_empty();
            let history = conversation.chat_history();

            self.store.append_user_message(&conversation_id, &content).await?;

            let title_task = is_first_message.then(|| self.pipeline.spawn_title(&content));

            let context = self.retrieve(&conversation_id, &content).await;
            let context_text = format_context(&context);
            if !context.is_empty() {
                yield CouncilEvent::Context { data: context };
            }

            yield CouncilEvent::Stage1Start;
            let stage1 = self
                .pipeline
                .stage1_collect_with_progress(&content, &history, &context_text, self.progress.as_ref())
                .await;
            yield CouncilEvent::Stage1Complete { data: stage1.clone() };

            yield CouncilEvent::Stage3Start;
            let stage3 = if stage1.is_empty() {
                warn!("All council models failed, skipping synthesis");
                self.pipeline.log_all_failed(&content);
                StageThreeResult::all_models_failed()
            } else {
                let mut chunks = self
                    .pipeline
                    .stage3_synthesize_stream(&content, &stage1, &history, &context_text);
                let mut full_response = String::new();
                while let Some(chunk) = chunks.next().await {
                    full_response.push_str(&chunk);
                    yield CouncilEvent::Stage3Chunk { chunk };
                }
                StageThreeResult::new(self.pipeline.roster().chairman().as_str(), full_response)
            };
            yield CouncilEvent::Stage3Complete { data: stage3.clone() };

            if let Some(handle) = title_task {
                let wait = self.pipeline.params().title_wait;
                match tokio::time::timeout(wait, handle).await {
                    Ok(Ok(title)) => {
                        self.store.update_title(&conversation_id, &title).await?;
                        yield CouncilEvent::title_complete(title);
                    }
                    Ok(Err(e)) => warn!("Title task failed: {}", e),
                    Err(_) => warn!("Title not ready within {:?}, skipping", wait),
                }
            }

            self.store
                .append_assistant_message(&conversation_id, &CouncilOutcome::new(stage1, stage3))
                .await?;

            yield CouncilEvent::Complete;
        }
    }

    async fn load(&self, conversation_id: &str) -> Result<Conversation, SendMessageError> {
        self.store
            .get(conversation_id)
            .await?
            .ok_or_else(|| SendMessageError::ConversationNotFound(conversation_id.to_string()))
    }

    async fn retrieve(&self, conversation_id: &str, content: &str) -> Vec<ContextDocument> {
        let top_k = self.pipeline.params().retrieval_top_k;
        self.retriever.search(conversation_id, content, top_k).await
    }
}
