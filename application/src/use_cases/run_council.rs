//! Council Pipeline
//!
//! Orchestrates the two council stages: every roster member answers the
//! question (Stage 1), then the chairman synthesizes one final answer
//! (Stage 3). Title generation runs alongside as an independent unit.
//!
//! Nothing in here fails because a model failed. Model outcomes arrive as
//! explicit results and are folded into fallbacks.

use crate::config::EngineParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::fan_out::FanOutDispatcher;
use council_domain::{
    CouncilOutcome, FALLBACK_TITLE, Message, Model, PromptTemplate, Roster, Stage,
    StageOneResult, StageThreeResult, StreamEvent, clean_title,
};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Fragment appended to a streamed synthesis that broke off.
pub const CHAIRMAN_STREAM_FAILED: &str = "\n\n[System: Chairman model failed. Verdict skipped.]";

/// Text fragments of a streamed synthesis, in upstream order.
pub type ChunkStream = BoxStream<'static, String>;

/// Use case for running the council stages
pub struct CouncilPipeline<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    roster: Roster,
    params: EngineParams,
    logger: Arc<dyn ConversationLogger>,
}

impl<G: LlmGateway + 'static> CouncilPipeline<G> {
    pub fn new(gateway: Arc<G>, roster: Roster, params: EngineParams) -> Self {
        Self {
            gateway,
            roster,
            params,
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Stage 1 with default (no-op) progress
    pub async fn stage1_collect(
        &self,
        query: &str,
        history: &[Message],
        context: &str,
    ) -> Vec<StageOneResult> {
        self.stage1_collect_with_progress(query, history, context, &NoProgress)
            .await
    }

    /// Stage 1: ask every roster member, keep the answers that came back.
    ///
    /// Results follow roster order. An empty result means every model
    /// failed; callers must handle it rather than synthesize over nothing.
    pub async fn stage1_collect_with_progress(
        &self,
        query: &str,
        history: &[Message],
        context: &str,
        progress: &dyn ProgressNotifier,
    ) -> Vec<StageOneResult> {
        let stage = Stage::Collect;
        info!("Stage 1: querying {} models", self.roster.len());
        progress.on_stage_start(&stage, self.roster.len());

        let messages = PromptTemplate::stage1_messages(query, history, context);
        let dispatcher = FanOutDispatcher::new(Arc::clone(&self.gateway), self.params.query_timeout);
        let mut outcomes = dispatcher
            .dispatch_all_with(self.roster.members(), &messages, &|model, success| {
                progress.on_model_complete(&stage, model, success)
            })
            .await;

        let results: Vec<StageOneResult> = self
            .roster
            .members()
            .iter()
            .filter_map(|model| match outcomes.remove(model) {
                Some(Ok(response)) => Some(StageOneResult::new(model.as_str(), response.content)),
                _ => None,
            })
            .collect();

        info!(
            "Stage 1 complete: {}/{} models responded",
            results.len(),
            self.roster.len()
        );
        progress.on_stage_complete(&stage);

        self.logger.log(ConversationEvent::new(
            "stage1_complete",
            json!({
                "query": query,
                "results": &results,
                "failed": self.roster.len() - results.len(),
            }),
        ));

        results
    }

    /// Stage 3 with default (no-op) progress
    pub async fn stage3_synthesize(
        &self,
        query: &str,
        results: &[StageOneResult],
        history: &[Message],
        context: &str,
    ) -> StageThreeResult {
        self.stage3_synthesize_with_progress(query, results, history, context, &NoProgress)
            .await
    }

    /// Stage 3: one chairman call over all Stage 1 answers.
    ///
    /// A failed chairman call yields the fixed apology result.
    pub async fn stage3_synthesize_with_progress(
        &self,
        query: &str,
        results: &[StageOneResult],
        history: &[Message],
        context: &str,
        progress: &dyn ProgressNotifier,
    ) -> StageThreeResult {
        let stage = Stage::Synthesize;
        let chairman = self.roster.chairman();
        info!("Stage 3: chairman {} synthesizing", chairman);
        progress.on_stage_start(&stage, 1);

        let messages = self.chairman_messages(query, results, history, context);
        let result = match self
            .gateway
            .query(chairman, &messages, self.params.query_timeout)
            .await
        {
            Ok(response) => {
                progress.on_model_complete(&stage, chairman, true);
                StageThreeResult::new(chairman.as_str(), response.content)
            }
            Err(e) => {
                warn!(model = %chairman, error = %e, "Chairman failed, using fallback");
                progress.on_model_complete(&stage, chairman, false);
                StageThreeResult::chairman_unavailable(chairman.as_str())
            }
        };
        progress.on_stage_complete(&stage);

        self.log_stage3(query, &result);
        result
    }

    /// Stage 3 (streaming): re-yield chairman fragments as they arrive.
    ///
    /// A failure at any point ends the stream with [`CHAIRMAN_STREAM_FAILED`];
    /// fragments already delivered stay delivered. Dropping the stream
    /// releases the upstream connection.
    pub fn stage3_synthesize_stream(
        &self,
        query: &str,
        results: &[StageOneResult],
        history: &[Message],
        context: &str,
    ) -> ChunkStream {
        let chairman = self.roster.chairman().clone();
        info!("Stage 3: chairman {} streaming", chairman);

        let messages = self.chairman_messages(query, results, history, context);
        let mut upstream =
            self.gateway
                .query_stream(&chairman, &messages, self.params.query_timeout);
        let logger = Arc::clone(&self.logger);
        let query = query.to_string();

        let stream = async_stream::stream! {
            let mut full_response = String::new();
            while let Some(event) = upstream.next().await {
                match event {
                    StreamEvent::Delta(text) => {
                        full_response.push_str(&text);
                        yield text;
                    }
                    StreamEvent::Error(e) => {
                        warn!(model = %chairman, error = %e, "Chairman stream failed");
                        full_response.push_str(CHAIRMAN_STREAM_FAILED);
                        yield CHAIRMAN_STREAM_FAILED.to_string();
                        break;
                    }
                }
            }
            logger.log(ConversationEvent::new(
                "stage3_complete",
                json!({
                    "query": query,
                    "model": chairman.as_str(),
                    "response": full_response,
                    "streamed": true,
                }),
            ));
        };
        stream.boxed()
    }

    /// Generate a short conversation title from the first user query.
    pub async fn generate_title(&self, query: &str) -> String {
        title_for(
            Arc::clone(&self.gateway),
            self.roster.title_model().clone(),
            self.params.title_timeout,
            Arc::clone(&self.logger),
            query.to_string(),
        )
        .await
    }

    /// Start title generation as an independent task.
    ///
    /// Dropping the handle detaches the task; it is never cancelled here.
    pub fn spawn_title(&self, query: &str) -> JoinHandle<String> {
        tokio::spawn(title_for(
            Arc::clone(&self.gateway),
            self.roster.title_model().clone(),
            self.params.title_timeout,
            Arc::clone(&self.logger),
            query.to_string(),
        ))
    }

    /// Full run with default (no-op) progress
    pub async fn run_full(&self, query: &str, history: &[Message], context: &str) -> CouncilOutcome {
        self.run_full_with_progress(query, history, context, &NoProgress)
            .await
    }

    /// Stage 1 then batch Stage 3.
    ///
    /// When no model answers, the chairman is never called.
    pub async fn run_full_with_progress(
        &self,
        query: &str,
        history: &[Message],
        context: &str,
        progress: &dyn ProgressNotifier,
    ) -> CouncilOutcome {
        let stage1 = self
            .stage1_collect_with_progress(query, history, context, progress)
            .await;

        if stage1.is_empty() {
            warn!("All council models failed, skipping synthesis");
            self.log_all_failed(query);
            return CouncilOutcome::all_failed();
        }

        let stage3 = self
            .stage3_synthesize_with_progress(query, &stage1, history, context, progress)
            .await;
        CouncilOutcome::new(stage1, stage3)
    }

    pub(crate) fn log_all_failed(&self, query: &str) {
        self.logger.log(ConversationEvent::new(
            "council_failed",
            json!({
                "query": query,
                "models": self.roster.members(),
            }),
        ));
    }

    fn log_stage3(&self, query: &str, result: &StageThreeResult) {
        self.logger.log(ConversationEvent::new(
            "stage3_complete",
            json!({
                "query": query,
                "model": &result.model,
                "response": &result.response,
                "streamed": false,
            }),
        ));
    }

    fn chairman_messages(
        &self,
        query: &str,
        results: &[StageOneResult],
        history: &[Message],
        context: &str,
    ) -> Vec<Message> {
        vec![Message::user(PromptTemplate::chairman_prompt(
            query, results, history, context,
        ))]
    }
}

async fn title_for<G: LlmGateway + 'static>(
    gateway: Arc<G>,
    model: Model,
    timeout: Duration,
    logger: Arc<dyn ConversationLogger>,
    query: String,
) -> String {
    let messages = vec![Message::user(PromptTemplate::title_prompt(&query))];
    let title = match gateway.query(&model, &messages, timeout).await {
        Ok(response) => clean_title(&response.content),
        Err(e) => {
            warn!(model = %model, error = %e, "Title generation failed");
            FALLBACK_TITLE.to_string()
        }
    };
    debug!("Generated title: {}", title);

    logger.log(ConversationEvent::new(
        "title_generated",
        json!({ "model": model.as_str(), "title": &title }),
    ));
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use crate::use_cases::testing::{ScriptedGateway, model};
    use council_domain::{ERROR_MODEL_LABEL, MAX_TITLE_CHARS};
    use std::sync::Mutex;

    fn roster(members: &[&str], chairman: &str) -> Roster {
        Roster::new(members.iter().map(|m| model(m)).collect(), model(chairman)).unwrap()
    }

    fn build(
        gateway: ScriptedGateway,
        members: &[&str],
        chairman: &str,
    ) -> (Arc<ScriptedGateway>, CouncilPipeline<ScriptedGateway>) {
        let gateway = Arc::new(gateway);
        let pipeline = CouncilPipeline::new(
            Arc::clone(&gateway),
            roster(members, chairman),
            EngineParams::default(),
        );
        (gateway, pipeline)
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event.event_type);
        }
    }

    #[tokio::test]
    async fn test_end_to_end_two_members() {
        let (gateway, pipeline) = build(
            ScriptedGateway::new()
                .reply("m1", "4")
                .reply("m2", "four")
                .reply("m3", "Both agree: 4."),
            &["m1", "m2"],
            "m3",
        );

        let outcome = pipeline.run_full("What is 2+2?", &[], "").await;

        assert_eq!(
            outcome.stage1,
            vec![
                StageOneResult::new("m1", "4"),
                StageOneResult::new("m2", "four"),
            ]
        );
        assert_eq!(outcome.stage3, StageThreeResult::new("m3", "Both agree: 4."));

        let chairman_calls = gateway.calls_to("m3");
        assert_eq!(chairman_calls.len(), 1);
        let prompt = &chairman_calls[0][0].content;
        assert!(prompt.contains("Model: m1\nResponse: 4"));
        assert!(prompt.contains("Model: m2\nResponse: four"));
        assert!(prompt.contains("Original Question: What is 2+2?"));
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_roster_order() {
        let (_, pipeline) = build(
            ScriptedGateway::new()
                .delayed("a", Duration::from_millis(30), "slow")
                .fail("b", GatewayError::Timeout)
                .reply("c", "fast"),
            &["a", "b", "c"],
            "chair",
        );

        let results = pipeline.stage1_collect("q", &[], "").await;

        assert_eq!(
            results,
            vec![StageOneResult::new("a", "slow"), StageOneResult::new("c", "fast")]
        );
    }

    #[tokio::test]
    async fn test_all_failed_skips_chairman() {
        let logger = Arc::new(RecordingLogger::default());
        let (gateway, pipeline) = build(
            ScriptedGateway::new()
                .fail("m1", GatewayError::Timeout)
                .fail("m2", GatewayError::Http {
                    status: 500,
                    message: "boom".to_string(),
                })
                .reply("m3", "should not be asked"),
            &["m1", "m2"],
            "m3",
        );
        let pipeline = pipeline.with_conversation_logger(logger.clone());

        let outcome = pipeline.run_full("q", &[], "").await;

        assert!(outcome.stage1.is_empty());
        assert_eq!(outcome.stage3.model, ERROR_MODEL_LABEL);
        assert!(!outcome.stage3.response.is_empty());
        assert!(gateway.calls_to("m3").is_empty());
        assert_eq!(
            *logger.events.lock().unwrap(),
            vec!["stage1_complete", "council_failed"]
        );
    }

    #[tokio::test]
    async fn test_chairman_failure_returns_fallback() {
        let (_, pipeline) = build(
            ScriptedGateway::new().fail("chair", GatewayError::Transport("reset".to_string())),
            &["a"],
            "chair",
        );

        let result = pipeline
            .stage3_synthesize("q", &[StageOneResult::new("a", "x")], &[], "")
            .await;

        assert_eq!(result, StageThreeResult::chairman_unavailable("chair"));
    }

    #[tokio::test]
    async fn test_context_is_prepended_to_stage1_turn() {
        let (gateway, pipeline) = build(
            ScriptedGateway::new().reply("a", "ok"),
            &["a"],
            "chair",
        );
        let history = vec![Message::user("earlier"), Message::assistant("answer")];

        pipeline
            .stage1_collect("Why?", &history, "Source: f.md\nContent: text")
            .await;

        let sent = &gateway.calls_to("a")[0];
        assert_eq!(sent.len(), 3);
        assert_eq!(&sent[..2], &history[..]);
        assert_eq!(
            sent[2].content,
            "Reference Documents:\nSource: f.md\nContent: text\n\nQuestion: Why?"
        );
    }

    #[tokio::test]
    async fn test_stream_yields_fragments_in_order() {
        let (_, pipeline) = build(
            ScriptedGateway::new().stream(
                "chair",
                vec![
                    StreamEvent::Delta("Hel".to_string()),
                    StreamEvent::Delta("lo".to_string()),
                ],
            ),
            &["a"],
            "chair",
        );

        let chunks: Vec<String> = pipeline
            .stage3_synthesize_stream("q", &[StageOneResult::new("a", "x")], &[], "")
            .collect()
            .await;

        assert_eq!(chunks, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_failure_ends_with_marker() {
        let (_, pipeline) = build(
            ScriptedGateway::new().stream(
                "chair",
                vec![
                    StreamEvent::Delta("partial".to_string()),
                    StreamEvent::Error("connection reset".to_string()),
                    StreamEvent::Delta("never".to_string()),
                ],
            ),
            &["a"],
            "chair",
        );

        let chunks: Vec<String> = pipeline
            .stage3_synthesize_stream("q", &[StageOneResult::new("a", "x")], &[], "")
            .collect()
            .await;

        assert_eq!(
            chunks,
            vec!["partial".to_string(), CHAIRMAN_STREAM_FAILED.to_string()]
        );
    }

    #[tokio::test]
    async fn test_title_uses_first_member_and_is_cleaned() {
        let long = format!("\"{}\"", "t".repeat(60));
        let (gateway, pipeline) = build(
            ScriptedGateway::new().reply("first", &long),
            &["first", "second"],
            "chair",
        );

        let title = pipeline.generate_title("Explain ownership").await;

        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
        assert!(title.ends_with("..."));
        assert_eq!(gateway.calls_to("first").len(), 1);
        assert!(gateway.calls_to("second").is_empty());
    }

    #[tokio::test]
    async fn test_title_failure_falls_back() {
        let (_, pipeline) = build(
            ScriptedGateway::new().fail("first", GatewayError::Timeout),
            &["first"],
            "chair",
        );

        assert_eq!(pipeline.generate_title("q").await, FALLBACK_TITLE);
    }

    #[tokio::test]
    async fn test_spawned_title_runs_independently() {
        let (_, pipeline) = build(
            ScriptedGateway::new().reply("first", "Ownership Basics"),
            &["first"],
            "chair",
        );

        let handle = pipeline.spawn_title("Explain ownership");
        assert_eq!(handle.await.unwrap(), "Ownership Basics");
    }
}
