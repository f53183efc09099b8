//! Fan-Out Dispatcher
//!
//! Sends one shared message history to every model concurrently and waits
//! for all of them to settle.

use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use council_domain::{Message, Model, ModelResponse};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Per-model outcome of a fan-out. Iteration order carries no meaning.
pub type DispatchResults = HashMap<Model, Result<ModelResponse, GatewayError>>;

/// Issues one query per model, all in flight at once
pub struct FanOutDispatcher<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    timeout: Duration,
}

impl<G: LlmGateway + 'static> FanOutDispatcher<G> {
    pub fn new(gateway: Arc<G>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    /// Query every model with `messages` and collect every outcome.
    pub async fn dispatch_all(&self, models: &[Model], messages: &[Message]) -> DispatchResults {
        self.dispatch_all_with(models, messages, &|_, _| {}).await
    }

    /// Like [`dispatch_all`](Self::dispatch_all), calling `on_complete` as
    /// each model settles (in completion order).
    pub async fn dispatch_all_with(
        &self,
        models: &[Model],
        messages: &[Message],
        on_complete: &(dyn Fn(&Model, bool) + Sync),
    ) -> DispatchResults {
        let messages: Arc<[Message]> = messages.into();
        let mut join_set = JoinSet::new();

        for model in models {
            let gateway = Arc::clone(&self.gateway);
            let messages = Arc::clone(&messages);
            let model = model.clone();
            let timeout = self.timeout;

            join_set.spawn(async move {
                let result = gateway.query(&model, &messages, timeout).await;
                (model, result)
            });
        }

        let mut results = DispatchResults::with_capacity(models.len());

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((model, result)) => {
                    match &result {
                        Ok(_) => debug!(model = %model, "Model responded"),
                        Err(e) => warn!(model = %model, error = %e, "Model failed"),
                    }
                    on_complete(&model, result.is_ok());
                    results.insert(model, result);
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }

        // A panicked task loses its model id; record it as a failure.
        for model in models {
            if !results.contains_key(model) {
                on_complete(model, false);
                results.insert(
                    model.clone(),
                    Err(GatewayError::Other("query task aborted".to_string())),
                );
            }
        }

        results
    }
}
