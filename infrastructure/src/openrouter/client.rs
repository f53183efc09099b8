//! OpenRouter chat completions client.

use super::gate::ConcurrencyGate;
use super::retry::{RetryPolicy, Sleeper, TokioSleeper};
use super::sse::{SseDecoder, SseFrame};
use async_trait::async_trait;
use council_application::{FragmentStream, GatewayError, LlmGateway};
use council_domain::{Message, Model, ModelResponse, StreamEvent};
use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest slice of an error body kept in a [`GatewayError::Http`].
const MAX_ERROR_BODY: usize = 512;

/// Endpoint and credentials for [`OpenRouterClient`].
#[derive(Debug, Clone)]
pub struct OpenRouterSettings {
    pub api_url: String,
    pub api_key: String,
    pub referer: Option<String>,
    pub app_title: Option<String>,
}

impl OpenRouterSettings {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            referer: None,
            app_title: None,
        }
    }

    pub fn with_attribution(mut self, referer: Option<String>, app_title: Option<String>) -> Self {
        self.referer = referer;
        self.app_title = app_title;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    reasoning_details: Option<Value>,
}

/// [`LlmGateway`] adapter for an OpenAI-compatible chat completions endpoint.
///
/// Every request passes through the shared [`ConcurrencyGate`]. The slot is
/// taken before the first attempt and held through all retries. Only HTTP 429
/// is retried; any other failure ends the call.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_url: String,
    gate: ConcurrencyGate,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl OpenRouterClient {
    pub fn new(
        settings: OpenRouterSettings,
        gate: ConcurrencyGate,
        retry: RetryPolicy,
    ) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", settings.api_key))
            .map_err(|_| GatewayError::Other("invalid API key format".to_string()))?;
        headers.insert(AUTHORIZATION, auth_value);

        if let Some(referer) = &settings.referer
            && let Ok(value) = HeaderValue::from_str(referer)
        {
            headers.insert("HTTP-Referer", value);
        }
        if let Some(title) = &settings.app_title
            && let Ok(value) = HeaderValue::from_str(title)
        {
            headers.insert("X-Title", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: settings.api_url,
            gate,
            retry,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the backoff sleeper (tests record delays instead of waiting).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Send the request until it is accepted, rate limits permitting.
    ///
    /// For non-streaming calls `timeout` covers the whole exchange; for
    /// streaming calls it bounds only connection and response headers.
    async fn open(
        &self,
        model: &Model,
        messages: &[Message],
        stream: bool,
        timeout: Duration,
    ) -> Result<reqwest::Response, GatewayError> {
        let body = ChatRequest {
            model: model.as_str(),
            messages,
            stream,
        };

        let mut attempt = 0;
        loop {
            let mut request = self.http.post(&self.api_url).json(&body);
            if !stream {
                request = request.timeout(timeout);
            }

            let response = match tokio::time::timeout(timeout, request.send()).await {
                Err(_) => return Err(GatewayError::Timeout),
                Ok(Err(e)) => return Err(map_transport_error(e)),
                Ok(Ok(response)) => response,
            };

            let status = response.status();
            if status.is_success() {
                debug!(model = %model, attempt, "Request accepted");
                return Ok(response);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if self.retry.should_retry(attempt) {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        model = %model,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Err(GatewayError::RateLimited {
                    model: model.to_string(),
                    attempts: self.retry.max_attempts(),
                });
            }

            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }
    }

    async fn query_inner(
        &self,
        model: &Model,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<ModelResponse, GatewayError> {
        let _permit = self.gate.acquire().await?;

        let response = self.open(model, messages, false, timeout).await?;
        let bytes = response.bytes().await.map_err(map_transport_error)?;

        let completion: ChatCompletion = serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        let message = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .ok_or_else(|| {
                GatewayError::MalformedResponse("missing choices[0].message".to_string())
            })?;

        let mut response = ModelResponse::new(message.content.unwrap_or_default());
        if let Some(details) = message.reasoning_details.filter(|v| !v.is_null()) {
            response = response.with_reasoning(details);
        }
        Ok(response)
    }
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(e.to_string())
    }
}

#[async_trait]
impl LlmGateway for OpenRouterClient {
    async fn query(
        &self,
        model: &Model,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<ModelResponse, GatewayError> {
        let result = self.query_inner(model, messages, timeout).await;
        if let Err(e) = &result {
            warn!(model = %model, error = %e, "Model query failed");
        }
        result
    }

    fn query_stream(&self, model: &Model, messages: &[Message], timeout: Duration) -> FragmentStream {
        let client = self.clone();
        let model = model.clone();
        let messages = messages.to_vec();

        let stream = async_stream::stream! {
            let _permit = match client.gate.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    yield StreamEvent::Error(e.to_string());
                    return;
                }
            };

            let response = match client.open(&model, &messages, true, timeout).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(model = %model, error = %e, "Stream failed to open");
                    yield StreamEvent::Error(e.to_string());
                    return;
                }
            };

            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            loop {
                let next = match tokio::time::timeout(timeout, body.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!(model = %model, "Stream stalled");
                        yield StreamEvent::Error(GatewayError::Timeout.to_string());
                        return;
                    }
                };

                let (frames, ended) = match next {
                    Some(Ok(chunk)) => (decoder.feed(&chunk), false),
                    Some(Err(e)) => {
                        let error = GatewayError::Stream(e.to_string());
                        warn!(model = %model, error = %error, "Stream broke off");
                        yield StreamEvent::Error(error.to_string());
                        return;
                    }
                    None => (decoder.finish(), true),
                };

                for frame in frames {
                    match frame {
                        SseFrame::Delta(text) => yield StreamEvent::Delta(text),
                        SseFrame::Done => return,
                        SseFrame::UpstreamError(message) => {
                            warn!(model = %model, error = %message, "Upstream error in stream");
                            yield StreamEvent::Error(message);
                            return;
                        }
                    }
                }

                if ended {
                    return;
                }
            }
        };
        stream.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    /// Answers 429 a fixed number of times, then succeeds.
    struct RateLimitedThenOk {
        remaining_429s: AtomicUsize,
        success: ResponseTemplate,
    }

    impl Respond for RateLimitedThenOk {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let left = self.remaining_429s.load(Ordering::SeqCst);
            if left > 0 {
                self.remaining_429s.store(left - 1, Ordering::SeqCst);
                ResponseTemplate::new(429).set_body_string("slow down")
            } else {
                self.success.clone()
            }
        }
    }

    fn model(id: &str) -> Model {
        Model::new(id).unwrap()
    }

    fn client(server: &MockServer, sleeper: Arc<RecordingSleeper>) -> OpenRouterClient {
        let settings = OpenRouterSettings::new(format!("{}/chat/completions", server.uri()), "sk-test")
            .with_attribution(Some("https://example.com".to_string()), Some("Council".to_string()));
        OpenRouterClient::new(settings, ConcurrencyGate::new(2), RetryPolicy::default())
            .unwrap()
            .with_sleeper(sleeper)
    }

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    fn sse(lines: &[&str]) -> ResponseTemplate {
        let body: String = lines.iter().map(|l| format!("{}\n\n", l)).collect();
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/event-stream")
            .set_body_string(body)
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_query_success_sends_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("HTTP-Referer", "https://example.com"))
            .and(header("X-Title", "Council"))
            .and(body_partial_json(json!({
                "model": "openai/gpt-4o",
                "messages": [{ "role": "user", "content": "What is 2+2?" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": {
                    "content": "4",
                    "reasoning_details": [{ "type": "reasoning.text", "text": "add" }]
                } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server, Arc::default())
            .query(&model("openai/gpt-4o"), &[Message::user("What is 2+2?")], TIMEOUT)
            .await
            .unwrap();

        assert_eq!(response.content, "4");
        assert!(response.reasoning_details.is_some());
    }

    #[tokio::test]
    async fn test_three_rate_limits_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(RateLimitedThenOk {
                remaining_429s: AtomicUsize::new(3),
                success: completion("finally"),
            })
            .expect(4)
            .mount(&server)
            .await;
        let sleeper = Arc::new(RecordingSleeper::default());

        let response = client(&server, sleeper.clone())
            .query(&model("m"), &[Message::user("hi")], TIMEOUT)
            .await
            .unwrap();

        assert_eq!(response, ModelResponse::new("finally"));
        let delays = sleeper.delays.lock().unwrap().clone();
        assert_eq!(delays.len(), 3);
        for (delay, base) in delays.iter().zip([1u64, 2, 4]) {
            assert!(*delay >= Duration::from_secs(base));
            assert!(*delay < Duration::from_secs(base + 1));
        }
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(4)
            .mount(&server)
            .await;
        let sleeper = Arc::new(RecordingSleeper::default());

        let result = client(&server, sleeper.clone())
            .query(&model("m"), &[Message::user("hi")], TIMEOUT)
            .await;

        assert_eq!(
            result,
            Err(GatewayError::RateLimited {
                model: "m".to_string(),
                attempts: 4,
            })
        );
        assert_eq!(sleeper.delays.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(1)
            .mount(&server)
            .await;
        let sleeper = Arc::new(RecordingSleeper::default());

        let result = client(&server, sleeper.clone())
            .query(&model("m"), &[Message::user("hi")], TIMEOUT)
            .await;

        assert_eq!(
            result,
            Err(GatewayError::Http {
                status: 500,
                message: "upstream exploded".to_string(),
            })
        );
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_message_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let result = client(&server, Arc::default())
            .query(&model("m"), &[Message::user("hi")], TIMEOUT)
            .await;

        assert!(matches!(result, Err(GatewayError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_null_content_is_empty_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": null } }]
            })))
            .mount(&server)
            .await;

        let response = client(&server, Arc::default())
            .query(&model("m"), &[Message::user("hi")], TIMEOUT)
            .await
            .unwrap();

        assert_eq!(response.content, "");
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion("late").set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let result = client(&server, Arc::default())
            .query(&model("m"), &[Message::user("hi")], Duration::from_millis(50))
            .await;

        assert_eq!(result, Err(GatewayError::Timeout));
    }

    #[tokio::test]
    async fn test_stream_yields_deltas_until_done() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "stream": true })))
            .respond_with(sse(&[
                r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
                "data: {broken",
                r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
                "data: [DONE]",
                r#"data: {"choices":[{"delta":{"content":"after"}}]}"#,
            ]))
            .mount(&server)
            .await;

        let events: Vec<StreamEvent> = client(&server, Arc::default())
            .query_stream(&model("m"), &[Message::user("hi")], TIMEOUT)
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hel".to_string()),
                StreamEvent::Delta("lo".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_upstream_error_terminates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(sse(&[
                r#"data: {"choices":[{"delta":{"content":"par"}}]}"#,
                r#"data: {"error":{"message":"overloaded"}}"#,
                r#"data: {"choices":[{"delta":{"content":"never"}}]}"#,
            ]))
            .mount(&server)
            .await;

        let events: Vec<StreamEvent> = client(&server, Arc::default())
            .query_stream(&model("m"), &[Message::user("hi")], TIMEOUT)
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("par".to_string()),
                StreamEvent::Error("overloaded".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_connection_retries_rate_limits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(RateLimitedThenOk {
                remaining_429s: AtomicUsize::new(1),
                success: sse(&[r#"data: {"choices":[{"delta":{"content":"ok"}}]}"#, "data: [DONE]"]),
            })
            .expect(2)
            .mount(&server)
            .await;
        let sleeper = Arc::new(RecordingSleeper::default());

        let events: Vec<StreamEvent> = client(&server, sleeper.clone())
            .query_stream(&model("m"), &[Message::user("hi")], TIMEOUT)
            .collect()
            .await;

        assert_eq!(events, vec![StreamEvent::Delta("ok".to_string())]);
        assert_eq!(sleeper.delays.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stream_http_error_is_single_error_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let events: Vec<StreamEvent> = client(&server, Arc::default())
            .query_stream(&model("m"), &[Message::user("hi")], TIMEOUT)
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], StreamEvent::Error(e) if e.contains("401")));
    }

    /// Records how many gate slots were free each time a backoff started.
    struct GateObservingSleeper {
        gate: ConcurrencyGate,
        free_slots: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Sleeper for GateObservingSleeper {
        async fn sleep(&self, _duration: Duration) {
            self.free_slots.lock().unwrap().push(self.gate.available());
        }
    }

    fn gated_client(server: &MockServer, gate: ConcurrencyGate) -> OpenRouterClient {
        let settings = OpenRouterSettings::new(format!("{}/chat/completions", server.uri()), "sk-test");
        OpenRouterClient::new(settings, gate, RetryPolicy::default()).unwrap()
    }

    #[tokio::test]
    async fn test_gate_is_held_during_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(RateLimitedThenOk {
                remaining_429s: AtomicUsize::new(2),
                success: completion("ok"),
            })
            .mount(&server)
            .await;
        let gate = ConcurrencyGate::new(1);
        let sleeper = Arc::new(GateObservingSleeper {
            gate: gate.clone(),
            free_slots: Mutex::new(Vec::new()),
        });

        let response = gated_client(&server, gate.clone())
            .with_sleeper(sleeper.clone())
            .query(&model("m"), &[Message::user("hi")], TIMEOUT)
            .await
            .unwrap();

        assert_eq!(response.content, "ok");
        assert_eq!(*sleeper.free_slots.lock().unwrap(), vec![0, 0]);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_gate_serializes_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion("ok").set_delay(Duration::from_millis(100)))
            .mount(&server)
            .await;
        let client = gated_client(&server, ConcurrencyGate::new(1));

        let started = std::time::Instant::now();
        let (model_a, model_b) = (model("a"), model("b"));
        let messages = [Message::user("hi")];
        let (a, b) = tokio::join!(
            client.query(&model_a, &messages, TIMEOUT),
            client.query(&model_b, &messages, TIMEOUT),
        );

        assert!(a.is_ok() && b.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(client.gate().available(), 1);
    }

    /// Serves one raw HTTP response and then runs `after` on the socket.
    async fn raw_server<F, Fut>(head_and_body: &'static str, after: F) -> String
    where
        F: FnOnce(tokio::net::TcpStream) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Drain the whole request so closing the socket is a clean FIN
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket.write_all(head_and_body.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            after(socket).await;
        });
        format!("http://{}/chat/completions", addr)
    }

    fn raw_client(url: String) -> OpenRouterClient {
        OpenRouterClient::new(
            OpenRouterSettings::new(url, "sk-test"),
            ConcurrencyGate::new(1),
            RetryPolicy::default(),
        )
        .unwrap()
    }

    const PARTIAL_SSE: &str = "HTTP/1.1 200 OK\r\n\
content-type: text/event-stream\r\n\
content-length: 4096\r\n\r\n\
data: {\"choices\":[{\"delta\":{\"content\":\"par\"}}]}\n\n";

    #[tokio::test]
    async fn test_stream_broken_body_ends_with_error() {
        // Promises 4096 bytes, sends one frame, then hangs up
        let url = raw_server(PARTIAL_SSE, |socket| async move { drop(socket) }).await;

        let events: Vec<StreamEvent> = raw_client(url)
            .query_stream(&model("m"), &[Message::user("hi")], TIMEOUT)
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::Delta("par".to_string()));
        assert!(matches!(&events[1], StreamEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let url = raw_server(PARTIAL_SSE, |socket| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        })
        .await;

        let started = std::time::Instant::now();
        let events: Vec<StreamEvent> = raw_client(url)
            .query_stream(&model("m"), &[Message::user("hi")], Duration::from_millis(200))
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("par".to_string()),
                StreamEvent::Error(GatewayError::Timeout.to_string()),
            ]
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
