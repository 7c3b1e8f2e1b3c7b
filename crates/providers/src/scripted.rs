//! Scripted provider: replays a fixed sequence of responses.
//!
//! Stands in for a real model in tests and in the CLI's offline mode.
//! Each `complete` call consumes the next scripted entry; running past the
//! end is a [`CompletionError::ScriptExhausted`] rather than a panic, so a
//! loop that asks for more than the script holds fails cleanly.

use async_trait::async_trait;
use planloop_core::error::{CompletionError, Error};
use planloop_core::provider::{Completion, CompletionRequest, Provider, Usage};
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reply: response text or a failure.
pub type ScriptStep = Result<String, CompletionError>;

pub struct ScriptedProvider {
    name: String,
    steps: Vec<ScriptStep>,
    cycle: bool,
    delay: Option<Duration>,
    state: Mutex<ScriptState>,
}

#[derive(Default)]
struct ScriptState {
    calls: usize,
    requests: Vec<CompletionRequest>,
}

impl ScriptedProvider {
    pub fn new(name: impl Into<String>, steps: Vec<ScriptStep>) -> Self {
        Self {
            name: name.into(),
            steps,
            cycle: false,
            delay: None,
            state: Mutex::new(ScriptState::default()),
        }
    }

    /// Script made only of successful text responses.
    pub fn from_texts<I, S>(name: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, texts.into_iter().map(|t| Ok(t.into())).collect())
    }

    /// Restart from the first step instead of running dry.
    pub fn cycled(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Load a script file.
    ///
    /// A JSON array whose items are either response strings or
    /// `{"error": "message"}` objects; anything that is not such an array is
    /// read as plain text with responses separated by lines holding only `---`.
    pub fn from_file(path: &Path) -> planloop_core::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Script {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let steps = Self::parse_script(&content);
        if steps.is_empty() {
            return Err(Error::Script {
                path: path.to_path_buf(),
                reason: "script holds no responses".into(),
            });
        }
        Ok(Self::new("scripted", steps))
    }

    fn parse_script(content: &str) -> Vec<ScriptStep> {
        if let Ok(entries) = serde_json::from_str::<Vec<ScriptEntry>>(content) {
            return entries
                .into_iter()
                .map(|entry| match entry {
                    ScriptEntry::Text(text) => Ok(text),
                    ScriptEntry::Error { error } => Err(CompletionError::Api {
                        status_code: 500,
                        message: error,
                    }),
                })
                .collect();
        }

        let mut steps = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in content.lines() {
            if line.trim() == "---" {
                steps.push(Ok(current.join("\n").trim().to_string()));
                current.clear();
            } else {
                current.push(line);
            }
        }
        let tail = current.join("\n");
        if !tail.trim().is_empty() {
            steps.push(Ok(tail.trim().to_string()));
        }
        steps
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.lock().requests.iter().map(|r| r.prompt.clone()).collect()
    }

    /// Every request received, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().requests.clone()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_step(&self, request: &CompletionRequest) -> ScriptStep {
        let mut state = self.lock();
        let call = state.calls;
        state.calls += 1;
        state.requests.push(request.clone());

        let index = if self.cycle && !self.steps.is_empty() {
            call % self.steps.len()
        } else {
            call
        };
        self.steps
            .get(index)
            .cloned()
            .unwrap_or(Err(CompletionError::ScriptExhausted { calls: call + 1 }))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptEntry {
    Text(String),
    Error { error: String },
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<Completion, CompletionError> {
        let step = self.next_step(&request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let text = step?;
        let completion_tokens = text.split_whitespace().count() as u32;
        Ok(Completion {
            text,
            model: request.model,
            usage: Some(Usage {
                prompt_tokens: 0,
                completion_tokens,
                total_tokens: completion_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest::new("scripted-model", prompt)
    }

    #[tokio::test]
    async fn replays_in_order_then_exhausts() {
        let provider = ScriptedProvider::from_texts("s", ["Call get_time", "YES, done"]);
        assert_eq!(provider.complete(request("plan")).await.unwrap().text, "Call get_time");
        assert_eq!(provider.complete(request("reflect")).await.unwrap().text, "YES, done");

        let err = provider.complete(request("again")).await.unwrap_err();
        assert!(matches!(err, CompletionError::ScriptExhausted { calls: 3 }));
        assert_eq!(provider.calls(), 3);
        assert_eq!(provider.prompts(), vec!["plan", "reflect", "again"]);
    }

    #[tokio::test]
    async fn scripted_errors_are_returned() {
        let provider = ScriptedProvider::new(
            "s",
            vec![Err(CompletionError::Network("reset".into())), Ok("fine".into())],
        );
        assert!(matches!(
            provider.complete(request("a")).await,
            Err(CompletionError::Network(_))
        ));
        assert_eq!(provider.complete(request("b")).await.unwrap().text, "fine");
    }

    #[tokio::test]
    async fn cycled_script_never_runs_dry() {
        let provider = ScriptedProvider::from_texts("s", ["plan", "NO"]).cycled();
        let mut texts = Vec::new();
        for _ in 0..5 {
            texts.push(provider.complete(request("p")).await.unwrap().text);
        }
        assert_eq!(texts, vec!["plan", "NO", "plan", "NO", "plan"]);
    }

    #[test]
    fn parse_json_script() {
        let steps =
            ScriptedProvider::parse_script(r#"["Call get_time", {"error": "overloaded"}, "YES"]"#);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].as_deref().ok(), Some("Call get_time"));
        assert!(matches!(steps[1], Err(CompletionError::Api { .. })));
    }

    #[test]
    fn parse_text_script() {
        let steps =
            ScriptedProvider::parse_script("Step 1: call get_weather\nStep 2: done\n---\nYES\n");
        assert_eq!(steps.len(), 2);
        assert_eq!(
            steps[0].as_deref().ok(),
            Some("Step 1: call get_weather\nStep 2: done")
        );
        assert_eq!(steps[1].as_deref().ok(), Some("YES"));
    }

    #[test]
    fn from_file_reads_script() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["a", "b"]"#).unwrap();
        let provider = ScriptedProvider::from_file(file.path()).unwrap();
        assert_eq!(provider.len(), 2);
        assert_eq!(provider.name(), "scripted");
    }

    #[test]
    fn bracketed_text_is_not_mistaken_for_json() {
        let steps = ScriptedProvider::parse_script("[1] Call get_time\n---\nYES\n");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].as_deref().ok(), Some("[1] Call get_time"));
        assert_eq!(steps[1].as_deref().ok(), Some("YES"));

        let steps = ScriptedProvider::parse_script("[Plan]\nUse get_weather\n---\nYES");
        assert_eq!(steps[0].as_deref().ok(), Some("[Plan]\nUse get_weather"));
    }

    #[test]
    fn from_file_accepts_bracketed_text_script() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1] Call get_time\n---\nYES\n").unwrap();
        let provider = ScriptedProvider::from_file(file.path()).unwrap();
        assert_eq!(provider.len(), 2);
    }

    #[test]
    fn missing_file_is_script_error() {
        let err = ScriptedProvider::from_file(Path::new("/nonexistent/script.json"))
            .err()
            .unwrap();
        match err {
            Error::Script { path, .. } => assert_eq!(path, Path::new("/nonexistent/script.json")),
            other => panic!("Expected Script error, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_script_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = ScriptedProvider::from_file(file.path()).err().unwrap();
        assert!(err.to_string().contains("no responses"));
    }

    #[tokio::test]
    async fn records_whole_requests() {
        let provider = ScriptedProvider::from_texts("s", ["ok"]);
        provider
            .complete(CompletionRequest::new("llama3.2", "plan"))
            .await
            .unwrap();
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "llama3.2");
    }
}
