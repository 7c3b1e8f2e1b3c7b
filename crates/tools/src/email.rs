//! E-mail tool: stub that records messages in an outbox instead of sending.

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::{ParamKind, Tool, ToolArgs, ToolParameter, str_arg};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::info;

/// A message the tool would have sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub message: String,
}

/// Shared view of everything "sent" so far.
pub type Outbox = Arc<Mutex<Vec<SentEmail>>>;

#[derive(Default)]
pub struct EmailTool {
    outbox: Outbox,
}

impl EmailTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle on the outbox, for inspecting what the loop sent.
    pub fn outbox(&self) -> Outbox {
        Arc::clone(&self.outbox)
    }
}

#[async_trait]
impl Tool for EmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send an email. Requires recipient, subject and message."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required("recipient", ParamKind::String, "Email address to send to"),
            ToolParameter::required("subject", ParamKind::String, "Subject line"),
            ToolParameter::required("message", ParamKind::String, "Body text"),
        ]
    }

    async fn execute(&self, arguments: &ToolArgs) -> Result<String, ToolError> {
        let recipient = str_arg(self.name(), arguments, "recipient")?;
        if !recipient.contains('@') {
            return Err(ToolError::invalid_arguments(
                self.name(),
                format!("'{recipient}' is not an email address"),
            ));
        }

        let email = SentEmail {
            recipient: recipient.to_string(),
            subject: str_arg(self.name(), arguments, "subject")?.to_string(),
            message: str_arg(self.name(), arguments, "message")?.to_string(),
        };
        info!(recipient = %email.recipient, subject = %email.subject, "Recorded outgoing email");

        self.outbox
            .lock()
            .map_err(|e| ToolError::execution(self.name(), e))?
            .push(email);

        Ok("Email sent successfully.".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planloop_core::ToolRegistry;
    use serde_json::json;

    #[tokio::test]
    async fn records_message() {
        let tool = EmailTool::new();
        let outbox = tool.outbox();
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(tool)).unwrap();

        let output = registry
            .invoke(
                "send_email",
                json!({"recipient": "ana@example.com", "subject": "Weather", "message": "19°C in Paris"}),
            )
            .await
            .unwrap();
        assert_eq!(output, "Email sent successfully.");

        let sent = outbox.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Weather");
    }

    #[tokio::test]
    async fn missing_subject_is_argument_error() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EmailTool::new())).unwrap();
        let err = registry
            .invoke("send_email", json!({"recipient": "a@b.c", "message": "hi"}))
            .await
            .unwrap_err();
        match err {
            ToolError::InvalidArguments { reason, .. } => assert!(reason.contains("subject")),
            other => panic!("Expected InvalidArguments, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_malformed_recipient() {
        let tool = EmailTool::new();
        let args = json!({"recipient": "nobody", "subject": "s", "message": "m"});
        let err = tool.execute(args.as_object().unwrap()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
        assert!(tool.outbox().lock().unwrap().is_empty());
    }
}
