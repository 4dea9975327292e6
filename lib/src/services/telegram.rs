use serde::{Deserialize, Serialize};

use super::{Service, ServiceError, ServiceResult};

/// Outbound half of the Telegram bridge: relays professor messages to a
/// student's linked chat and delivers operational alerts (escalations) to a
/// fixed chat configured for the platform team.
#[derive(Debug, Clone)]
pub struct TelegramService {
    service: Service,
    bot_token: String,
    operations_chat_id: i64,
}

impl TelegramService {
    pub(super) fn new(service: Service, bot_token: String, operations_chat_id: i64) -> Self {
        Self {
            service,
            bot_token,
            operations_chat_id,
        }
    }

    /// Send plain text to a specific chat (the per-student relay).
    pub async fn send_message(&self, chat_id: i64, text: &str) -> ServiceResult<()> {
        self.call(SendMessageRequest {
            chat_id,
            text,
            parse_mode: None,
        })
        .await
    }

    /// Send a Markdown-formatted alert to the fixed operational chat.
    pub async fn notify_operations(&self, text: &str) -> ServiceResult<()> {
        self.call(SendMessageRequest {
            chat_id: self.operations_chat_id,
            text,
            parse_mode: Some("Markdown"),
        })
        .await
    }

    async fn call(&self, request: SendMessageRequest<'_>) -> ServiceResult<()> {
        let response = self
            .service
            .post(&format!("bot{}/sendMessage", self.bot_token))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::UnexpectedStatusCode(status));
        }
        let body: SendMessageResponse = response.json().await?;
        match body.ok {
            true => Ok(()),
            false => Err(ServiceError::Rejected(self.service.name)),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = SendMessageRequest {
            chat_id: 42,
            text: "hello",
            parse_mode: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["chat_id"], 42);
        assert_eq!(value["text"], "hello");
        assert!(value.get("parse_mode").is_none());

        let request = SendMessageRequest {
            chat_id: 42,
            text: "*alert*",
            parse_mode: Some("Markdown"),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["parse_mode"], "Markdown");
    }
}
