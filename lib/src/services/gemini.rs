use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use super::{Service, ServiceError, ServiceResult};

/// Client for the `generateContent` endpoint of the generative language API.
///
/// Every model interaction of the platform goes through [`Self::generate`]:
/// study text synthesis, refinement, quiz/test/presentation generation, chat
/// replies and progress analysis. Calls are neither cached nor retried; two
/// calls with the same prompt may yield different text.
#[derive(Debug, Clone)]
pub struct GeminiService {
    service: Service,
    api_key: String,
    model: String,
}

impl GeminiService {
    pub(super) fn new(service: Service, api_key: String, model: String) -> Self {
        Self {
            service,
            api_key,
            model,
        }
    }

    /// Send a prompt to the model and return the raw text of the first
    /// candidate.
    ///
    /// With `schema` set, the model is asked for structured JSON output
    /// matching the shape; the provider guarantees the format, so the caller
    /// is responsible for parsing the returned string and deciding what a
    /// parse failure means.
    pub async fn generate(
        &self,
        prompt: &str,
        schema: Option<Value>,
        system_instruction: Option<&str>,
    ) -> ServiceResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.into(),
                }],
            }],
            generation_config: schema.map(|schema| GenerationConfig {
                response_mime_type: "application/json".into(),
                response_schema: schema,
            }),
            system_instruction: system_instruction.map(|text| Content {
                parts: vec![Part { text: text.into() }],
            }),
        };

        let response = self
            .service
            .post(&format!("models/{}:generateContent", self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("gemini api error {status}: {body}");
            return Err(ServiceError::UnexpectedStatusCode(status));
        }

        let response: GenerateContentResponse = response.json().await?;
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or(ServiceError::MalformedResponse(self.service.name))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "hello".into(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".into(),
                response_schema: json!({"type": "ARRAY"}),
            }),
            system_instruction: Some(Content {
                parts: vec![Part {
                    text: "be brief".into(),
                }],
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["generationConfig"]["responseSchema"]["type"], "ARRAY");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be brief");
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let request = GenerateContentRequest {
            contents: vec![],
            generation_config: None,
            system_instruction: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("generationConfig").is_none());
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "answer"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.candidates[0].content.parts[0].text, "answer");

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.candidates.is_empty());
    }
}
