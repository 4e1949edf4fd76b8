//! LLM collaborator for generated content.
//!
//! Three call sites: the daily connection question, date-idea suggestions,
//! and metadata extraction for a shared URL. Every call degrades to a
//! hardcoded fallback when the key is missing or the request fails, so the
//! primary flow always completes.

use serde::{Deserialize, Serialize};

const DEFAULT_QUESTION: &str =
    "What is one small thing your partner did recently that you appreciated?";

const DEFAULT_DATE_IDEAS: &[&str] = &[
    "Cook the same recipe together over a video call",
    "Watch a movie in sync and text your reactions",
    "Take a photo walk and swap your three favorite shots",
];

#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlMetadata {
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub kind: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl LlmClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var("TOGETHER_APART_LLM_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            std::env::var("TOGETHER_APART_LLM_KEY").ok(),
            std::env::var("TOGETHER_APART_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
        )
    }

    /// One round-trip to the completion endpoint. `None` covers every
    /// degradation case; callers substitute their fallback.
    async fn generate_text(&self, prompt: &str) -> Option<String> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                tracing::warn!("LLM key not configured, using fallback content");
                return None;
            }
        };

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let result = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(%err, "LLM request failed, using fallback content");
                return None;
            }
        };

        match response.json::<ChatResponse>().await {
            Ok(body) => body
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content.trim().to_string()),
            Err(err) => {
                tracing::warn!(%err, "LLM response unreadable, using fallback content");
                None
            }
        }
    }

    /// Generates and parses a JSON answer; `None` on any failure.
    async fn generate_json<T: serde::de::DeserializeOwned>(&self, prompt: &str) -> Option<T> {
        let text = self.generate_text(prompt).await?;
        // Models occasionally wrap the payload in a code fence.
        let trimmed = text
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        match serde_json::from_str(trimmed) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!(%err, "LLM returned unparseable JSON, using fallback content");
                None
            }
        }
    }

    pub async fn daily_question(&self) -> String {
        let prompt = "Write one thoughtful, open-ended question a long-distance couple \
                      could both answer today to feel closer. Reply with the question only.";
        self.generate_text(prompt)
            .await
            .unwrap_or_else(|| DEFAULT_QUESTION.to_string())
    }

    pub async fn date_ideas(&self, interests: &str) -> Vec<String> {
        let prompt = format!(
            "Suggest three creative virtual date ideas for a long-distance couple who \
             enjoy: {interests}. Reply with a JSON array of three strings."
        );
        self.generate_json::<Vec<String>>(&prompt)
            .await
            .filter(|ideas| !ideas.is_empty())
            .unwrap_or_else(|| DEFAULT_DATE_IDEAS.iter().map(|s| s.to_string()).collect())
    }

    /// Structured metadata for a shared link. The fallback carries the bare
    /// URL as the title so the discovery can still be saved.
    pub async fn url_metadata(&self, url: &str) -> UrlMetadata {
        let prompt = format!(
            "Given the URL {url}, reply with a JSON object with keys \"title\" (string), \
             \"description\" (string or null), \"image_url\" (string or null) and \"kind\" \
             (one of \"article\", \"song\", \"video\", \"place\", \"other\") describing \
             what the link most likely points at. JSON only."
        );
        self.generate_json::<UrlMetadata>(&prompt)
            .await
            .unwrap_or_else(|| UrlMetadata {
                title: url.to_string(),
                description: None,
                image_url: None,
                kind: "other".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> LlmClient {
        LlmClient::new("http://127.0.0.1:1", None, "test")
    }

    #[tokio::test]
    async fn missing_key_falls_back_to_default_question() {
        let question = unconfigured().daily_question().await;
        assert_eq!(question, DEFAULT_QUESTION);
    }

    #[tokio::test]
    async fn missing_key_falls_back_to_canned_date_ideas() {
        let ideas = unconfigured().date_ideas("board games").await;
        assert_eq!(ideas.len(), 3);
        assert_eq!(ideas[0], DEFAULT_DATE_IDEAS[0]);
    }

    #[tokio::test]
    async fn metadata_fallback_keeps_the_url_as_title() {
        let meta = unconfigured().url_metadata("https://example.com/a").await;
        assert_eq!(meta.title, "https://example.com/a");
        assert_eq!(meta.kind, "other");
    }

    #[tokio::test]
    async fn unreachable_endpoint_still_falls_back() {
        let client = LlmClient::new("http://127.0.0.1:1", Some("key".into()), "test");
        let question = client.daily_question().await;
        assert_eq!(question, DEFAULT_QUESTION);
    }
}
