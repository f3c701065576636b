// src/llm_extract.rs

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{LlmBackend, LlmSection};
use crate::heuristics::InvoiceFields;

/// The prompt template that instructs the model to extract the invoice fields.
const SYSTEM_PROMPT: &str = r#"You are an invoice data extraction assistant.
Given raw text from an OCR'd or PDF invoice, extract the fields below and return ONLY valid JSON.

The JSON must match this schema exactly:
{
  "invoice_number": "string or null",
  "total": "string or null (currency and amount, e.g. 'USD 1,250.00')",
  "vendor": "string or null",
  "payment_period": "string or null (e.g. '01/01/2024 to 31/01/2024')",
  "payment_narration": "string or null"
}

Notes:
- The text may be noisy OCR output. Do your best to reconstruct the values.
- Use null for fields you cannot determine.
- Return ONLY the JSON object, no markdown fences, no commentary."#;

/// Don't send more than this much text to the model.
const MAX_PROMPT_BYTES: usize = 12_000;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Resolved endpoint configuration ready to make API calls.
struct ResolvedEndpoint {
    base_url: String,
    model: String,
    api_key: String,
}

/// Resolve the LLM config section into a concrete endpoint.
fn resolve_endpoint(llm: &LlmSection) -> Result<ResolvedEndpoint, Box<dyn std::error::Error>> {
    match llm.backend {
        LlmBackend::Ollama => {
            info!(
                url = %llm.ollama.base_url,
                model = %llm.ollama.model,
                "Using Ollama (local) backend"
            );
            Ok(ResolvedEndpoint {
                base_url: llm.ollama.base_url.clone(),
                model: llm.ollama.model.clone(),
                api_key: "ollama".to_string(), // required by API but ignored
            })
        }
        LlmBackend::Remote => {
            let api_key = std::env::var("LLM_API_KEY")
                .map_err(|_| "LLM_API_KEY env var required for remote backend")?;
            info!(
                url = %llm.remote.base_url,
                model = %llm.remote.model,
                "Using remote API backend"
            );
            Ok(ResolvedEndpoint {
                base_url: llm.remote.base_url.clone(),
                model: llm.remote.model.clone(),
                api_key,
            })
        }
        LlmBackend::Heuristics => {
            Err("Heuristics backend selected — LLM extraction not needed".into())
        }
    }
}

/// Check if the Ollama server is reachable.
async fn check_ollama_health(client: &Client, base_url: &str) -> bool {
    // Ollama's health endpoint is at the root (not under /v1)
    let health_url = base_url.trim_end_matches("/v1").trim_end_matches("/v1/");

    match client
        .get(health_url)
        .timeout(std::time::Duration::from_secs(3))
        .send()
        .await
    {
        Ok(resp) => {
            if resp.status().is_success() {
                info!("Ollama server is reachable");
                true
            } else {
                warn!(status = %resp.status(), "Ollama server returned non-OK status");
                false
            }
        }
        Err(e) => {
            warn!(error = %e, "Ollama server not reachable");
            false
        }
    }
}

/// Send document text to the model and parse the five-field result.
async fn extract_fields_with_llm(
    client: &Client,
    endpoint: &ResolvedEndpoint,
    document_text: &str,
) -> Result<InvoiceFields, Box<dyn std::error::Error>> {
    let text = truncate_at_char_boundary(document_text, MAX_PROMPT_BYTES);

    let request = ChatRequest {
        model: endpoint.model.clone(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: format!("Extract the invoice fields from the following text:\n\n{text}"),
            },
        ],
        temperature: 0.0,
    };

    let url = format!("{}/chat/completions", endpoint.base_url);

    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", endpoint.api_key))
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("LLM API error {status}: {body}").into());
    }

    let chat_response: ChatResponse = response.json().await?;
    let content = chat_response
        .choices
        .first()
        .map(|c| c.message.content.as_str())
        .ok_or("Empty response from LLM")?;

    // Strip markdown fences if the model added them despite instructions
    let json_str = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    // Some models prepend reasoning text. Take the outermost JSON object.
    let json_str = extract_json_object(json_str)?;

    let fields: InvoiceFields = serde_json::from_str(json_str).map_err(|e| {
        format!("Failed to parse LLM response as invoice fields: {e}\nRaw: {json_str}")
    })?;

    Ok(fields)
}

/// Extract the outermost JSON object from a string that may contain
/// surrounding text (e.g. thinking tokens).
fn extract_json_object(s: &str) -> Result<&str, Box<dyn std::error::Error>> {
    let start = s.find('{').ok_or("No '{' found in LLM response")?;
    let end = s.rfind('}').ok_or("No '}' found in LLM response")?;
    if end <= start {
        return Err("Malformed JSON in LLM response".into());
    }
    Ok(&s[start..=end])
}

/// Cut `s` to at most `max` bytes without splitting a character.
fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Run LLM extraction on one document's text.
pub async fn run_llm_extraction(
    text: &str,
    llm_config: &LlmSection,
) -> Result<InvoiceFields, Box<dyn std::error::Error>> {
    let endpoint = resolve_endpoint(llm_config)?;
    let client = Client::new();

    if llm_config.backend == LlmBackend::Ollama
        && !check_ollama_health(&client, &endpoint.base_url).await
    {
        return Err(format!(
            "Ollama is not running at {}. Start it with: ollama serve",
            endpoint.base_url
        )
        .into());
    }

    extract_fields_with_llm(&client, &endpoint, text).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_strips_chatter() {
        let raw = "Sure! Here is the result: {\"invoice_number\": \"INV-1\"} Hope that helps.";
        assert_eq!(
            extract_json_object(raw).unwrap(),
            "{\"invoice_number\": \"INV-1\"}"
        );
    }

    #[test]
    fn test_extract_json_object_rejects_plain_text() {
        assert!(extract_json_object("no json at all").is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // 'é' is two bytes; cutting at 1 must back off to 0
        assert_eq!(truncate_at_char_boundary("é", 1), "");
        assert_eq!(truncate_at_char_boundary("abc", 2), "ab");
        assert_eq!(truncate_at_char_boundary("abc", 10), "abc");
    }

    #[test]
    fn test_heuristics_backend_never_resolves() {
        let section = LlmSection::default();
        assert!(resolve_endpoint(&section).is_err());
    }
}
