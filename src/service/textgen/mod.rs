//! Text-generation collaborator
//!
//! Produces human-readable explanations and recommendations for a
//! comparison result. Output is display-only: percentages never depend on
//! it, and every failure falls back to fixed text.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::service::config::TextGenerationConfig;
use crate::service::types::{health_check::HealthCheckResult, ServiceError};

pub mod gemini;
pub mod http_client;

pub use gemini::GeminiClient;

/// Shown when the explanation could not be generated
pub const FALLBACK_EXPLANATION: &str = "Unable to generate AI explanation at this time.";

/// Shown when recommendations could not be generated
pub const FALLBACK_RECOMMENDATIONS: &str = "<ol>\n  <li>Schedule a consultation with a genetic counselor</li>\n  <li>Consider additional genetic testing</li>\n  <li>Monitor for related symptoms and conditions</li>\n  <li>Maintain regular follow-ups with your healthcare provider</li>\n</ol>";

/// Chat reply when no generator is available
pub const FALLBACK_CHAT_RESPONSE: &str = "I'm a PCOS assistant. How can I help you today?";

/// Generative text service
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate raw (markdown-like) text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;

    /// Check whether the generator can currently serve requests
    async fn health_check(&self) -> HealthCheckResult;

    /// Generator name for logs and health output
    fn name(&self) -> &'static str;

    /// False for the no-op generator
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Generator used when text generation is switched off
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledTextGenerator;

#[async_trait::async_trait]
impl TextGenerator for DisabledTextGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ServiceError> {
        Err(ServiceError::TextGenerationFailed(
            "Text generation is disabled".to_string(),
        ))
    }

    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::Healthy
    }

    fn name(&self) -> &'static str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Build the configured generator
pub fn build_text_generator(
    config: &TextGenerationConfig,
) -> Result<Arc<dyn TextGenerator>, ServiceError> {
    if !config.enabled {
        tracing::info!("Text generation disabled; explanations use fixed fallback text");
        return Ok(Arc::new(DisabledTextGenerator));
    }
    let client = GeminiClient::new(config)?;
    tracing::info!("Text generation enabled via {}", client.endpoint());
    Ok(Arc::new(client))
}

/// Render a `[0, 1]` similarity as the percentage used in prompts
fn percent(similarity: f64) -> String {
    format!("{}%", similarity * 100.0)
}

/// Prompt asking for a short patient-facing explanation
///
/// Only the first two sequences are included.
pub fn explanation_prompt(similarity: f64, sequences: &[String]) -> String {
    let sequence = |i: usize| sequences.get(i).map_or("(not provided)", String::as_str);
    format!(
        "You are a medical professional explaining genetic test results to a patient.\n\
         Given these results:\n\
         - Similarity Score: {}\n\
         - Sequence 1: {}\n\
         - Sequence 2: {}\n\n\
         Please provide a brief explanation (2-3 sentences) in second person formal speech \
         about what this genetic similarity means for your PCOS phenotype.\n\
         Focus on the key implications for your health.",
        percent(similarity),
        sequence(0),
        sequence(1)
    )
}

/// Prompt asking for care recommendations based on an explanation
pub fn recommendation_prompt(similarity: f64, explanation: &str) -> String {
    format!(
        "Based on this PCOS phenotype analysis:\n\
         - Similarity Score: {}\n\
         - Analysis: {}\n\n\
         Please provide 3-4 specific recommendations for your care, using second person formal speech.\n\
         Format as a numbered list, keeping each recommendation brief and actionable.",
        percent(similarity),
        explanation
    )
}

/// Prompt for a free-form chat message
pub fn chat_prompt(message: &str) -> String {
    format!(
        "You are a PCOS assistant. Answer the following question briefly and in plain \
         language, and suggest consulting a healthcare provider for medical decisions.\n\n\
         Question: {}",
        message
    )
}

static H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*)$").unwrap());
static H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*)$").unwrap());
static H3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*\d+\.\s+(.*)$").unwrap());
static DASHED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[-*]\s+(.*)$").unwrap());

/// Convert the markdown subset produced by the generator to HTML fragments
///
/// Headers (`#`, `##`, `###`), `**bold**`, `*italic*`, numbered and dashed
/// list items, and newlines (`<br>`). Rules are applied in that order.
///
/// ```
/// use phenomatch::service::textgen::format_markdown;
///
/// assert_eq!(format_markdown("## Result"), "<h2>Result</h2>");
/// assert_eq!(format_markdown("**high** match"), "<strong>high</strong> match");
/// assert_eq!(format_markdown("1. Rest\n2. Eat"), "<li>Rest</li><br><li>Eat</li>");
/// ```
pub fn format_markdown(text: &str) -> String {
    let text = H1.replace_all(text, "<h1>$1</h1>");
    let text = H2.replace_all(&text, "<h2>$1</h2>");
    let text = H3.replace_all(&text, "<h3>$1</h3>");
    let text = BOLD.replace_all(&text, "<strong>$1</strong>");
    let text = ITALIC.replace_all(&text, "<em>$1</em>");
    let text = NUMBERED_ITEM.replace_all(&text, "<li>$1</li>");
    let text = DASHED_ITEM.replace_all(&text, "<li>$1</li>");
    text.replace('\n', "<br>")
}

/// Explanation and recommendations for one result
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub explanation: String,
    pub recommendations: String,
    /// False if either part fell back to fixed text
    pub generated: bool,
}

/// Generate an explanation and recommendations, falling back on failure
///
/// The recommendation prompt is built from the explanation text, fallback
/// or not.
pub async fn explain(
    generator: &dyn TextGenerator,
    similarity: f64,
    sequences: &[String],
) -> Explanation {
    let (explanation, explanation_generated) = match generator
        .generate(&explanation_prompt(similarity, sequences))
        .await
    {
        Ok(text) => (format_markdown(&text), true),
        Err(e) => {
            if generator.is_enabled() {
                tracing::warn!("Error generating explanation: {}", e);
            }
            (FALLBACK_EXPLANATION.to_string(), false)
        }
    };

    let (recommendations, recommendations_generated) = match generator
        .generate(&recommendation_prompt(similarity, &explanation))
        .await
    {
        Ok(text) => (format_markdown(&text), true),
        Err(e) => {
            if generator.is_enabled() {
                tracing::warn!("Error generating recommendations: {}", e);
            }
            (FALLBACK_RECOMMENDATIONS.to_string(), false)
        }
    };

    Explanation {
        explanation,
        recommendations,
        generated: explanation_generated && recommendations_generated,
    }
}
