//! Telegram Bot API notifier.
//!
//! Delivers a batch via the Telegram Bot API `sendMessage` endpoint: one
//! header message with the batch size, then the postings in numbered chunks
//! so no single message grows past Telegram's length limit.

use std::sync::Arc;

use jobwatch_core::JobRecord;

use crate::templating::{BatchContext, TemplateRenderer, LIST_TEMPLATE};
use crate::traits::{DeliveryError, Notifier};
use crate::webhook::resolve_env_vars;

const TELEGRAM_API: &str = "https://api.telegram.org/bot";

/// Postings per chunk message.
pub const CHUNK_SIZE: usize = 10;

/// Escapes special characters for Telegram MarkdownV2 parse mode.
///
/// Telegram requires these characters to be escaped with a preceding backslash
/// when using MarkdownV2: `_`, `*`, `[`, `]`, `(`, `)`, `~`, `` ` ``, `>`,
/// `#`, `+`, `-`, `=`, `|`, `{`, `}`, `.`, `!`
pub fn escape_markdown_v2(text: &str) -> String {
    let special = ['_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!'];
    let mut result = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        if special.contains(&ch) {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

/// Sends batches via the Telegram Bot API.
#[derive(Debug)]
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    parse_mode: Option<String>,
    renderer: Arc<TemplateRenderer>,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Creates a new `TelegramNotifier` from configuration values.
    ///
    /// `${VAR}` references in `bot_token` are resolved from the environment.
    /// Returns [`DeliveryError::Config`] if the token is empty, the chat id is
    /// missing, or a referenced env var is unset.
    pub fn from_config(
        bot_token: String,
        chat_id: Option<String>,
        parse_mode: Option<String>,
        renderer: Arc<TemplateRenderer>,
    ) -> Result<Self, DeliveryError> {
        let resolved_token = resolve_env_vars(&bot_token)?;

        if resolved_token.is_empty() {
            return Err(DeliveryError::Config(
                "Telegram bot token must not be empty".to_string(),
            ));
        }

        let chat_id = chat_id.filter(|c| !c.is_empty()).ok_or_else(|| {
            DeliveryError::Config("Telegram chat id must be set".to_string())
        })?;

        Ok(Self {
            bot_token: resolved_token,
            chat_id,
            parse_mode,
            renderer,
            client: reqwest::Client::new(),
        })
    }

    /// Build the messages for a batch without sending them.
    pub fn format_messages(&self, batch: &[JobRecord]) -> Result<Vec<String>, DeliveryError> {
        if batch.is_empty() {
            return Ok(vec![self.prepare("No new jobs")]);
        }

        let mut messages = Vec::with_capacity(1 + batch.len().div_ceil(CHUNK_SIZE));
        messages.push(self.prepare(&format!("Found {} new jobs", batch.len())));

        for (n, chunk) in batch.chunks(CHUNK_SIZE).enumerate() {
            let ctx = BatchContext::chunk(chunk, n * CHUNK_SIZE, batch.len());
            let text = self.renderer.render(LIST_TEMPLATE, &ctx)?;
            messages.push(self.prepare(text.trim_end()));
        }

        Ok(messages)
    }

    fn prepare(&self, text: &str) -> String {
        match self.parse_mode.as_deref() {
            Some("MarkdownV2") => escape_markdown_v2(text),
            _ => text.to_string(),
        }
    }

    async fn send_message(&self, text: &str) -> Result<(), DeliveryError> {
        let url = format!("{}{}/sendMessage", TELEGRAM_API, self.bot_token);

        let mut body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        if let Some(ref mode) = self.parse_mode {
            body["parse_mode"] = serde_json::Value::String(mode.clone());
        }

        tracing::debug!(
            chat_id = %self.chat_id,
            parse_mode = ?self.parse_mode,
            "Sending Telegram message"
        );

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        let resp_body: serde_json::Value = response.json().await?;

        if resp_body.get("ok") == Some(&serde_json::Value::Bool(true)) {
            return Ok(());
        }

        // Handle rate limiting (HTTP 429).
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp_body
                .get("parameters")
                .and_then(|p| p.get("retry_after"))
                .and_then(|v| v.as_u64())
                .unwrap_or(30);
            return Err(DeliveryError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let description = resp_body
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Telegram API error");

        Err(DeliveryError::Api(format!(
            "Telegram API error ({status}): {description}"
        )))
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, batch: &[JobRecord]) -> Result<(), DeliveryError> {
        let messages = self.format_messages(batch)?;
        for text in &messages {
            self.send_message(text).await?;
        }
        tracing::info!(
            chat_id = %self.chat_id,
            messages = messages.len(),
            "Telegram notification sent"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(parse_mode: Option<&str>) -> TelegramNotifier {
        TelegramNotifier::from_config(
            "123456:ABC-DEF".to_string(),
            Some("-100123".to_string()),
            parse_mode.map(str::to_string),
            Arc::new(TemplateRenderer::new()),
        )
        .unwrap()
    }

    fn jobs(n: usize) -> Vec<JobRecord> {
        (1..=n)
            .map(|i| JobRecord::new(format!("https://jobs/{i}"), format!("Job {i}"), ""))
            .collect()
    }

    #[test]
    fn test_escape_markdown_v2_special_chars() {
        let input = "Hello_World *bold* [link](url) ~strike~ `code` >quote #tag +plus -minus =eq |pipe {brace} .dot !bang";
        let escaped = escape_markdown_v2(input);
        assert_eq!(
            escaped,
            r"Hello\_World \*bold\* \[link\]\(url\) \~strike\~ \`code\` \>quote \#tag \+plus \-minus \=eq \|pipe \{brace\} \.dot \!bang"
        );
    }

    #[test]
    fn test_escape_markdown_v2_no_special_chars() {
        let input = "Hello World 123";
        assert_eq!(escape_markdown_v2(input), input);
    }

    #[test]
    fn empty_batch_sends_single_notice() {
        let messages = notifier(None).format_messages(&[]).unwrap();
        assert_eq!(messages, vec!["No new jobs".to_string()]);
    }

    #[test]
    fn batch_is_split_into_chunks_after_header() {
        let messages = notifier(None).format_messages(&jobs(23)).unwrap();
        // header + ceil(23 / 10) chunks
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], "Found 23 new jobs");
        assert!(messages[1].starts_with("1. Job 1\nhttps://jobs/1"));
        assert!(messages[1].ends_with("10. Job 10\nhttps://jobs/10"));
        assert!(messages[2].starts_with("11. Job 11\n"));
        assert!(messages[3].starts_with("21. Job 21\n"));
        assert!(messages[3].ends_with("23. Job 23\nhttps://jobs/23"));
    }

    #[test]
    fn markdown_mode_escapes_messages() {
        let messages = notifier(Some("MarkdownV2")).format_messages(&jobs(1)).unwrap();
        assert!(messages[1].starts_with(r"1\. Job 1"));
    }

    #[test]
    fn test_env_var_resolution() {
        std::env::set_var("TEST_TG_BOT_TOKEN", "123:ABC");
        let notifier = TelegramNotifier::from_config(
            "${TEST_TG_BOT_TOKEN}".to_string(),
            Some("12345".to_string()),
            None,
            Arc::new(TemplateRenderer::new()),
        )
        .expect("should resolve env var");
        assert_eq!(notifier.bot_token, "123:ABC");
        assert_eq!(notifier.chat_id, "12345");
        std::env::remove_var("TEST_TG_BOT_TOKEN");
    }

    #[test]
    fn test_env_var_missing() {
        let result = TelegramNotifier::from_config(
            "${NONEXISTENT_VAR_TELEGRAM_XYZ}".to_string(),
            Some("12345".to_string()),
            None,
            Arc::new(TemplateRenderer::new()),
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("NONEXISTENT_VAR_TELEGRAM_XYZ"));
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = TelegramNotifier::from_config(
            String::new(),
            Some("12345".to_string()),
            None,
            Arc::new(TemplateRenderer::new()),
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("must not be empty"));
    }

    #[test]
    fn test_missing_chat_id_rejected() {
        let result = TelegramNotifier::from_config(
            "123:ABC".to_string(),
            None,
            None,
            Arc::new(TemplateRenderer::new()),
        );
        assert!(result.unwrap_err().to_string().contains("chat id"));
    }

    #[test]
    fn test_channel_name() {
        assert_eq!(notifier(Some("HTML")).channel_name(), "telegram");
    }
}
