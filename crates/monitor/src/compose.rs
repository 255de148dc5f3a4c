//! Assembles sources, channels, and the store from [`Config`].

use std::sync::Arc;

use tracing::{info, warn};

use jobwatch_core::Config;
use jobwatch_notify::{
    ConsoleNotifier, DeliveryError, Notifier, TelegramNotifier, TemplateRenderer, WebhookNotifier,
};
use jobwatch_sources::{GoogleSearchSource, JobSource, SourceError, ValidatingSource};
use jobwatch_storage::{FileLinkStore, LinkStore, MemoryLinkStore};

use crate::orchestrator::MonitorOrchestrator;
use crate::schedule::ScheduleSettings;

/// Build every configured source.
///
/// A source whose credentials are absent is skipped with a warning; one
/// that is configured but invalid is an error.
pub fn build_sources(config: &Config) -> Result<Vec<Box<dyn JobSource>>, SourceError> {
    let mut sources: Vec<Box<dyn JobSource>> = Vec::new();

    if config.search.is_configured() {
        let google = GoogleSearchSource::from_config(&config.search, &config.filter)?;
        info!(query = google.query(), "google search source enabled");
        if config.search.validate_descriptions {
            sources.push(Box::new(ValidatingSource::new(google, config.filter.clone())));
        } else {
            sources.push(Box::new(google));
        }
    } else {
        warn!("API_KEY or CX not set, google search source disabled");
    }

    Ok(sources)
}

/// Build every configured notification channel. Console is always present.
pub fn build_notifiers(config: &Config) -> Result<Vec<Box<dyn Notifier>>, DeliveryError> {
    let renderer = Arc::new(TemplateRenderer::new());
    let mut channels: Vec<Box<dyn Notifier>> = vec![Box::new(ConsoleNotifier::new(
        config.console.snippet_max_length as usize,
        renderer.clone(),
    ))];

    if let Some(token) = &config.telegram.bot_token {
        channels.push(Box::new(TelegramNotifier::from_config(
            token.clone(),
            config.telegram.chat_id.clone(),
            config.telegram.parse_mode.clone(),
            renderer.clone(),
        )?));
    }

    if let Some(url) = &config.webhook.url {
        channels.push(Box::new(WebhookNotifier::from_config(
            url.clone(),
            config.webhook.method.clone(),
            Some(config.webhook.headers.clone()),
            config.webhook.body_template.clone(),
            renderer,
        )?));
    }

    Ok(channels)
}

/// Open the link store: the configured file, or memory when `ephemeral`.
pub fn open_store(config: &Config, ephemeral: bool) -> Arc<dyn LinkStore> {
    if ephemeral {
        Arc::new(MemoryLinkStore::new())
    } else {
        Arc::new(FileLinkStore::new(config.store.jobs_file.clone()))
    }
}

/// Build a ready-to-start monitor from configuration.
pub async fn build_monitor(
    config: &Config,
    store: Arc<dyn LinkStore>,
) -> anyhow::Result<MonitorOrchestrator> {
    let sources = build_sources(config)?;
    let notifiers = build_notifiers(config)?;
    if sources.is_empty() {
        warn!("no job sources configured, rounds will find nothing");
    }

    Ok(MonitorOrchestrator::builder(ScheduleSettings::from(&config.monitor))
        .criteria(config.filter.clone())
        .sources(sources)
        .notifiers(notifiers)
        .build(store)
        .await)
}
