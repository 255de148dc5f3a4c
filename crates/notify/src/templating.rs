//! Minijinja template rendering for notification messages.
//!
//! Every channel formats a batch through [`TemplateRenderer`], either with
//! one of the built-in templates below or with a user-supplied one.
//!
//! Templates are arbitrary strings (not pre-registered), so a fresh
//! [`minijinja::Environment`] is created per render call.

use jobwatch_core::JobRecord;

use crate::traits::DeliveryError;

/// Numbered list of postings, one `index. title` line plus the link each.
pub const LIST_TEMPLATE: &str =
    "{% for job in jobs %}{{ job.index }}. {{ job.title }}\n{{ job.link }}\n\n{% endfor %}";

/// Console block: count header, then entries with shortened summaries.
pub const CONSOLE_TEMPLATE: &str = "Found {{ total }} new job(s):\n\n\
{% for job in jobs %}{{ job.index }}. {{ job.title }}\n\
{% if job.summary %}   {{ job.summary | shorten(snippet_max) }}\n{% endif %}\
{{ job.link }}\n\n{% endfor %}";

/// Context data available to notification templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchContext {
    /// Size of the whole batch, even when `jobs` holds only a chunk of it.
    pub total: usize,
    pub jobs: Vec<JobEntry>,
    /// Render timestamp, `YYYY-MM-DD HH:MM:SS` local time.
    pub now: String,
    /// Maximum summary length for the `shorten` filter.
    pub snippet_max: usize,
}

/// One posting as seen by templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobEntry {
    /// 1-based position within the whole batch.
    pub index: usize,
    pub link: String,
    pub title: String,
    pub summary: String,
}

impl BatchContext {
    /// Context for a whole batch, numbered from 1.
    pub fn new(jobs: &[JobRecord]) -> Self {
        Self::chunk(jobs, 0, jobs.len())
    }

    /// Context for a slice of a larger batch; `offset` is the number of
    /// postings that precede the slice.
    pub fn chunk(jobs: &[JobRecord], offset: usize, total: usize) -> Self {
        Self {
            total,
            jobs: jobs
                .iter()
                .enumerate()
                .map(|(i, job)| JobEntry {
                    index: offset + i + 1,
                    link: job.link.clone(),
                    title: job.title.clone(),
                    summary: job.summary.clone(),
                })
                .collect(),
            now: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            snippet_max: 80,
        }
    }

    pub fn with_snippet_max(mut self, snippet_max: usize) -> Self {
        self.snippet_max = snippet_max;
        self
    }
}

/// Renders notification templates using minijinja.
#[derive(Debug)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Build a configured minijinja environment with the custom filters.
    ///
    /// No globals are registered, so templates only see the batch context.
    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();

        env.add_filter("shorten", shorten_filter);
        env.add_filter("lower", lower_filter);
        env.add_filter("upper", upper_filter);

        env
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(&self, template_str: &str, ctx: &BatchContext) -> Result<String, DeliveryError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| DeliveryError::Template(e.to_string()))
    }

    /// Validate that a template string parses without errors.
    ///
    /// This does not evaluate the template, it only checks syntax.
    pub fn validate(&self, template_str: &str) -> Result<(), DeliveryError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| DeliveryError::Template(e.to_string()))?;
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Custom filter: cut a string to `max` characters, appending `...` when cut.
fn shorten_filter(value: String, max: Option<usize>) -> String {
    let max = max.unwrap_or(80);
    if value.chars().count() <= max {
        return value;
    }
    let mut cut: String = value.chars().take(max).collect();
    cut.push_str("...");
    cut
}

/// Custom filter: lowercase a string.
fn lower_filter(value: String) -> String {
    value.to_lowercase()
}

/// Custom filter: uppercase a string.
fn upper_filter(value: String) -> String {
    value.to_uppercase()
}
