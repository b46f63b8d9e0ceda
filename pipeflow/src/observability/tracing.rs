//! Span reporting for pipeline invocations.
//!
//! Pipelines report each stage through a [`TracingEmitter`]. The default
//! emitter discards everything; [`LoggingTracingEmitter`] forwards to the
//! `tracing` ecosystem.

use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Instant;

/// Span attributes for a whole pipeline call.
#[derive(Debug, Clone, Default)]
pub struct PipelineSpanAttributes {
    /// Pipeline name.
    pub pipeline_name: Option<String>,
    /// Per-call run ID.
    pub run_id: Option<String>,
    /// Number of stages.
    pub stage_count: Option<usize>,
    /// Number of input arguments.
    pub input_count: Option<usize>,
}

impl PipelineSpanAttributes {
    /// Creates new pipeline span attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = Some(name.into());
        self
    }

    /// Sets the run ID.
    #[must_use]
    pub fn with_run_id(mut self, id: impl Into<String>) -> Self {
        self.run_id = Some(id.into());
        self
    }

    /// Sets the stage count.
    #[must_use]
    pub fn with_stage_count(mut self, count: usize) -> Self {
        self.stage_count = Some(count);
        self
    }

    /// Sets the input count.
    #[must_use]
    pub fn with_input_count(mut self, count: usize) -> Self {
        self.input_count = Some(count);
        self
    }

    /// Flattens into string attributes.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        if let Some(ref v) = self.pipeline_name {
            attrs.insert("pipeline.name".to_string(), v.clone());
        }
        if let Some(ref v) = self.run_id {
            attrs.insert("pipeline.run_id".to_string(), v.clone());
        }
        if let Some(v) = self.stage_count {
            attrs.insert("pipeline.stage_count".to_string(), v.to_string());
        }
        if let Some(v) = self.input_count {
            attrs.insert("pipeline.input_count".to_string(), v.to_string());
        }

        attrs
    }
}

/// Span attributes for one stage invocation.
#[derive(Debug, Clone, Default)]
pub struct StageSpanAttributes {
    /// Stage name.
    pub stage_name: String,
    /// Position in the pipeline.
    pub position: usize,
    /// Per-call run ID.
    pub run_id: Option<String>,
    /// Declared input arity.
    pub arity: Option<usize>,
    /// Number of values forwarded.
    pub forwarded: Option<usize>,
}

impl StageSpanAttributes {
    /// Creates new stage span attributes.
    #[must_use]
    pub fn new(stage_name: impl Into<String>, position: usize) -> Self {
        Self {
            stage_name: stage_name.into(),
            position,
            ..Default::default()
        }
    }

    /// Sets the run ID.
    #[must_use]
    pub fn with_run_id(mut self, id: impl Into<String>) -> Self {
        self.run_id = Some(id.into());
        self
    }

    /// Sets the declared arity.
    #[must_use]
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    /// Sets the number of forwarded values.
    #[must_use]
    pub fn with_forwarded(mut self, forwarded: usize) -> Self {
        self.forwarded = Some(forwarded);
        self
    }

    /// Flattens into string attributes.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        attrs.insert("stage.name".to_string(), self.stage_name.clone());
        attrs.insert("stage.position".to_string(), self.position.to_string());

        if let Some(ref v) = self.run_id {
            attrs.insert("pipeline.run_id".to_string(), v.clone());
        }
        if let Some(v) = self.arity {
            attrs.insert("stage.arity".to_string(), v.to_string());
        }
        if let Some(v) = self.forwarded {
            attrs.insert("stage.forwarded".to_string(), v.to_string());
        }

        attrs
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

/// Trait for types that can emit tracing events.
pub trait TracingEmitter: Send + Sync + Debug {
    /// Returns false if events would be discarded, letting callers skip building attributes.
    fn enabled(&self) -> bool {
        true
    }

    /// Emits a span start event.
    fn span_start(&self, name: &str, attributes: &HashMap<String, String>);

    /// Emits a span end event.
    fn span_end(&self, name: &str, duration_ms: f64, attributes: &HashMap<String, String>);

    /// Emits an error event.
    fn span_error(&self, name: &str, error: &str, attributes: &HashMap<String, String>);
}

/// No-op tracing emitter.
#[derive(Debug, Clone, Default)]
pub struct NoOpTracingEmitter;

impl TracingEmitter for NoOpTracingEmitter {
    fn enabled(&self) -> bool {
        false
    }

    fn span_start(&self, _name: &str, _attributes: &HashMap<String, String>) {}
    fn span_end(&self, _name: &str, _duration_ms: f64, _attributes: &HashMap<String, String>) {}
    fn span_error(&self, _name: &str, _error: &str, _attributes: &HashMap<String, String>) {}
}

/// Logging-based tracing emitter.
#[derive(Debug, Clone, Default)]
pub struct LoggingTracingEmitter;

impl TracingEmitter for LoggingTracingEmitter {
    fn span_start(&self, name: &str, attributes: &HashMap<String, String>) {
        tracing::debug!(span_name = name, ?attributes, "Span started");
    }

    fn span_end(&self, name: &str, duration_ms: f64, attributes: &HashMap<String, String>) {
        tracing::debug!(span_name = name, duration_ms, ?attributes, "Span ended");
    }

    fn span_error(&self, name: &str, error: &str, attributes: &HashMap<String, String>) {
        tracing::warn!(span_name = name, error, ?attributes, "Span error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pipeline_span_attributes() {
        let attrs = PipelineSpanAttributes::new()
            .with_pipeline_name("text")
            .with_run_id("run-123")
            .with_stage_count(2);

        let attrs = attrs.to_attributes();
        assert_eq!(attrs.get("pipeline.name"), Some(&"text".to_string()));
        assert_eq!(attrs.get("pipeline.run_id"), Some(&"run-123".to_string()));
        assert_eq!(attrs.get("pipeline.stage_count"), Some(&"2".to_string()));
        assert!(!attrs.contains_key("pipeline.input_count"));
    }

    #[test]
    fn test_stage_span_attributes() {
        let attrs = StageSpanAttributes::new("trim", 1)
            .with_arity(1)
            .with_forwarded(1);

        let attrs = attrs.to_attributes();
        assert_eq!(attrs.get("stage.name"), Some(&"trim".to_string()));
        assert_eq!(attrs.get("stage.position"), Some(&"1".to_string()));
        assert_eq!(attrs.get("stage.forwarded"), Some(&"1".to_string()));
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("test_span");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "test_span");
        let duration = timer.finish();
        assert!(duration >= 10.0);
    }

    #[test]
    fn test_noop_emitter() {
        let emitter = NoOpTracingEmitter;
        assert!(!emitter.enabled());
        emitter.span_start("test", &HashMap::new());
        emitter.span_end("test", 100.0, &HashMap::new());
        emitter.span_error("test", "error", &HashMap::new());
    }

    #[test]
    fn test_logging_emitter_enabled() {
        assert!(LoggingTracingEmitter.enabled());
    }
}
