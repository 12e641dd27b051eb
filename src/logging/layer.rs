use std::fmt;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{
    field::{Field, Visit},
    span::{Attributes, Id, Record},
    Event, Subscriber,
};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

use super::{
    buffer::LogBuffer,
    types::{LogEntry, LogLevel},
};

/// Mirrors events into a [`LogBuffer`], tagging each with the request
/// context (method, path, request id) of the enclosing spans.
pub struct BufferLayer {
    buffer: LogBuffer,
}

impl BufferLayer {
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }
}

#[derive(Debug, Clone, Default)]
struct RequestContext {
    method: Option<String>,
    endpoint: Option<String>,
    request_id: Option<String>,
}

impl RequestContext {
    fn is_empty(&self) -> bool {
        self.method.is_none() && self.endpoint.is_none() && self.request_id.is_none()
    }

    fn merge(&mut self, other: &RequestContext) {
        if other.method.is_some() {
            self.method.clone_from(&other.method);
        }
        if other.endpoint.is_some() {
            self.endpoint.clone_from(&other.endpoint);
        }
        if other.request_id.is_some() {
            self.request_id.clone_from(&other.request_id);
        }
    }
}

impl Visit for RequestContext {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "method" => self.method = Some(value.to_string()),
            "path" | "endpoint" => self.endpoint = Some(value.to_string()),
            "request_id" => self.request_id = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    data: Map<String, Value>,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.data
                .insert(field.name().to_string(), Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.data.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.data.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.data.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.data.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}

impl<S> Layer<S> for BufferLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut context = RequestContext::default();
        attrs.record(&mut context);
        if context.is_empty() {
            return;
        }
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(context);
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut update = RequestContext::default();
        values.record(&mut update);
        if update.is_empty() {
            return;
        }

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<RequestContext>() {
            Some(existing) => existing.merge(&update),
            None => extensions.insert(update),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut request = RequestContext::default();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(context) = span.extensions().get::<RequestContext>() {
                    request.merge(context);
                }
            }
        }

        self.buffer.push(LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::from(*event.metadata().level()),
            message: visitor.message,
            data: visitor.data,
            endpoint: request.endpoint,
            method: request.method,
            request_id: request.request_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn events_are_captured_with_fields() {
        let buffer = LogBuffer::new(10);
        let subscriber = tracing_subscriber::registry().with(BufferLayer::new(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(user_id = 42, email = "a@b.com", "Registration failed");
        });

        let entries = buffer.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[0].message, "Registration failed");
        assert_eq!(entries[0].data["user_id"], 42);
        assert_eq!(entries[0].data["email"], "a@b.com");
        assert!(entries[0].request_id.is_none());
    }

    #[test]
    fn events_inherit_request_context_from_spans() {
        let buffer = LogBuffer::new(10);
        let subscriber = tracing_subscriber::registry().with(BufferLayer::new(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!(
                "request",
                method = "DELETE",
                path = "/api/register",
                request_id = tracing::field::Empty
            );
            let _guard = span.enter();
            span.record("request_id", "req-123");

            let inner = tracing::info_span!("inner");
            let _inner_guard = inner.enter();
            tracing::info!("User deleted successfully");
        });

        let entry = &buffer.entries()[0];
        assert_eq!(entry.method.as_deref(), Some("DELETE"));
        assert_eq!(entry.endpoint.as_deref(), Some("/api/register"));
        assert_eq!(entry.request_id.as_deref(), Some("req-123"));
    }
}
