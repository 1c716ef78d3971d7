use std::error::Error;
use std::fmt;
use std::io::Write;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::event::{error_chain, LogEvent};
use crate::formatter::{CompactJsonFormatter, EventFormatter};
use crate::level::Level;
use crate::template::MessageTemplate;
use crate::trace::{SpanId, TraceId};
use crate::value::PropertyValue;

/// `tracing_subscriber` layer that turns `tracing` events into
/// [`LogEvent`]s and writes each one as a single CLEF line.
///
/// Every event is formatted into a local buffer first and handed to the
/// writer with one `write_all`, so lines from concurrent threads do not
/// interleave as long as the writer itself is line-atomic (stdout, a
/// locked file, ...).
pub struct ClefLayer<W, F = CompactJsonFormatter> {
    make_writer: W,
    formatter: F,
    min_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully written to the writer.
    pub written_events: Arc<AtomicU64>,
    /// Dropped because formatting or writing failed.
    pub failed_events: Arc<AtomicU64>,
}

impl<W> ClefLayer<W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    /// Create a layer writing compact JSON through `make_writer`,
    /// capturing every level.
    pub fn new(make_writer: W) -> Self {
        ClefLayer {
            make_writer,
            formatter: CompactJsonFormatter::default(),
            min_level: Level::Verbose,
            total_events: Arc::new(AtomicU64::new(0)),
            written_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<W, F> ClefLayer<W, F> {
    /// Swap the formatter, e.g. for a
    /// [`RenderedCompactJsonFormatter`](crate::formatter::RenderedCompactJsonFormatter).
    pub fn with_formatter<G: EventFormatter>(self, formatter: G) -> ClefLayer<W, G> {
        ClefLayer {
            make_writer: self.make_writer,
            formatter,
            min_level: self.min_level,
            total_events: self.total_events,
            written_events: self.written_events,
            failed_events: self.failed_events,
        }
    }

    /// Ignore events less severe than `level`.
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }
}

impl<S, W, F> Layer<S> for ClefLayer<W, F>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'w> MakeWriter<'w> + 'static,
    F: EventFormatter + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        let level = Level::from(meta.level());
        if level < self.min_level {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let log_event = visitor.into_event(level, meta.target());

        let mut buf = Vec::with_capacity(256);
        if let Err(e) = self.formatter.format(&log_event, &mut buf) {
            self.failed_events.fetch_add(1, Ordering::Relaxed);
            eprintln!("error formatting log event: {}", e);
            return;
        }

        let mut writer = self.make_writer.make_writer_for(meta);
        match writer.write_all(&buf) {
            Ok(()) => {
                self.written_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("error writing log event: {}", e);
            }
        }
    }
}

/// Collects the fields of one `tracing` event.
#[derive(Default)]
pub struct FieldVisitor {
    message: Option<String>,
    exception: Option<String>,
    trace_id: Option<TraceId>,
    span_id: Option<SpanId>,
    properties: Vec<(String, PropertyValue)>,
}

impl FieldVisitor {
    fn record_text(&mut self, field: &Field, text: String) {
        match field.name() {
            "message" => self.message = Some(text),
            "trace_id" if self.trace_id.is_none() => match text.parse() {
                Ok(id) => self.trace_id = Some(id),
                Err(_) => self.push(field, text),
            },
            "span_id" if self.span_id.is_none() => match text.parse() {
                Ok(id) => self.span_id = Some(id),
                Err(_) => self.push(field, text),
            },
            _ => self.push(field, text),
        }
    }

    fn push(&mut self, field: &Field, value: impl Into<PropertyValue>) {
        self.properties.push((field.name().to_string(), value.into()));
    }

    /// Build the event; the message becomes a literal template.
    pub fn into_event(self, level: Level, target: &str) -> LogEvent {
        let template = MessageTemplate::literal(self.message.as_deref().unwrap_or(""));
        let mut event = LogEvent::new(Utc::now(), level, template);
        event.exception = self.exception;
        event.trace_id = self.trace_id;
        event.span_id = self.span_id;

        for (name, value) in self.properties {
            event = event.with_property(name, value);
        }
        event.with_property("target", target)
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        let text = error_chain(value);
        if self.exception.is_none() {
            self.exception = Some(text);
        } else {
            self.push(field, text);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_text(field, format!("{:?}", value));
    }
}
