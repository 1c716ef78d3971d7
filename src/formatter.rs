//! Compact newline-delimited JSON ("CLEF") event formatters.
//!
//! Reserved top-level fields start with `@`; a property whose name starts
//! with `@` is written with the `@` doubled so it cannot collide with them.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;

use crate::config::FormatterOptions;
use crate::event::LogEvent;
use crate::json;
use crate::naming::DottedNameConvention;
use crate::provider::FormatProvider;
use crate::render::render_token;
use crate::trace::SpanKind;
use crate::value::{PropertyValue, Scalar};
use crate::value_formatter::JsonValueFormatter;

/// Property carrying the start time of the span an event belongs to.
pub const SPAN_START_TIMESTAMP_PROPERTY: &str = "SpanStartTimestamp";
/// Property carrying the parent span id.
pub const PARENT_SPAN_ID_PROPERTY: &str = "ParentSpanId";
/// Property carrying the span kind.
pub const SPAN_KIND_PROPERTY: &str = "SpanKind";

const SPAN_PROPERTIES: [&str; 3] = [
    SPAN_START_TIMESTAMP_PROPERTY,
    PARENT_SPAN_ID_PROPERTY,
    SPAN_KIND_PROPERTY,
];

/// Writes [`LogEvent`]s to a byte sink.
///
/// Implementations keep no per-call state and may be shared between
/// threads formatting independent events.
pub trait EventFormatter: Send + Sync {
    /// Write `event` as a single JSON object without a line terminator.
    ///
    /// Errors from `output` are returned unchanged; whatever was already
    /// written stays written.
    fn format_event(&self, event: &LogEvent, output: &mut dyn Write) -> io::Result<()>;

    /// Write `event` followed by `\n`, so that repeated calls on one sink
    /// produce an NDJSON stream. The sink is neither flushed nor closed.
    fn format(&self, event: &LogEvent, output: &mut dyn Write) -> io::Result<()> {
        self.format_event(event, output)?;
        output.write_all(b"\n")
    }
}

/// State shared by both formatter layouts.
#[derive(Debug)]
struct Settings {
    format_provider: Arc<dyn FormatProvider>,
    value_formatter: JsonValueFormatter,
    dotted_names: Box<dyn DottedNameConvention>,
}

impl Settings {
    fn new(options: FormatterOptions) -> Self {
        let dotted_names = options.dotted_name_convention();
        Settings {
            format_provider: options.format_provider,
            value_formatter: options.value_formatter,
            dotted_names,
        }
    }

    /// Everything after the message fields: `@l` through the properties
    /// and the closing brace.
    fn write_tail(&self, event: &LogEvent, out: &mut dyn Write) -> io::Result<()> {
        if !event.level.is_default() {
            out.write_all(b",\"@l\":")?;
            json::write_str(out, event.level.as_str())?;
        }

        if let Some(exception) = &event.exception {
            out.write_all(b",\"@x\":")?;
            json::write_str(out, exception)?;
        }

        if let Some(trace_id) = &event.trace_id {
            write!(out, ",\"@tr\":\"{}\"", trace_id)?;
        }

        if let Some(span_id) = &event.span_id {
            write!(out, ",\"@sp\":\"{}\"", span_id)?;
        }

        let skip_span_properties = self.write_span_metadata(event, out)?;

        for (name, value) in self.dotted_names.process(event.properties()) {
            if skip_span_properties && SPAN_PROPERTIES.iter().any(|p| *p == name) {
                continue;
            }

            out.write_all(b",")?;
            if name.starts_with('@') {
                // doubled once; "@@x" becomes "@@@x"
                json::write_str(out, &format!("@{}", name))?;
            } else {
                json::write_str(out, &name)?;
            }
            out.write_all(b":")?;
            self.value_formatter.format(&value, out)?;
        }

        out.write_all(b"}")
    }

    /// `@st`, `@ps` and `@sk`; returns whether `@st` was written, in which
    /// case the three span properties are left out of the property list.
    fn write_span_metadata(&self, event: &LogEvent, out: &mut dyn Write) -> io::Result<bool> {
        if event.trace_id.is_none() || event.span_id.is_none() {
            return Ok(false);
        }

        let properties = event.properties();
        let Some(Scalar::Timestamp(start)) = scalar(properties, SPAN_START_TIMESTAMP_PROPERTY) else {
            return Ok(false);
        };

        out.write_all(b",\"@st\":")?;
        json::write_timestamp(out, &start.with_timezone(&Utc))?;

        if let Some(Scalar::SpanId(parent)) = scalar(properties, PARENT_SPAN_ID_PROPERTY) {
            write!(out, ",\"@ps\":\"{}\"", parent)?;
        }

        if let Some(Scalar::SpanKind(kind)) = scalar(properties, SPAN_KIND_PROPERTY) {
            if *kind != SpanKind::Internal {
                out.write_all(b",\"@sk\":")?;
                json::write_str(out, kind.as_str())?;
            }
        }

        Ok(true)
    }
}

fn scalar<'a>(properties: &'a IndexMap<String, PropertyValue>, name: &str) -> Option<&'a Scalar> {
    properties.get(name).and_then(PropertyValue::as_scalar)
}

/// Compact layout carrying the message template rather than the rendered
/// message.
///
/// Fields are written in a fixed order, each optional one only when it
/// applies:
///
/// ```text
/// @t, @mt, [@r], [@l], [@x], [@tr], [@sp], [@st], [@ps], [@sk], properties...
/// ```
///
/// `@r` lists the rendered text of every template hole that has a format
/// string, in template order.
#[derive(Debug)]
pub struct CompactJsonFormatter {
    settings: Settings,
}

impl Default for CompactJsonFormatter {
    fn default() -> Self {
        Self::new(FormatterOptions::default())
    }
}

impl CompactJsonFormatter {
    pub fn new(options: FormatterOptions) -> Self {
        CompactJsonFormatter {
            settings: Settings::new(options),
        }
    }

    fn write_renderings(&self, event: &LogEvent, out: &mut dyn Write) -> io::Result<()> {
        let mut tokens = event
            .message_template
            .property_tokens()
            .filter(|token| token.format.is_some())
            .peekable();
        if tokens.peek().is_none() {
            return Ok(());
        }

        out.write_all(b",\"@r\":[")?;
        let mut rendered = String::new();
        for (i, token) in tokens.enumerate() {
            if i > 0 {
                out.write_all(b",")?;
            }
            rendered.clear();
            render_token(
                token,
                event.properties(),
                &*self.settings.format_provider,
                &mut rendered,
            );
            json::write_str(out, &rendered)?;
        }
        out.write_all(b"]")
    }
}

impl EventFormatter for CompactJsonFormatter {
    fn format_event(&self, event: &LogEvent, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"{\"@t\":")?;
        json::write_timestamp(out, &event.timestamp)?;
        out.write_all(b",\"@mt\":")?;
        json::write_str(out, event.message_template.text())?;
        self.write_renderings(event, out)?;
        self.settings.write_tail(event, out)
    }
}

/// Compact layout carrying the rendered message (`@m`) and an event type
/// (`@i`) derived from the template, instead of `@mt` and `@r`.
#[derive(Debug)]
pub struct RenderedCompactJsonFormatter {
    settings: Settings,
}

impl Default for RenderedCompactJsonFormatter {
    fn default() -> Self {
        Self::new(FormatterOptions::default())
    }
}

impl RenderedCompactJsonFormatter {
    pub fn new(options: FormatterOptions) -> Self {
        RenderedCompactJsonFormatter {
            settings: Settings::new(options),
        }
    }
}

impl EventFormatter for RenderedCompactJsonFormatter {
    fn format_event(&self, event: &LogEvent, out: &mut dyn Write) -> io::Result<()> {
        let message = event
            .message_template
            .render(event.properties(), &*self.settings.format_provider);

        out.write_all(b"{\"@t\":")?;
        json::write_timestamp(out, &event.timestamp)?;
        out.write_all(b",\"@m\":")?;
        json::write_str(out, &message)?;
        write!(out, ",\"@i\":\"{:08x}\"", event_type(event.message_template.text()))?;
        self.settings.write_tail(event, out)
    }
}

/// Jenkins one-at-a-time hash over the template's UTF-16 code units.
pub fn event_type(template: &str) -> u32 {
    let mut hash: u32 = 0;
    for unit in template.encode_utf16() {
        hash = hash.wrapping_add(u32::from(unit));
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use crate::level::Level;
    use crate::template::MessageTemplate;

    fn event(template: &str) -> LogEvent {
        let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        LogEvent::new(ts, Level::Information, MessageTemplate::parse(template))
    }

    fn compact(event: &LogEvent) -> String {
        let mut buf = Vec::new();
        CompactJsonFormatter::default().format_event(event, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn minimal_event() {
        assert_eq!(
            compact(&event("Hello")),
            r#"{"@t":"2024-05-06T07:08:09.000000000Z","@mt":"Hello"}"#
        );
    }

    #[test]
    fn renderings_only_for_formatted_holes() {
        let event = event("{A:0.0} and {B} and {C:l}")
            .with_property("A", 1.26)
            .with_property("B", 2)
            .with_property("C", "x");
        assert_eq!(
            compact(&event),
            r#"{"@t":"2024-05-06T07:08:09.000000000Z","@mt":"{A:0.0} and {B} and {C:l}","@r":["1.3","x"],"A":1.26,"B":2,"C":"x"}"#
        );
    }

    #[test]
    fn rendering_missing_property_uses_raw_hole() {
        let output = compact(&event("{Gone:F2}"));
        assert!(output.contains(r#""@r":["{Gone:F2}"]"#), "{}", output);
    }

    #[test]
    fn at_prefixed_names_are_doubled_once() {
        let event = event("x")
            .with_property("@foo", 1)
            .with_property("@@bar", 2)
            .with_property("mid@", 3);
        assert_eq!(
            compact(&event),
            r#"{"@t":"2024-05-06T07:08:09.000000000Z","@mt":"x","@@foo":1,"@@@bar":2,"mid@":3}"#
        );
    }

    #[test]
    fn event_type_matches_reference_hash() {
        assert_eq!(event_type(""), 0);
        assert_eq!(event_type("a"), 0xca2e9442);
        assert_eq!(format!("{:08x}", event_type("Hello, {Name}!")), "3872171f");
    }

    #[test]
    fn rendered_layout() {
        let event = event("Hello, {Name}!").with_property("Name", "World");
        let mut buf = Vec::new();
        RenderedCompactJsonFormatter::default()
            .format(&event, &mut buf)
            .unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"@t\":\"2024-05-06T07:08:09.000000000Z\",\"@m\":\"Hello, \\\"World\\\"!\",\"@i\":\"3872171f\",\"Name\":\"World\"}\n"
        );
    }
}
