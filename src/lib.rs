//! Compact newline-delimited JSON formatting for structured log events.
//!
//! A [`LogEvent`] is written as one JSON object per line: reserved fields
//! (`@t`, `@mt`, `@l`, ...) first, then the event's properties.
//!
//! ```
//! use chrono::Utc;
//! use clef_format::{CompactJsonFormatter, EventFormatter, Level, LogEvent, MessageTemplate};
//!
//! let event = LogEvent::new(Utc::now(), Level::Warning, MessageTemplate::parse("Disk {Used:P0} full"))
//!     .with_property("Used", 0.93);
//!
//! let mut out = Vec::new();
//! CompactJsonFormatter::default().format(&event, &mut out).unwrap();
//! assert!(out.ends_with(b"\n"));
//! ```

pub mod config;
pub mod env;
pub mod event;
pub mod formatter;
pub mod json;
pub mod layer;
pub mod level;
pub mod naming;
pub mod provider;
pub mod render;
pub mod template;
pub mod trace;
pub mod value;
pub mod value_formatter;

pub use config::{ConfigError, FormatterOptions};
pub use event::{EventError, LogEvent};
pub use formatter::{CompactJsonFormatter, EventFormatter, RenderedCompactJsonFormatter};
pub use layer::ClefLayer;
pub use level::Level;
pub use naming::{DottedNameConvention, PreserveDottedNames, UnflattenDottedNames};
pub use provider::{FormatProvider, InvariantFormat};
pub use template::MessageTemplate;
pub use trace::{SpanId, SpanKind, TraceId};
pub use value::{PropertyValue, Scalar, Structure};
pub use value_formatter::JsonValueFormatter;
