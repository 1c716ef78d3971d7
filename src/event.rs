use std::error::Error;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::level::Level;
use crate::template::MessageTemplate;
use crate::trace::{SpanId, TraceId};
use crate::value::PropertyValue;

/// A structured log event, ready to be formatted.
///
/// Property names are unique and keep insertion order; formatted output
/// follows that order.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message_template: MessageTemplate,
    /// Full text of an attached exception or error, including its causes.
    pub exception: Option<String>,
    pub trace_id: Option<TraceId>,
    pub span_id: Option<SpanId>,
    properties: IndexMap<String, PropertyValue>,
}

/// Error returned when building a [`LogEvent`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("property names must not be empty")]
    EmptyPropertyName,
}

impl LogEvent {
    pub fn new(timestamp: DateTime<Utc>, level: Level, message_template: MessageTemplate) -> Self {
        LogEvent {
            timestamp,
            level,
            message_template,
            exception: None,
            trace_id: None,
            span_id: None,
            properties: IndexMap::new(),
        }
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyValue> {
        &self.properties
    }

    /// Add or replace a property; a replaced property keeps its position.
    ///
    /// **Returns**
    /// - `Ok(Some(old))` if a property with this name was replaced.
    /// - `Err(EventError::EmptyPropertyName)` if `name` is empty.
    pub fn add_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<Option<PropertyValue>, EventError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EventError::EmptyPropertyName);
        }
        Ok(self.properties.insert(name, value.into()))
    }

    /// Builder form of [`LogEvent::add_property`]; empty names are ignored.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        let _ = self.add_property(name, value);
        self
    }

    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Attach `error` as the exception, followed by its `source()` chain.
    pub fn with_error(self, error: &(dyn Error + 'static)) -> Self {
        self.with_exception(error_chain(error))
    }

    pub fn with_trace(mut self, trace_id: TraceId, span_id: SpanId) -> Self {
        self.trace_id = Some(trace_id);
        self.span_id = Some(span_id);
        self
    }
}

pub(crate) fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(text, "\nCaused by: {}", cause);
        source = cause.source();
    }
    text
}
