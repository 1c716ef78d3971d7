use std::sync::Arc;

use crate::env::{env_opt, CLEF_PRESERVE_DOTTED_NAMES_ENV, CLEF_TYPE_TAG_ENV};
use crate::naming::{DottedNameConvention, PreserveDottedNames, UnflattenDottedNames};
use crate::provider::{FormatProvider, InvariantFormat};
use crate::value_formatter::JsonValueFormatter;

/// Construction-time settings shared by the compact formatters.
///
/// **Fields**
/// - `format_provider`: formats values for `@r` and `@m`; defaults to
///   [`InvariantFormat`].
/// - `value_formatter`: writes property values as JSON; defaults to a
///   formatter tagging structures with `$type`.
/// - `preserve_dotted_names`: if `true`, `a.b` stays a flat key; if
///   `false` (the default) it is nested as `{"a":{"b":..}}`.
#[derive(Clone, Debug)]
pub struct FormatterOptions {
    pub format_provider: Arc<dyn FormatProvider>,
    pub value_formatter: JsonValueFormatter,
    pub preserve_dotted_names: bool,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            format_provider: Arc::new(InvariantFormat),
            value_formatter: JsonValueFormatter::default(),
            preserve_dotted_names: false,
        }
    }
}

/// Error returned when options cannot be read from the environment.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a boolean, got {value:?}")]
    InvalidBool { key: String, value: String },
}

impl FormatterOptions {
    pub fn with_format_provider(mut self, provider: impl FormatProvider + 'static) -> Self {
        self.format_provider = Arc::new(provider);
        self
    }

    pub fn with_value_formatter(mut self, formatter: JsonValueFormatter) -> Self {
        self.value_formatter = formatter;
        self
    }

    pub fn with_preserve_dotted_names(mut self, preserve: bool) -> Self {
        self.preserve_dotted_names = preserve;
        self
    }

    /// Defaults overridden by [`CLEF_PRESERVE_DOTTED_NAMES_ENV`] and
    /// [`CLEF_TYPE_TAG_ENV`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_opt)
    }

    /// Like [`FormatterOptions::from_env`], reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut options = Self::default();

        if let Some(value) = lookup(CLEF_PRESERVE_DOTTED_NAMES_ENV) {
            options.preserve_dotted_names = parse_bool(CLEF_PRESERVE_DOTTED_NAMES_ENV, &value)?;
        }

        if let Some(tag) = lookup(CLEF_TYPE_TAG_ENV) {
            let tag = tag.trim();
            options.value_formatter = if tag.is_empty() {
                JsonValueFormatter::new(None::<String>)
            } else {
                JsonValueFormatter::new(Some(tag))
            };
        }

        Ok(options)
    }

    pub(crate) fn dotted_name_convention(&self) -> Box<dyn DottedNameConvention> {
        if self.preserve_dotted_names {
            Box::new(PreserveDottedNames)
        } else {
            Box::new(UnflattenDottedNames)
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
