/// Environment variable names used by this crate for configuring
/// formatters from services.
///
/// These are purely helpers; the formatter types remain decoupled from
/// environment access.

/// `true` keeps dotted property names flat instead of nesting them.
pub const CLEF_PRESERVE_DOTTED_NAMES_ENV: &str = "CLEF_PRESERVE_DOTTED_NAMES";

/// Discriminator key for structure type tags; an empty value disables
/// type tags.
pub const CLEF_TYPE_TAG_ENV: &str = "CLEF_TYPE_TAG";

/// Read an environment variable, treating unset and non-UTF-8 alike.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
