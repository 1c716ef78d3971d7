//! Message templates: literal text with named or positional holes.
//!
//! ```text
//! Processed {@Order} in {Elapsed,8:0.000} ms
//! ```
//!
//! `{{` and `}}` escape braces. A hole may carry a destructuring hint
//! (`@` or `$`), an alignment after `,` and a format string after `:`.
//! Anything that does not parse as a hole is kept as text.

/// Parsed message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(TextToken),
    Property(PropertyToken),
}

/// Literal text with brace escapes already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextToken {
    pub text: String,
}

/// Reference to a property by name or position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyToken {
    pub name: String,
    /// The hole exactly as written, braces included.
    pub raw_text: String,
    pub destructuring: Destructuring,
    pub alignment: Option<Alignment>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Destructuring {
    #[default]
    Default,
    /// `{@Name}`: capture the structure of the value.
    Destructure,
    /// `{$Name}`: capture the value as a string.
    Stringify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    pub direction: AlignmentDirection,
    pub width: usize,
}

impl PropertyToken {
    /// Index of a positional hole such as `{0}`.
    pub fn position(&self) -> Option<usize> {
        if self.name.bytes().all(|b| b.is_ascii_digit()) {
            self.name.parse().ok()
        } else {
            None
        }
    }
}

impl MessageTemplate {
    /// Parse `text`; never fails, malformed holes become text.
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = parse_tokens(&text);
        MessageTemplate { text, tokens }
    }

    /// A template whose text renders as `message` verbatim.
    pub fn literal(message: &str) -> Self {
        let text = message.replace('{', "{{").replace('}', "}}");
        let tokens = if message.is_empty() {
            Vec::new()
        } else {
            vec![Token::Text(TextToken {
                text: message.to_string(),
            })]
        };
        MessageTemplate { text, tokens }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn property_tokens(&self) -> impl Iterator<Item = &PropertyToken> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Property(p) => Some(p),
            Token::Text(_) => None,
        })
    }
}

fn parse_tokens(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while !rest.is_empty() {
        let (text, remainder) = parse_text(rest);
        if !text.is_empty() {
            tokens.push(Token::Text(TextToken { text }));
        }
        rest = remainder;

        if rest.is_empty() {
            break;
        }

        let (token, remainder) = parse_hole(rest);
        tokens.push(token);
        rest = remainder;
    }

    tokens
}

/// Consume literal text up to the next unescaped `{`.
fn parse_text(input: &str) -> (String, &str) {
    let mut text = String::new();
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                if let Some(&(_, '{')) = chars.peek() {
                    chars.next();
                    text.push('{');
                } else {
                    return (text, &input[i..]);
                }
            }
            '}' => {
                if let Some(&(_, '}')) = chars.peek() {
                    chars.next();
                }
                text.push('}');
            }
            other => text.push(other),
        }
    }

    (text, "")
}

/// `input` starts with `{`.
fn parse_hole(input: &str) -> (Token, &str) {
    let body_start = 1;
    let Some(close) = input[body_start..].find(['{', '}']).map(|i| i + body_start) else {
        return (text_token(input), "");
    };

    if input.as_bytes()[close] == b'{' {
        // a nested brace starts a new hole; what came before is text
        return (text_token(&input[..close]), &input[close..]);
    }

    let raw = &input[..=close];
    let rest = &input[close + 1..];
    match parse_property(raw, &input[body_start..close]) {
        Some(token) => (Token::Property(token), rest),
        None => (text_token(raw), rest),
    }
}

fn text_token(text: &str) -> Token {
    Token::Text(TextToken {
        text: text.to_string(),
    })
}

fn parse_property(raw: &str, body: &str) -> Option<PropertyToken> {
    let (destructuring, body) = match body.chars().next() {
        Some('@') => (Destructuring::Destructure, &body[1..]),
        Some('$') => (Destructuring::Stringify, &body[1..]),
        _ => (Destructuring::Default, body),
    };

    let (head, format) = match body.split_once(':') {
        Some((head, format)) => (head, Some(format)),
        None => (body, None),
    };
    let (name, alignment) = match head.split_once(',') {
        Some((name, alignment)) => (name, Some(alignment)),
        None => (head, None),
    };

    if !is_valid_name(name) {
        return None;
    }

    let alignment = match alignment {
        Some(a) => Some(parse_alignment(a)?),
        None => None,
    };

    let format = match format {
        Some(f) if f.is_empty() || f.chars().any(char::is_control) => return None,
        Some(f) => Some(f.to_string()),
        None => None,
    };

    let token = PropertyToken {
        name: name.to_string(),
        raw_text: raw.to_string(),
        destructuring,
        alignment,
        format,
    };

    // positional holes cannot be destructured
    if token.position().is_some() && destructuring != Destructuring::Default {
        return None;
    }
    Some(token)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains("..")
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

fn parse_alignment(text: &str) -> Option<Alignment> {
    let (direction, digits) = match text.strip_prefix('-') {
        Some(digits) => (AlignmentDirection::Left, digits),
        None => (AlignmentDirection::Right, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let width: usize = digits.parse().ok()?;
    if width == 0 {
        return None;
    }
    Some(Alignment { direction, width })
}
