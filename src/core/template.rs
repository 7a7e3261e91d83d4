//! Command templates.
//!
//! A template is split into words once, when the taskfile loads, and rendered
//! straight to an argv vector. Nothing is ever handed to a shell, so a value
//! like `msg="add sales table"` stays a single argument.
//!
//! `{{ name }}` marks a placeholder. `\{{` is a literal `{{`, for tools with
//! their own brace syntax such as `docker ps --format '\{{.ID}}'`.

use crate::domain::model::{shell_quote, Binding, Bindings};
use crate::utils::error::{Result, TaskError};
use crate::utils::validation::validate_variable_name;
use std::collections::BTreeSet;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const ESCAPED_OPEN: &str = "\\{{";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

type Word = Vec<Segment>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
    words: Vec<Word>,
}

/// Split on unquoted whitespace. Quotes group and are dropped; `''` is an
/// empty argument. Whitespace inside `{{ ... }}` never splits a word.
fn split_words(source: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut in_placeholder = false;
    let mut rest = source;

    while let Some(c) = rest.chars().next() {
        if quote.is_none() {
            if let Some(after) = rest.strip_prefix(ESCAPED_OPEN) {
                current.push_str(ESCAPED_OPEN);
                in_word = true;
                rest = after;
                continue;
            }
            let marker = if in_placeholder { CLOSE } else { OPEN };
            if let Some(after) = rest.strip_prefix(marker) {
                current.push_str(marker);
                in_word = true;
                in_placeholder = !in_placeholder;
                rest = after;
                continue;
            }
        }
        rest = &rest[c.len_utf8()..];

        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if in_placeholder => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(TaskError::template(source, format!("unterminated {} quote", q)));
    }
    if in_placeholder {
        return Err(TaskError::template(source, "unterminated `{{`"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn parse_word(source: &str, raw: &str) -> Result<Word> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = raw;

    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix(ESCAPED_OPEN) {
            literal.push_str(OPEN);
            rest = after;
        } else if let Some(after) = rest.strip_prefix(OPEN) {
            let end = after
                .find(CLOSE)
                .ok_or_else(|| TaskError::template(source, "unterminated `{{`"))?;
            let name = after[..end].trim();
            if name.is_empty() {
                return Err(TaskError::template(source, "empty placeholder"));
            }
            validate_variable_name("placeholder", name).map_err(|_| {
                TaskError::template(
                    source,
                    format!("invalid placeholder name `{}` (write `\\{{{{` for a literal `{{{{`)", name),
                )
            })?;
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Placeholder(name.to_string()));
            rest = &after[end + CLOSE.len()..];
        } else {
            literal.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }

    if !literal.is_empty() || segments.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

impl CommandTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let words = split_words(source)?
            .iter()
            .map(|raw| parse_word(source, raw))
            .collect::<Result<Vec<_>>>()?;

        if words.is_empty() {
            return Err(TaskError::template(source, "command is empty"));
        }

        Ok(Self {
            source: source.to_string(),
            words,
        })
    }

    /// Parse a template that renders to one string, such as an environment
    /// value. No word splitting, no quote handling.
    pub fn parse_value(source: &str) -> Result<Self> {
        Ok(Self {
            source: source.to_string(),
            words: vec![parse_word(source, source)?],
        })
    }

    pub fn render_value(&self, bindings: &Bindings) -> Result<String> {
        let mut rendered = Vec::new();
        for word in &self.words {
            let mut value = String::new();
            for segment in word {
                match segment {
                    Segment::Literal(text) => value.push_str(text),
                    Segment::Placeholder(name) => value.push_str(&self.lookup(bindings, name)?.joined()),
                }
            }
            rendered.push(value);
        }
        Ok(rendered.join(" "))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholders(&self) -> BTreeSet<&str> {
        self.words
            .iter()
            .flatten()
            .filter_map(|segment| match segment {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    pub fn render(&self, bindings: &Bindings) -> Result<Vec<String>> {
        let mut argv = Vec::new();

        for word in &self.words {
            if let [Segment::Placeholder(name)] = word.as_slice() {
                match self.lookup(bindings, name)? {
                    Binding::List(items) => argv.extend(items.iter().cloned()),
                    Binding::Single(value) => argv.push(value.clone()),
                }
                continue;
            }

            let mut rendered = String::new();
            for segment in word {
                match segment {
                    Segment::Literal(text) => rendered.push_str(text),
                    Segment::Placeholder(name) => {
                        rendered.push_str(&self.lookup(bindings, name)?.joined())
                    }
                }
            }
            argv.push(rendered);
        }

        if argv.is_empty() {
            return Err(TaskError::template(&self.source, "renders to an empty command"));
        }
        Ok(argv)
    }

    /// Human-readable rendering for dry runs. Placeholders with no binding
    /// are shown through `fallback`, verbatim and unquoted.
    pub fn render_display(&self, bindings: &Bindings, fallback: impl Fn(&str) -> String) -> String {
        let mut parts = Vec::new();

        for word in &self.words {
            if let [Segment::Placeholder(name)] = word.as_slice() {
                match bindings.get(name) {
                    Some(Binding::List(items)) => {
                        parts.extend(items.iter().map(|item| shell_quote(item)))
                    }
                    Some(Binding::Single(value)) => parts.push(shell_quote(value)),
                    None => parts.push(fallback(name)),
                }
                continue;
            }

            let mut rendered = String::new();
            let mut raw = false;
            for segment in word {
                match segment {
                    Segment::Literal(text) => rendered.push_str(text),
                    Segment::Placeholder(name) => match bindings.get(name) {
                        Some(binding) => rendered.push_str(&binding.joined()),
                        None => {
                            rendered.push_str(&fallback(name));
                            raw = true;
                        }
                    },
                }
            }
            parts.push(if raw { rendered } else { shell_quote(&rendered) });
        }

        parts.join(" ")
    }

    fn lookup<'a>(&self, bindings: &'a Bindings, name: &str) -> Result<&'a Binding> {
        bindings
            .get(name)
            .ok_or_else(|| TaskError::template(&self.source, format!("no value for `{{{{{}}}}}`", name)))
    }
}
