//! Greeting message template engine.
//!
//! Compiles templates such as `"{greeting} {name}!"` once and renders them
//! into a reused scratch buffer. The engine keeps interior-mutable state, so
//! it is `!Sync` and must run behind an affine backend.

use std::cell::{Cell, RefCell};

/// Default message template.
pub const DEFAULT_TEMPLATE: &str = "{greeting} {name}!";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),

    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),

    #[error("unmatched '}}' at byte {0}")]
    UnmatchedClose(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Greeting,
    Name,
}

/// A compiled message template.
#[derive(Debug)]
pub struct TemplateEngine {
    pieces: Vec<Piece>,
    scratch: RefCell<String>,
    renders: Cell<u64>,
}

impl TemplateEngine {
    /// Parse `template`, rejecting unknown or unbalanced placeholders.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut rest = template;
        let mut offset = 0;

        while let Some(pos) = rest.find(['{', '}']) {
            text.push_str(&rest[..pos]);
            if rest.as_bytes()[pos] == b'}' {
                return Err(TemplateError::UnmatchedClose(offset + pos));
            }

            let after = &rest[pos + 1..];
            let close = after
                .find('}')
                .ok_or(TemplateError::Unterminated(offset + pos))?;
            let piece = match &after[..close] {
                "greeting" => Piece::Greeting,
                "name" => Piece::Name,
                other => return Err(TemplateError::UnknownPlaceholder(other.to_string())),
            };

            if !text.is_empty() {
                pieces.push(Piece::Text(std::mem::take(&mut text)));
            }
            pieces.push(piece);

            let consumed = pos + 1 + close + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        text.push_str(rest);
        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }

        Ok(Self {
            pieces,
            scratch: RefCell::new(String::new()),
            renders: Cell::new(0),
        })
    }

    /// Fill in the placeholders.
    pub fn render(&self, greeting: &str, name: &str) -> String {
        let mut out = self.scratch.borrow_mut();
        out.clear();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Greeting => out.push_str(greeting),
                Piece::Name => out.push_str(name),
            }
        }
        self.renders.set(self.renders.get() + 1);
        out.clone()
    }

    /// Messages rendered since compilation.
    pub fn renders(&self) -> u64 {
        self.renders.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template() {
        let engine = TemplateEngine::compile(DEFAULT_TEMPLATE).unwrap();
        assert_eq!(engine.render("Ciao", "World"), "Ciao World!");
        assert_eq!(engine.render("Hello", "Joe"), "Hello Joe!");
        assert_eq!(engine.renders(), 2);
    }

    #[test]
    fn test_custom_template() {
        let engine = TemplateEngine::compile("<{name}> says {greeting}").unwrap();
        assert_eq!(engine.render("hi", "Ann"), "<Ann> says hi");

        let engine = TemplateEngine::compile("static").unwrap();
        assert_eq!(engine.render("x", "y"), "static");
    }

    #[test]
    fn test_template_errors() {
        assert_eq!(
            TemplateEngine::compile("{greeting} {who}").unwrap_err(),
            TemplateError::UnknownPlaceholder("who".into())
        );
        assert_eq!(
            TemplateEngine::compile("{greeting} {name").unwrap_err(),
            TemplateError::Unterminated(11)
        );
        assert_eq!(
            TemplateEngine::compile("oops} {name}").unwrap_err(),
            TemplateError::UnmatchedClose(4)
        );
    }
}
