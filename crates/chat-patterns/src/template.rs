//! Chat prompt templates with named `{placeholder}` substitution.
//!
//! A template is an ordered list of role-tagged text fragments. Rendering
//! fills every `{name}` from a data map and yields one [`Message`] per
//! fragment. `{{` and `}}` produce literal braces.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::llm::{Message, Role};

/// Errors that can occur while rendering a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// A placeholder has no entry in the data map.
    #[error("missing template variable: {0}")]
    MissingVariable(String),

    /// The template text itself is not well formed.
    #[error("malformed template: {0}")]
    Malformed(String),
}

/// Turns template data into an ordered message list.
pub trait PromptRenderer {
    fn render(&self, data: &BTreeMap<String, String>) -> Result<Vec<Message>, TemplateError>;
}

/// Role-tagged template fragments rendered in order.
#[derive(Debug, Clone, Default)]
pub struct ChatPromptTemplate {
    parts: Vec<(Role, String)>,
}

impl ChatPromptTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn system(self, template: impl Into<String>) -> Self {
        self.part(Role::System, template)
    }

    #[must_use]
    pub fn user(self, template: impl Into<String>) -> Self {
        self.part(Role::User, template)
    }

    #[must_use]
    pub fn assistant(self, template: impl Into<String>) -> Self {
        self.part(Role::Assistant, template)
    }

    #[must_use]
    pub fn part(mut self, role: Role, template: impl Into<String>) -> Self {
        self.parts.push((role, template.into()));
        self
    }
}

impl PromptRenderer for ChatPromptTemplate {
    fn render(&self, data: &BTreeMap<String, String>) -> Result<Vec<Message>, TemplateError> {
        self.parts
            .iter()
            .map(|(role, template)| {
                let text = substitute(&dedent(template), data)?;
                Ok(Message::new(*role, text.trim()))
            })
            .collect()
    }
}

/// Replace `{name}` placeholders with values from `data`.
fn substitute(template: &str, data: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            return Err(TemplateError::Malformed(format!(
                "unmatched '}}' at byte {}",
                template.len() - tail.len()
            )));
        } else {
            let end = tail.find('}').ok_or_else(|| {
                TemplateError::Malformed("unterminated placeholder".to_string())
            })?;
            let name = &tail[1..end];
            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(TemplateError::Malformed(format!(
                    "invalid placeholder '{{{name}}}'"
                )));
            }
            let value = data
                .get(name)
                .ok_or_else(|| TemplateError::MissingVariable(name.to_string()))?;
            out.push_str(value);
            rest = &tail[end + 1..];
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Strip the indentation shared by all non-blank lines.
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_parts_in_order() {
        let template = ChatPromptTemplate::new()
            .system("You are a customer service agent for {company_name}.")
            .user("Customer inquiry: {customer_message}");

        let messages = template
            .render(&data(&[
                ("company_name", "TechCorp Solutions"),
                ("customer_message", "It crashes on save."),
            ]))
            .unwrap();

        assert_eq!(
            messages,
            vec![
                Message::system("You are a customer service agent for TechCorp Solutions."),
                Message::user("Customer inquiry: It crashes on save."),
            ]
        );
    }

    #[test]
    fn repeated_placeholder_and_unused_data() {
        let template = ChatPromptTemplate::new().user("{x} and {x}");
        let messages = template
            .render(&data(&[("x", "1"), ("unused", "2")]))
            .unwrap();
        assert_eq!(messages[0].content(), "1 and 1");
    }

    #[test]
    fn missing_variable_is_reported() {
        let template = ChatPromptTemplate::new()
            .system("Maintain a {tone} tone.")
            .user("{customer_message}");

        let err = template.render(&data(&[("tone", "calm")])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingVariable("customer_message".to_string())
        );
    }

    #[test]
    fn doubled_braces_are_literal() {
        let template = ChatPromptTemplate::new().system(r#"Reply as {{"category": "{kind}"}}"#);
        let messages = template.render(&data(&[("kind", "billing")])).unwrap();
        assert_eq!(messages[0].content(), r#"Reply as {"category": "billing"}"#);
    }

    #[test]
    fn malformed_placeholders_are_rejected() {
        let empty = BTreeMap::new();
        for text in ["open {name", "stray } brace", "empty {} here", "bad {two words}"] {
            let err = ChatPromptTemplate::new().user(text).render(&empty).unwrap_err();
            assert!(matches!(err, TemplateError::Malformed(_)), "{text}: {err:?}");
        }
    }

    #[test]
    fn indented_blocks_are_dedented_and_trimmed() {
        let template = ChatPromptTemplate::new().system(
            "
            Customer inquiry: {customer_message}
              Customer context: {customer_context}
            ",
        );

        let messages = template
            .render(&data(&[
                ("customer_message", "Help"),
                ("customer_context", "Premium"),
            ]))
            .unwrap();

        assert_eq!(
            messages[0].content(),
            "Customer inquiry: Help\n  Customer context: Premium"
        );
    }

    #[test]
    fn values_are_not_reinterpreted() {
        let template = ChatPromptTemplate::new().user("{a}");
        let messages = template.render(&data(&[("a", "{b} }")])).unwrap();
        assert_eq!(messages[0].content(), "{b} }");
    }
}
