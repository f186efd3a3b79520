//! Approved message templates with positional placeholders.
//!
//! A template body refers to its variables as `{{1}}`, `{{2}}`, … and the
//! definition lists the variable names in the same order. Definitions are
//! validated when they are loaded so a body and its name list can never
//! disagree at render time.

use super::{ConversationDomainError, ParseEnumError, TemplateId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Values bound to template variables, keyed by variable name.
pub type TemplateVariables = BTreeMap<String, String>;

/// Review state of a template with the messaging provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStatus {
    /// Submitted, awaiting review.
    Pending,
    /// Cleared for sending.
    Approved,
    /// Refused by the provider.
    Rejected,
}

impl TemplateStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for TemplateStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseEnumError::new("template status", value)),
        }
    }
}

/// Parameter object for building a [`TemplateDefinition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParams {
    /// Identifier.
    pub id: TemplateId,
    /// Unique template name.
    pub name: String,
    /// Provider category, e.g. `utility` or `marketing`.
    pub category: String,
    /// Language code, e.g. `en`.
    pub language: String,
    /// Body text with `{{n}}` placeholders.
    pub body: String,
    /// Variable names in placeholder order.
    pub variables: Vec<String>,
    /// Review state.
    pub status: TemplateStatus,
}

/// A validated template definition.
///
/// Only [`TemplateDefinition::new`] builds one; there is no unchecked
/// deserialization path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateDefinition {
    id: TemplateId,
    name: String,
    category: String,
    language: String,
    body: String,
    variables: Vec<String>,
    status: TemplateStatus,
}

impl TemplateDefinition {
    /// Validates and builds a template definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationDomainError::MalformedTemplate`] when the
    /// placeholder indices used in the body are not exactly `1..=n` for `n`
    /// declared variables, or when a variable name is blank or repeated.
    pub fn new(params: TemplateParams) -> Result<Self, ConversationDomainError> {
        let malformed = |reason: String| ConversationDomainError::MalformedTemplate {
            name: params.name.clone(),
            reason,
        };

        let mut seen = BTreeSet::new();
        for variable in &params.variables {
            if variable.trim().is_empty() {
                return Err(malformed("variable names must not be blank".to_owned()));
            }
            if !seen.insert(variable.as_str()) {
                return Err(malformed(format!("variable '{variable}' is declared twice")));
            }
        }

        let indices = placeholder_indices(&params.body);
        let expected: BTreeSet<usize> = (1..=params.variables.len()).collect();
        if indices != expected {
            return Err(malformed(format!(
                "body uses placeholders {indices:?} but {} variable(s) are declared",
                params.variables.len()
            )));
        }

        Ok(Self {
            id: params.id,
            name: params.name,
            category: params.category,
            language: params.language,
            body: params.body,
            variables: params.variables,
            status: params.status,
        })
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> TemplateId {
        self.id
    }

    /// Returns the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the provider category.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns the language code.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the variable names in placeholder order.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Returns the review state.
    #[must_use]
    pub const fn status(&self) -> TemplateStatus {
        self.status
    }

    /// Returns `true` when the template may be sent.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self.status, TemplateStatus::Approved)
    }

    /// Renders the body with the given bindings. See [`render`].
    #[must_use]
    pub fn render(&self, bound: &TemplateVariables) -> String {
        render(self, bound)
    }

    /// Bound values in declared variable order, skipping unbound ones.
    #[must_use]
    pub fn bound_values<'a>(&self, bound: &'a TemplateVariables) -> Vec<&'a str> {
        self.variables
            .iter()
            .filter_map(|name| bound_value(bound, name))
            .collect()
    }
}

/// Binds variables into a template body.
///
/// For the i-th declared variable the first remaining `{{i}}` is replaced by
/// the bound value. Variables with no value, or an empty one, render as
/// `{{name}}` so previews show which fields are still unfilled.
///
/// # Examples
///
/// ```
/// use switchboard::conversation::domain::{
///     render, TemplateDefinition, TemplateId, TemplateParams, TemplateStatus, TemplateVariables,
/// };
///
/// let template = TemplateDefinition::new(TemplateParams {
///     id: TemplateId::new(),
///     name: "order_update".to_owned(),
///     category: "utility".to_owned(),
///     language: "en".to_owned(),
///     body: "Hi {{1}}! Order {{2}} is {{3}}.".to_owned(),
///     variables: vec!["customer_name".into(), "order_number".into(), "status".into()],
///     status: TemplateStatus::Approved,
/// })
/// .expect("valid template");
///
/// let mut bound = TemplateVariables::new();
/// bound.insert("customer_name".to_owned(), "Amit".to_owned());
/// assert_eq!(
///     render(&template, &bound),
///     "Hi Amit! Order {{order_number}} is {{status}}."
/// );
/// ```
#[must_use]
pub fn render(template: &TemplateDefinition, bound: &TemplateVariables) -> String {
    template
        .variables
        .iter()
        .enumerate()
        .fold(template.body.clone(), |rendered, (position, name)| {
            let token = format!("{{{{{}}}}}", position.saturating_add(1));
            let replacement = bound_value(bound, name)
                .map_or_else(|| format!("{{{{{name}}}}}"), ToOwned::to_owned);
            rendered.replacen(&token, &replacement, 1)
        })
}

/// Distinct placeholder indices appearing in `body`.
///
/// Only tokens of the form `{{digits}}` count; named markers such as
/// `{{customer_name}}` are ignored.
#[must_use]
pub fn placeholder_indices(body: &str) -> BTreeSet<usize> {
    let mut indices = BTreeSet::new();
    let mut rest = body;
    while let Some(start) = rest.find("{{") {
        let after_open = rest.get(start.saturating_add(2)..).unwrap_or_default();
        let Some(end) = after_open.find("}}") else {
            break;
        };
        let inner = after_open.get(..end).unwrap_or_default();
        let parsed = if !inner.is_empty() && inner.bytes().all(|byte| byte.is_ascii_digit()) {
            inner.parse::<usize>().ok()
        } else {
            None
        };
        if let Some(index) = parsed {
            indices.insert(index);
            rest = after_open.get(end.saturating_add(2)..).unwrap_or_default();
        } else {
            rest = rest.get(start.saturating_add(1)..).unwrap_or_default();
        }
    }
    indices
}

fn bound_value<'a>(bound: &'a TemplateVariables, name: &str) -> Option<&'a str> {
    bound
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
