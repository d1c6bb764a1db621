//! Submitted form bodies and their validation.
//!
//! Forms deserialize leniently (every field defaults) so that a missing
//! field becomes a field error instead of a body rejection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::models::{Category, Condition};

pub const TITLE_MAX_LEN: usize = 200;
pub const URL_MAX_LEN: usize = 200;
pub const COMMENT_MAX_LEN: usize = 2000;
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Key used for errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name -> messages, in stable field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

// -- Ad --

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdForm {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: String,
    pub condition: String,
}

/// A validated ad form, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct AdInput {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: Category,
    pub condition: Condition,
}

impl AdForm {
    pub fn validate(self) -> Result<AdInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.add("title", "This field is required.");
        } else if title.chars().count() > TITLE_MAX_LEN {
            errors.add(
                "title",
                format!("Ensure this value has at most {TITLE_MAX_LEN} characters."),
            );
        }

        let description = self.description.trim().to_string();
        if description.is_empty() {
            errors.add("description", "This field is required.");
        }

        let image_url = self
            .image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        if let Some(url) = &image_url {
            if !is_valid_url(url) {
                errors.add("image_url", "Enter a valid URL.");
            }
        }

        let category = choice(&mut errors, "category", &self.category, Category::parse);
        let condition = choice(&mut errors, "condition", &self.condition, Condition::parse);

        match (category, condition) {
            (Some(category), Some(condition)) => errors.into_result(|| AdInput {
                title,
                description,
                image_url,
                category,
                condition,
            }),
            _ => Err(errors),
        }
    }
}

fn choice<T>(
    errors: &mut FieldErrors,
    field: &str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, "This field is required.");
        return None;
    }
    let parsed = parse(raw);
    if parsed.is_none() {
        errors.add(
            field,
            format!("Select a valid choice. {raw} is not one of the available choices."),
        );
    }
    parsed
}

/// Absolute http(s) URL with a well-formed host and no whitespace.
pub fn is_valid_url(raw: &str) -> bool {
    if raw.len() > URL_MAX_LEN || raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    match url.host() {
        Some(Host::Domain(domain)) => domain.split('.').all(is_valid_label),
        Some(Host::Ipv4(_) | Host::Ipv6(_)) => true,
        None => false,
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

// -- Proposal --

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalForm {
    pub ad_sender: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProposalInput {
    pub ad_sender: i64,
    pub comment: Option<String>,
}

impl ProposalForm {
    /// Shape checks only; ownership rules need the store.
    pub fn validate(self) -> Result<ProposalInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.ad_sender.is_none() {
            errors.add("ad_sender", "This field is required.");
        }

        let comment = self
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if comment
            .as_ref()
            .is_some_and(|c| c.chars().count() > COMMENT_MAX_LEN)
        {
            errors.add(
                "comment",
                format!("Ensure this value has at most {COMMENT_MAX_LEN} characters."),
            );
        }

        match self.ad_sender {
            Some(ad_sender) => errors.into_result(|| ProposalInput { ad_sender, comment }),
            None => Err(errors),
        }
    }
}

// -- Accounts --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        let len = self.username.chars().count();
        if self.username.trim().is_empty() {
            errors.add("username", "This field is required.");
        } else if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
            errors.add(
                "username",
                format!("Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters."),
            );
        } else if !self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. Letters, digits and @/./+/-/_ only.",
            );
        }

        if self.password.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password",
                format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
            );
        }
        if self.password != self.password_confirm {
            errors.add("password_confirm", "The two password fields didn't match.");
        }

        errors.into_result(|| ())
    }
}
