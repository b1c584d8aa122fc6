//! Request body schemas.
//!
//! Every form derives [`Validate`] and is turned into a trimmed, typed input
//! value by its `into_*` method. Failures are reported as a single
//! [`ValidationFailed`] whose message joins all field messages.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use validator::{
    Validate, ValidateEmail, ValidationError, ValidationErrors, ValidationErrorsKind,
};

use crate::entities::CampgroundChanges;
use crate::error::ValidationFailed;

lazy_static! {
    static ref DANGEROUS_HTML: Regex =
        Regex::new(r"(?i)<script|<iframe|javascript:|onerror=|onload=")
            .expect("dangerous HTML pattern is a valid regex");
}

const DANGEROUS_HTML_MESSAGE: &str =
    "Contains potentially dangerous HTML content. Please remove any HTML tags.";

const MAX_USERNAME_LENGTH: usize = 30;
const MIN_PASSWORD_LENGTH: usize = 6;

/// Text part of `POST /campgrounds` and `PUT /campgrounds/{id}`.
///
/// Images never come from here: they are uploaded as files and the image
/// store reports their URLs.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CampgroundForm {
    /// Scalar fields
    #[serde(default)]
    #[validate(nested)]
    pub campground: CampgroundFields,

    /// Filenames of images to drop (update only)
    #[serde(default, deserialize_with = "one_or_many")]
    pub delete_images: Vec<String>,
}

/// Scalar campground fields as submitted
#[derive(Debug, Deserialize, Validate)]
pub struct CampgroundFields {
    /// Display title
    #[serde(default)]
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    /// Price per night, numeric strings are accepted
    #[serde(default = "missing_number", deserialize_with = "coerce_number")]
    #[validate(custom(function = "validate_price"))]
    pub price: f64,

    /// Free-text address
    #[serde(default)]
    #[validate(custom(function = "validate_location"))]
    pub location: String,

    /// Free-text description
    #[serde(default)]
    #[validate(custom(function = "validate_description"))]
    pub description: String,
}

impl Default for CampgroundFields {
    fn default() -> Self {
        Self {
            title: String::new(),
            price: missing_number(),
            location: String::new(),
            description: String::new(),
        }
    }
}

/// Validated, trimmed campground fields
#[derive(Debug, Clone, PartialEq)]
pub struct CampgroundInput {
    /// Display title
    pub title: String,
    /// Price per night
    pub price: f64,
    /// Free-text address
    pub location: String,
    /// Free-text description
    pub description: String,
}

impl CampgroundInput {
    /// Every field as a change set, for full updates
    pub fn into_changes(self) -> CampgroundChanges {
        CampgroundChanges {
            title: Some(self.title),
            description: Some(self.description),
            location: Some(self.location),
            geometry: None,
            price: Some(self.price),
        }
    }
}

/// A validated campground submission
#[derive(Debug, Clone, PartialEq)]
pub struct CampgroundSubmission {
    /// Scalar fields
    pub campground: CampgroundInput,
    /// Filenames to remove
    pub delete_images: Vec<String>,
}

impl CampgroundForm {
    /// Validates the form and returns its trimmed contents
    pub fn into_submission(self) -> Result<CampgroundSubmission, ValidationFailed> {
        check(&self)?;

        let CampgroundFields {
            title,
            price,
            location,
            description,
        } = self.campground;

        Ok(CampgroundSubmission {
            campground: CampgroundInput {
                title: title.trim().to_string(),
                price,
                location: location.trim().to_string(),
                description: description.trim().to_string(),
            },
            delete_images: self.delete_images,
        })
    }
}

/// Body of `POST /campgrounds/{id}/reviews`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReviewForm {
    /// Review fields
    #[serde(default)]
    #[validate(nested)]
    pub review: ReviewFields,
}

/// Review fields as submitted
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewFields {
    /// Star rating, numeric strings are accepted
    #[serde(default = "missing_number", deserialize_with = "coerce_number")]
    #[validate(custom(function = "validate_rating"))]
    pub rating: f64,

    /// Comment text
    #[serde(default)]
    #[validate(custom(function = "validate_review_body"))]
    pub body: String,
}

impl Default for ReviewFields {
    fn default() -> Self {
        Self {
            rating: missing_number(),
            body: String::new(),
        }
    }
}

/// Validated, trimmed review fields
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewInput {
    /// Comment text
    pub body: String,
    /// Star rating, 1 through 5
    pub rating: u8,
}

impl ReviewForm {
    /// Validates the form and returns its trimmed contents
    pub fn into_input(self) -> Result<ReviewInput, ValidationFailed> {
        check(&self)?;

        Ok(ReviewInput {
            body: self.review.body.trim().to_string(),
            // validated as a whole number in 1..=5
            rating: self.review.rating as u8,
        })
    }
}

/// Body of `POST /register`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterForm {
    /// Email address
    #[serde(default)]
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,

    /// Desired login name
    #[serde(default)]
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    /// Plain-text password
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Validated registration data. The password is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterInput {
    /// Trimmed email address
    pub email: String,
    /// Trimmed login name
    pub username: String,
    /// Plain-text password
    pub password: String,
}

impl RegisterForm {
    /// Validates the form and returns its trimmed contents
    pub fn into_input(self) -> Result<RegisterInput, ValidationFailed> {
        check(&self)?;

        Ok(RegisterInput {
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password,
        })
    }
}

/// Body of `POST /login`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginForm {
    /// Login name
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Plain-text password
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginForm {
    /// Validates the form, returning the trimmed username and the password
    pub fn into_credentials(self) -> Result<(String, String), ValidationFailed> {
        check(&self)?;
        Ok((self.username.trim().to_string(), self.password))
    }
}

fn check<T: Validate>(form: &T) -> Result<(), ValidationFailed> {
    form.validate().map_err(|errors| {
        let mut messages = Vec::new();
        collect_messages(&errors, &mut messages);
        if messages.is_empty() {
            ValidationFailed::new("Validation failed")
        } else {
            ValidationFailed::new(messages.join(", "))
        }
    })
}

fn collect_messages(errors: &ValidationErrors, messages: &mut Vec<String>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(field, _)| field.to_string());

    for (field, kind) in fields {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("{field} is invalid"),
                    };
                    messages.push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, messages),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_messages(nested, messages);
                }
            }
        }
    }
}

fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Required after trimming, and rejected if it matches the dangerous-HTML denylist
fn safe_text(value: &str, label: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", format!("{label} is required")));
    }
    if DANGEROUS_HTML.is_match(value) {
        return Err(invalid("dangerous_html", DANGEROUS_HTML_MESSAGE));
    }
    Ok(())
}

fn validate_title(value: &str) -> Result<(), ValidationError> {
    safe_text(value, "Title")
}

fn validate_location(value: &str) -> Result<(), ValidationError> {
    safe_text(value, "Location")
}

fn validate_description(value: &str) -> Result<(), ValidationError> {
    safe_text(value, "Description")
}

fn validate_review_body(value: &str) -> Result<(), ValidationError> {
    safe_text(value, "Review body")
}

fn validate_price(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(invalid("type", "Price must be a number"));
    }
    if value < 0.0 {
        return Err(invalid("range", "Price must be at least 0"));
    }
    Ok(())
}

fn validate_rating(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(invalid("type", "Rating must be a number"));
    }
    if value < 1.0 {
        return Err(invalid("range", "Rating must be at least 1"));
    }
    if value > 5.0 {
        return Err(invalid("range", "Rating must be at most 5"));
    }
    if value.fract() != 0.0 {
        return Err(invalid("integer", "Rating must be a whole number"));
    }
    Ok(())
}

fn validate_email_address(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", "Email is required"));
    }
    if !value.trim().validate_email() {
        return Err(invalid("email", "Please enter a valid email"));
    }
    Ok(())
}

fn validate_username(value: &str) -> Result<(), ValidationError> {
    safe_text(value, "Username")?;
    if value.trim().chars().count() > MAX_USERNAME_LENGTH {
        return Err(invalid(
            "length",
            format!("Username must be at most {MAX_USERNAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

fn missing_number() -> f64 {
    f64::NAN
}

/// Accepts JSON numbers and numeric strings. Blank strings and `null` read as
/// zero, anything else unparseable as NaN so the field validator rejects it.
fn coerce_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                0.0
            } else {
                text.parse().unwrap_or(f64::NAN)
            }
        }
        serde_json::Value::Bool(flag) => f64::from(u8::from(flag)),
        serde_json::Value::Null => 0.0,
        _ => f64::NAN,
    })
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(filename)) => vec![filename],
        Some(OneOrMany::Many(filenames)) => filenames,
    })
}
