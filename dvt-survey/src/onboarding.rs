//! Onboarding capture: participant form validation
//!
//! All five fields are checked in one pass. Every invalid field gets exactly
//! one message, keyed by its form field name; valid fields get none.

use dvt_common::{Participant, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 120;

/// A selectable form option (`value` is what gets stored)
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FormOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub const GENDER_OPTIONS: &[FormOption] = &[
    FormOption { value: "male", label: "Male" },
    FormOption { value: "female", label: "Female" },
    FormOption { value: "non-binary", label: "Non-binary" },
    FormOption { value: "prefer-not-to-say", label: "Prefer not to say" },
];

pub const MUSIC_PLATFORMS: &[FormOption] = &[
    FormOption { value: "spotify", label: "Spotify" },
    FormOption { value: "apple-music", label: "Apple Music" },
    FormOption { value: "youtube-music", label: "YouTube Music" },
    FormOption { value: "other", label: "Other" },
];

/// Raw form input, exactly as the participant entered it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingForm {
    #[serde(default)]
    pub name: String,
    /// Free text; must parse as a whole number
    #[serde(default, deserialize_with = "age_as_text")]
    pub age: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub music_platforms: Vec<String>,
}

/// Accept the age as either a JSON string or a JSON number
fn age_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AgeInput {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match AgeInput::deserialize(deserializer)? {
        AgeInput::Text(text) => text,
        AgeInput::Number(number) => number.to_string(),
    })
}

/// Form field names as used in error maps
pub mod field {
    pub const NAME: &str = "name";
    pub const AGE: &str = "age";
    pub const GENDER: &str = "gender";
    pub const LOCATION: &str = "location";
    pub const MUSIC_PLATFORMS: &str = "musicPlatforms";
}

/// One message per invalid field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validate the form and build the participant record
pub fn validate_onboarding(
    form: &OnboardingForm,
    session_id: SessionId,
) -> Result<Participant, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = form.name.trim();
    if name.is_empty() {
        errors.insert(field::NAME, "Name is required");
    }

    let age = match form.age.trim().parse::<i64>() {
        Ok(age) if age < MIN_AGE => {
            errors.insert(field::AGE, format!("Age must be at least {MIN_AGE}"));
            None
        }
        Ok(age) if age > MAX_AGE => {
            errors.insert(field::AGE, format!("Age must be at most {MAX_AGE}"));
            None
        }
        Ok(age) => u8::try_from(age).ok(),
        Err(_) => {
            errors.insert(field::AGE, "Age must be a number");
            None
        }
    };

    let gender = form.gender.trim();
    if gender.is_empty() {
        errors.insert(field::GENDER, "Gender is required");
    }

    let location = form.location.trim();
    if location.is_empty() {
        errors.insert(field::LOCATION, "Location is required");
    }

    let mut music_platforms: Vec<String> = Vec::with_capacity(form.music_platforms.len());
    for platform in form.music_platforms.iter().map(|p| p.trim()) {
        if !platform.is_empty() && !music_platforms.iter().any(|p| p == platform) {
            music_platforms.push(platform.to_string());
        }
    }
    if music_platforms.is_empty() {
        errors.insert(
            field::MUSIC_PLATFORMS,
            "Please select at least one music platform",
        );
    }

    match age {
        Some(age) if errors.is_empty() => Ok(Participant {
            session_id,
            name: name.to_string(),
            age,
            gender: gender.to_string(),
            location: location.to_string(),
            music_platforms,
        }),
        _ => Err(errors),
    }
}
