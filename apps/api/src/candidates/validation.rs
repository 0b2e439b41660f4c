use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{AppError, FieldError};
use crate::models::candidate::{CandidateStatus, Education};

/// One field of a posted payload. A value of the wrong JSON type is kept as
/// `Malformed` so it becomes a field error instead of failing the body.
#[derive(Debug, Clone, PartialEq)]
pub enum Posted<T> {
    Missing,
    Value(T),
    Malformed,
}

impl<T> Default for Posted<T> {
    fn default() -> Self {
        Posted::Missing
    }
}

impl<T> Posted<T> {
    /// The posted value, or `None` when missing or malformed.
    pub fn into_value(self) -> Option<T> {
        match self {
            Posted::Value(value) => Some(value),
            Posted::Missing | Posted::Malformed => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Posted::Malformed)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Posted<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Posted::Missing);
        }
        Ok(serde_json::from_value(value).map_or(Posted::Malformed, Posted::Value))
    }
}

/// A JSON value that should be a number. Forms post numbers as strings, so
/// numeric strings are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    /// Coerces to an integer, truncating any fractional part.
    pub fn to_integer(&self) -> Option<i64> {
        let float = match self {
            Numeric::Integer(i) => return Some(*i),
            Numeric::Float(f) => *f,
            Numeric::Text(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return Some(i);
                }
                s.parse::<f64>().ok()?
            }
        };
        if !float.is_finite() || float.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(float.trunc() as i64)
    }
}

/// Skills arrive as a list, or as one comma-separated string from plain forms.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Joined(String),
}

impl SkillsInput {
    fn into_list(self) -> Vec<String> {
        let raw = match self {
            SkillsInput::List(skills) => skills,
            SkillsInput::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EducationInput {
    pub degree: Posted<String>,
    pub institution: Posted<String>,
    #[serde(alias = "graduationYear")]
    pub year: Posted<Numeric>,
}

/// Raw candidate payload as posted by a client. Nothing is trusted yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CandidateInput {
    pub first_name: Posted<String>,
    pub last_name: Posted<String>,
    pub email: Posted<String>,
    pub phone: Posted<String>,
    pub position: Posted<String>,
    pub experience: Posted<Numeric>,
    pub skills: Posted<SkillsInput>,
    pub education: Posted<EducationInput>,
    pub status: Posted<String>,
    pub notes: Posted<String>,
    pub resume_url: Posted<String>,
}

/// A validated candidate payload.
///
/// Required fields always replace the stored value. The optional fields are
/// only applied when present, so an update that omits `notes` keeps them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub experience: u32,
    pub education: Education,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CandidateStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusInput {
    pub status: Posted<String>,
}

/// Checks every field of a candidate payload and collects all violations,
/// in a fixed order, before giving up.
pub fn validate_candidate(input: CandidateInput) -> Result<CandidateDraft, AppError> {
    let mut errors = Vec::new();

    let first_name = required_text(
        input.first_name,
        "firstName",
        "First name is required",
        &mut errors,
    );
    let last_name = required_text(
        input.last_name,
        "lastName",
        "Last name is required",
        &mut errors,
    );

    let email = input
        .email
        .into_value()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| is_valid_email(e));
    if email.is_none() {
        errors.push(FieldError::new("email", "Please enter a valid email"));
    }

    let phone = required_text(input.phone, "phone", "Phone number is required", &mut errors);
    let position = required_text(input.position, "position", "Position is required", &mut errors);

    let experience = input
        .experience
        .into_value()
        .as_ref()
        .and_then(Numeric::to_integer)
        .and_then(|years| u32::try_from(years).ok())
        .filter(|years| i32::try_from(*years).is_ok());
    if experience.is_none() {
        errors.push(FieldError::new(
            "experience",
            "Experience must be a non-negative number",
        ));
    }

    let education = input.education.into_value().unwrap_or_default();
    let degree = required_text(
        education.degree,
        "education.degree",
        "Degree is required",
        &mut errors,
    );
    let institution = required_text(
        education.institution,
        "education.institution",
        "Institution is required",
        &mut errors,
    );
    let year = education
        .year
        .into_value()
        .as_ref()
        .and_then(Numeric::to_integer)
        .and_then(|y| i32::try_from(y).ok());
    if year.is_none() {
        errors.push(FieldError::new("education.year", "Year must be a number"));
    }

    let skills = optional(
        input.skills,
        "skills",
        "Skills must be a list of text values",
        &mut errors,
    )
    .map(SkillsInput::into_list);
    let notes = optional(input.notes, "notes", "Notes must be text", &mut errors);
    let resume_url = optional(
        input.resume_url,
        "resumeUrl",
        "Resume URL must be text",
        &mut errors,
    );

    let status = match input.status {
        Posted::Missing => None,
        Posted::Malformed => {
            errors.push(invalid_status());
            None
        }
        Posted::Value(raw) => match raw.parse::<CandidateStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.push(invalid_status());
                None
            }
        },
    };

    match (first_name, last_name, email, phone, position, experience, degree, institution, year) {
        (
            Some(first_name),
            Some(last_name),
            Some(email),
            Some(phone),
            Some(position),
            Some(experience),
            Some(degree),
            Some(institution),
            Some(year),
        ) if errors.is_empty() => Ok(CandidateDraft {
            first_name,
            last_name,
            email,
            phone,
            position,
            experience,
            education: Education {
                degree,
                institution,
                year,
            },
            skills,
            status,
            notes: notes.map(|n| n.trim().to_string()),
            resume_url: resume_url.map(|u| u.trim().to_string()),
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Parses the body of a status change. Missing, mistyped and unknown values
/// are all reported as an invalid status.
pub fn validate_status(input: &StatusInput) -> Result<CandidateStatus, AppError> {
    let parsed = match &input.status {
        Posted::Value(raw) => raw.parse::<CandidateStatus>().ok(),
        Posted::Missing | Posted::Malformed => None,
    };
    parsed.ok_or_else(|| AppError::Validation(vec![invalid_status()]))
}

/// `local@domain` with at least one dot in the domain and no empty labels.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn invalid_status() -> FieldError {
    FieldError::new("status", "Invalid status")
}

fn required_text(
    value: Posted<String>,
    field: &str,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let value = value
        .into_value()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if value.is_none() {
        errors.push(FieldError::new(field, message));
    }
    value
}

/// Optional fields may be absent, but a value of the wrong type is an error.
fn optional<T>(
    value: Posted<T>,
    field: &str,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    if value.is_malformed() {
        errors.push(FieldError::new(field, message));
    }
    value.into_value()
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn valid_body() -> Value {
        json!({
            "firstName": "John",
            "lastName": "Doe",
            "email": "John.Doe@Example.com ",
            "phone": "555-0100",
            "position": "Backend Engineer",
            "experience": 5,
            "skills": [" Rust ", "", "SQL"],
            "education": { "degree": "BSc", "institution": "MIT", "year": 2015 }
        })
    }

    fn validate(body: Value) -> Result<CandidateDraft, AppError> {
        validate_candidate(serde_json::from_value(body).unwrap())
    }

    fn with(field: &str, value: Value) -> Value {
        let mut body = valid_body();
        body[field] = value;
        body
    }

    fn field_names(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_input_produces_draft() {
        let draft = validate(valid_body()).unwrap();
        assert_eq!(draft.email, "john.doe@example.com");
        assert_eq!(draft.experience, 5);
        assert_eq!(draft.skills, Some(vec!["Rust".to_string(), "SQL".to_string()]));
        assert_eq!(draft.education.year, 2015);
        assert_eq!(draft.status, None);
    }

    #[test]
    fn test_empty_input_reports_every_required_field_in_order() {
        let fields = field_names(validate_candidate(CandidateInput::default()).unwrap_err());
        assert_eq!(
            fields,
            vec![
                "firstName",
                "lastName",
                "email",
                "phone",
                "position",
                "experience",
                "education.degree",
                "education.institution",
                "education.year",
            ]
        );
    }

    #[test]
    fn test_whitespace_only_is_missing() {
        let err = validate(with("firstName", json!("   "))).unwrap_err();
        assert_eq!(field_names(err), vec!["firstName"]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let err = validate(with("phone", Value::Null)).unwrap_err();
        assert_eq!(field_names(err), vec!["phone"]);

        let draft = validate(with("notes", Value::Null)).unwrap();
        assert_eq!(draft.notes, None);
    }

    #[test]
    fn test_wrong_types_become_field_errors() {
        let body = json!({
            "firstName": 42,
            "lastName": ["Doe"],
            "email": true,
            "phone": "555-0100",
            "position": { "title": "Engineer" },
            "experience": true,
            "skills": 7,
            "education": "MIT",
            "status": 3,
            "notes": false,
            "resumeUrl": 12
        });
        assert_eq!(
            field_names(validate(body).unwrap_err()),
            vec![
                "firstName",
                "lastName",
                "email",
                "position",
                "experience",
                "education.degree",
                "education.institution",
                "education.year",
                "skills",
                "notes",
                "resumeUrl",
                "status",
            ]
        );
    }

    #[test]
    fn test_mistyped_education_members_are_reported_individually() {
        let body = with(
            "education",
            json!({ "degree": 1, "institution": "MIT", "year": [2015] }),
        );
        assert_eq!(
            field_names(validate(body).unwrap_err()),
            vec!["education.degree", "education.year"]
        );
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let mut body = with("experience", json!("7"));
        body["education"]["year"] = json!("2019");
        let draft = validate(body).unwrap();
        assert_eq!(draft.experience, 7);
        assert_eq!(draft.education.year, 2019);
    }

    #[test]
    fn test_fractional_experience_is_truncated() {
        assert_eq!(validate(with("experience", json!(3.9))).unwrap().experience, 3);
    }

    #[test]
    fn test_negative_and_non_numeric_experience_rejected() {
        for bad in [json!(-1), json!("lots"), json!(false)] {
            let err = validate(with("experience", bad)).unwrap_err();
            assert_eq!(field_names(err), vec!["experience"]);
        }
    }

    #[test]
    fn test_comma_separated_skills_are_split() {
        let draft = validate(with("skills", json!("Rust, SQL ,, Go"))).unwrap();
        assert_eq!(
            draft.skills,
            Some(vec!["Rust".to_string(), "SQL".to_string(), "Go".to_string()])
        );
    }

    #[test]
    fn test_graduation_year_alias_accepted() {
        let draft = validate(json!({
            "firstName": "Ann",
            "lastName": "Lee",
            "email": "ann@lee.dev",
            "phone": "1",
            "position": "QA",
            "experience": "0",
            "education": { "degree": "BA", "institution": "UCL", "graduationYear": 2021 }
        }))
        .unwrap();
        assert_eq!(draft.education.year, 2021);
        assert_eq!(draft.experience, 0);
        assert_eq!(draft.skills, None);
    }

    #[test]
    fn test_invalid_status_is_reported_last() {
        let mut body = with("status", json!("Bogus"));
        body["phone"] = json!("");
        assert_eq!(field_names(validate(body).unwrap_err()), vec!["phone", "status"]);
    }

    #[test]
    fn test_supplied_status_is_kept() {
        let draft = validate(with("status", json!("Hired"))).unwrap();
        assert_eq!(draft.status, Some(CandidateStatus::Hired));
    }

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn test_validate_status() {
        let ok: StatusInput = serde_json::from_value(json!({ "status": "Interviewing" })).unwrap();
        assert_eq!(validate_status(&ok).unwrap(), CandidateStatus::Interviewing);

        for bad in [
            json!({}),
            json!({ "status": "Bogus" }),
            json!({ "status": "hired" }),
            json!({ "status": 2 }),
        ] {
            let input: StatusInput = serde_json::from_value(bad).unwrap();
            let err = validate_status(&input).unwrap_err();
            assert_eq!(field_names(err), vec!["status"]);
        }
    }
}
