//! Request payloads. Fields a client may omit are `Option`; blank strings are
//! treated the same as omitted.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Comment, Education, Experience, Profile, Social, User};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub msg: String,
    /// Empty for errors about the request as a whole.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub param: String,
}

impl FieldError {
    pub fn new(param: &str, msg: &str) -> Self {
        Self {
            msg: msg.to_string(),
            param: param.to_string(),
        }
    }

    pub fn message(msg: &str) -> Self {
        Self::new("", msg)
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

fn provided(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn require(errors: &mut Vec<FieldError>, value: &Option<String>, param: &str, msg: &str) {
    if provided(value).is_none() {
        errors.push(FieldError::new(param, msg));
    }
}

/// Parse a provided date, accepting a bare date or a full timestamp.
fn parse_date(value: &Option<String>) -> Option<NaiveDate> {
    let raw = provided(value)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(&raw).ok().map(|dt| dt.date_naive()))
}

fn check_dates(errors: &mut Vec<FieldError>, from: &Option<String>, to: &Option<String>) {
    if provided(from).is_none() {
        errors.push(FieldError::new("from", "From date is required"));
    } else if parse_date(from).is_none() {
        errors.push(FieldError::new("from", "From date must be a valid date"));
    }
    if provided(to).is_some() && parse_date(to).is_none() {
        errors.push(FieldError::new("to", "To date must be a valid date"));
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Validate for LoginInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if !provided(&self.email).is_some_and(|email| email.contains('@')) {
            errors.push(FieldError::new("email", "Please include a valid email"));
        }
        require(&mut errors, &self.password, "password", "Password is required");
        finish(errors)
    }
}

impl LoginInput {
    /// Emails are stored lowercased.
    pub fn normalized_email(&self) -> Option<String> {
        provided(&self.email).map(|email| email.to_lowercase())
    }

    /// The password exactly as sent; surrounding spaces are significant.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInput {
    pub text: Option<String>,
}

impl Validate for PostInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        require(&mut errors, &self.text, "text", "Text is required");
        finish(errors)
    }
}

impl PostInput {
    pub fn text(&self) -> String {
        provided(&self.text).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentInput {
    pub text: Option<String>,
}

impl Validate for CommentInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        require(&mut errors, &self.text, "text", "Text is required");
        finish(errors)
    }
}

impl CommentInput {
    /// Comment authored by `author`, id left for the sub-collection to assign.
    pub fn into_comment(self, author: &User) -> Comment {
        Comment {
            id: Uuid::nil(),
            user: author.id,
            text: provided(&self.text).unwrap_or_default(),
            name: author.name.clone(),
            avatar: author.avatar.clone(),
            date: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub githubusername: Option<String>,
    /// Comma separated.
    pub skills: Option<String>,
    pub youtube: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
    #[serde(alias = "linkdin")]
    pub linkedin: Option<String>,
}

impl Validate for ProfileInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        require(&mut errors, &self.status, "status", "Status is required");
        require(&mut errors, &self.skills, "skills", "Skills is required");
        finish(errors)
    }
}

impl ProfileInput {
    pub fn skills(&self) -> Vec<String> {
        provided(&self.skills)
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|skill| !skill.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Overwrite the provided scalar fields. Social links are replaced as a
    /// whole; sub-collections are left untouched.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(v) = provided(&self.company) {
            profile.company = Some(v);
        }
        if let Some(v) = provided(&self.website) {
            profile.website = Some(v);
        }
        if let Some(v) = provided(&self.location) {
            profile.location = Some(v);
        }
        if let Some(v) = provided(&self.bio) {
            profile.bio = Some(v);
        }
        if let Some(v) = provided(&self.status) {
            profile.status = v;
        }
        if let Some(v) = provided(&self.githubusername) {
            profile.githubusername = Some(v);
        }
        if self.skills.is_some() {
            profile.skills = self.skills();
        }

        profile.social = Social {
            youtube: provided(&self.youtube),
            twitter: provided(&self.twitter),
            facebook: provided(&self.facebook),
            linkedin: provided(&self.linkedin),
            instagram: provided(&self.instagram),
        };
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperienceInput {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl Validate for ExperienceInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        require(&mut errors, &self.title, "title", "Title is required");
        require(&mut errors, &self.company, "company", "Company is required");
        check_dates(&mut errors, &self.from, &self.to);
        finish(errors)
    }
}

impl ExperienceInput {
    /// Build the entry. Call after `validate`.
    pub fn into_entry(self) -> Option<Experience> {
        Some(Experience {
            id: Uuid::nil(),
            title: provided(&self.title)?,
            company: provided(&self.company)?,
            location: provided(&self.location),
            from: parse_date(&self.from)?,
            to: if self.current { None } else { parse_date(&self.to) },
            current: self.current,
            description: provided(&self.description),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EducationInput {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub fieldofstudy: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl Validate for EducationInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        require(&mut errors, &self.school, "school", "School is required");
        require(&mut errors, &self.degree, "degree", "Degree is required");
        require(&mut errors, &self.fieldofstudy, "fieldofstudy", "Field of study is required");
        check_dates(&mut errors, &self.from, &self.to);
        finish(errors)
    }
}

impl EducationInput {
    /// Build the entry. Call after `validate`.
    pub fn into_entry(self) -> Option<Education> {
        Some(Education {
            id: Uuid::nil(),
            school: provided(&self.school)?,
            degree: provided(&self.degree)?,
            fieldofstudy: provided(&self.fieldofstudy)?,
            from: parse_date(&self.from)?,
            to: if self.current { None } else { parse_date(&self.to) },
            current: self.current,
            description: provided(&self.description),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_needs_an_email_and_password() {
        let input = LoginInput {
            email: Some("not-an-email".into()),
            password: Some(" ".into()),
        };
        assert_eq!(
            input.validate().unwrap_err(),
            vec![
                FieldError::new("email", "Please include a valid email"),
                FieldError::new("password", "Password is required"),
            ]
        );

        let input = LoginInput {
            email: Some("  Ada@Example.COM ".into()),
            password: Some("secret".into()),
        };
        assert!(input.validate().is_ok());
        assert_eq!(input.normalized_email().as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let input = PostInput {
            text: Some("   ".to_string()),
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors, vec![FieldError::new("text", "Text is required")]);
    }

    #[test]
    fn experience_reports_every_missing_field() {
        let errors = ExperienceInput::default().validate().unwrap_err();
        let params: Vec<_> = errors.iter().map(|e| e.param.as_str()).collect();
        assert_eq!(params, vec!["title", "company", "from"]);
    }

    #[test]
    fn current_experience_drops_end_date() {
        let input = ExperienceInput {
            title: Some("Engineer".to_string()),
            company: Some("Acme".to_string()),
            from: Some("2020-01-01".to_string()),
            to: Some("2021-01-01".to_string()),
            current: true,
            ..Default::default()
        };
        let entry = input.into_entry().unwrap();
        assert!(entry.to.is_none());
    }

    #[test]
    fn malformed_dates_are_field_errors() {
        let input: EducationInput = serde_json::from_value(serde_json::json!({
            "school": "MIT",
            "degree": "BSc",
            "fieldofstudy": "CS",
            "from": "last spring",
            "to": "2016-13-40"
        }))
        .unwrap();

        let errors = input.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                FieldError::new("from", "From date must be a valid date"),
                FieldError::new("to", "To date must be a valid date"),
            ]
        );
    }

    #[test]
    fn timestamps_are_accepted_as_dates() {
        let input = ExperienceInput {
            title: Some("Engineer".to_string()),
            company: Some("Acme".to_string()),
            from: Some("2020-01-01T09:30:00Z".to_string()),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
        assert_eq!(input.into_entry().unwrap().from, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn profile_skills_are_split_and_trimmed() {
        let input = ProfileInput {
            status: Some("Developer".to_string()),
            skills: Some(" rust, go ,, sql".to_string()),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
        assert_eq!(input.skills(), vec!["rust", "go", "sql"]);
    }

    #[test]
    fn apply_keeps_unprovided_scalars_and_replaces_social() {
        let mut profile = Profile::new(Uuid::new_v4(), "Junior");
        profile.company = Some("Old Co".to_string());
        profile.social.twitter = Some("old".to_string());

        let input: ProfileInput = serde_json::from_value(serde_json::json!({
            "status": "Senior",
            "skills": "rust",
            "linkdin": "https://linkedin.com/in/me"
        }))
        .unwrap();
        input.apply_to(&mut profile);

        assert_eq!(profile.status, "Senior");
        assert_eq!(profile.company.as_deref(), Some("Old Co"));
        assert!(profile.social.twitter.is_none());
        assert_eq!(profile.social.linkedin.as_deref(), Some("https://linkedin.com/in/me"));
    }
}
