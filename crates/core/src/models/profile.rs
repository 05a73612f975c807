use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::required;
use crate::errors::{SessionError, SessionResult};

/// Which profile tables a user lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    Learner,
    Teacher,
    Both,
}

impl UserType {
    pub fn is_learner(&self) -> bool {
        matches!(self, UserType::Learner | UserType::Both)
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self, UserType::Teacher | UserType::Both)
    }
}

impl FromStr for UserType {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut learner = false;
        let mut teacher = false;
        for role in s.split(',').map(|r| r.trim().to_ascii_lowercase()) {
            match role.as_str() {
                "learner" | "student" => learner = true,
                "teacher" | "tutor" => teacher = true,
                _ => return Err(SessionError::Validation(format!("Invalid userType: {}", s))),
            }
        }

        match (learner, teacher) {
            (true, true) => Ok(UserType::Both),
            (true, false) => Ok(UserType::Learner),
            (false, true) => Ok(UserType::Teacher),
            (false, false) => Err(SessionError::Validation(format!("Invalid userType: {}", s))),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Learner => f.write_str("learner"),
            UserType::Teacher => f.write_str("teacher"),
            UserType::Both => f.write_str("learner,teacher"),
        }
    }
}

/// Skills arrive either as a JSON array or a comma-separated string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Csv(String),
}

impl SkillsInput {
    pub fn into_set(self) -> BTreeSet<String> {
        let raw = match self {
            SkillsInput::List(items) => items,
            SkillsInput::Csv(text) => text.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Years and experience counts are sent as numbers or numeric strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Int(i64),
    Text(String),
}

impl LooseNumber {
    fn parse(self, field: &str) -> SessionResult<Option<i64>> {
        match self {
            LooseNumber::Int(n) => Ok(Some(n)),
            LooseNumber::Text(text) if text.trim().is_empty() => Ok(None),
            LooseNumber::Text(text) => text.trim().parse().map(Some).map_err(|_| {
                SessionError::Validation(format!("{} must be a whole number, got '{}'", field, text))
            }),
        }
    }
}

fn loose_number(value: Option<LooseNumber>, field: &str) -> SessionResult<Option<i64>> {
    match value {
        Some(v) => v.parse(field),
        None => Ok(None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile_no: Option<String>,
    pub university: Option<String>,
    pub program: Option<String>,
    pub courses: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile_no: Option<String>,
    pub skills: BTreeSet<String>,
    pub experience_years: Option<i64>,
    pub experience_description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[serde(alias = "id")]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: Option<String>,
    pub mobile_no: Option<String>,
    pub university: Option<String>,
    pub program: Option<String>,
    pub courses: Option<String>,
    #[serde(alias = "startyear")]
    pub start_year: Option<LooseNumber>,
    #[serde(alias = "endyear")]
    pub end_year: Option<LooseNumber>,
    pub skills: Option<SkillsInput>,
    #[serde(alias = "expyears")]
    pub experience_years: Option<LooseNumber>,
    #[serde(alias = "expdesc")]
    pub experience_description: Option<String>,
}

/// Profiles to write for one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub user_type: UserType,
    pub learner: Option<LearnerProfile>,
    pub teacher: Option<TeacherProfile>,
}

impl RegisterUserRequest {
    pub fn validate(self) -> SessionResult<Registration> {
        let email = required(self.email, "Missing required field: email")?;
        let first_name = required(self.first_name, "Missing required field: firstName")?;
        let last_name = required(self.last_name, "Missing required field: lastName")?;
        let user_type: UserType = required(self.user_type, "Missing required field: userType")?.parse()?;
        let mobile_no = non_empty(self.mobile_no);

        let learner = if user_type.is_learner() {
            Some(LearnerProfile {
                email: email.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                mobile_no: mobile_no.clone(),
                university: non_empty(self.university),
                program: non_empty(self.program),
                courses: non_empty(self.courses),
                start_year: loose_number(self.start_year, "startYear")?,
                end_year: loose_number(self.end_year, "endYear")?,
            })
        } else {
            None
        };

        let teacher = if user_type.is_teacher() {
            Some(TeacherProfile {
                email,
                first_name,
                last_name,
                mobile_no,
                skills: self.skills.map(SkillsInput::into_set).unwrap_or_default(),
                experience_years: loose_number(self.experience_years, "experienceYears")?,
                experience_description: non_empty(self.experience_description),
            })
        } else {
            None
        };

        Ok(Registration {
            user_type,
            learner,
            teacher,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLearnerProfileRequest {
    pub university: Option<String>,
    pub program: Option<String>,
    pub courses: Option<String>,
    #[serde(alias = "startyear")]
    pub start_year: Option<LooseNumber>,
    #[serde(alias = "endyear")]
    pub end_year: Option<LooseNumber>,
}

/// Fields to overwrite on a learner profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerChanges {
    pub university: Option<String>,
    pub program: Option<String>,
    pub courses: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
}

impl UpdateLearnerProfileRequest {
    pub fn validate(self) -> SessionResult<LearnerChanges> {
        let changes = LearnerChanges {
            university: self.university,
            program: self.program,
            courses: self.courses,
            start_year: loose_number(self.start_year, "startYear")?,
            end_year: loose_number(self.end_year, "endYear")?,
        };
        if changes == LearnerChanges::default() {
            return Err(SessionError::validation("No learner fields to update"));
        }
        Ok(changes)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeacherProfileRequest {
    pub skills: Option<SkillsInput>,
    #[serde(alias = "expyears")]
    pub experience_years: Option<LooseNumber>,
    #[serde(alias = "expdesc")]
    pub experience_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherChanges {
    pub skills: Option<BTreeSet<String>>,
    pub experience_years: Option<i64>,
    pub experience_description: Option<String>,
}

impl UpdateTeacherProfileRequest {
    pub fn validate(self) -> SessionResult<TeacherChanges> {
        let changes = TeacherChanges {
            skills: self.skills.map(SkillsInput::into_set),
            experience_years: loose_number(self.experience_years, "experienceYears")?,
            experience_description: self.experience_description,
        };
        if changes == TeacherChanges::default() {
            return Err(SessionError::validation("No teacher fields to update"));
        }
        Ok(changes)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    #[serde(alias = "usertype")]
    pub user_type: Option<String>,
}

impl ProfileQuery {
    pub fn user_type(self) -> SessionResult<UserType> {
        required(self.user_type, "User type is required when retrieving a profile")?.parse()
    }
}

/// A learner and/or teacher profile flattened into one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_description: Option<String>,
}

impl ProfileResponse {
    /// Merges whichever profiles exist; the teacher record wins on shared fields.
    pub fn merge(learner: Option<LearnerProfile>, teacher: Option<TeacherProfile>) -> Self {
        let mut response = ProfileResponse::default();

        if let Some(l) = learner {
            response.email = l.email;
            response.first_name = l.first_name;
            response.last_name = l.last_name;
            response.mobile_no = l.mobile_no;
            response.university = l.university;
            response.program = l.program;
            response.courses = l.courses;
            response.start_year = l.start_year;
            response.end_year = l.end_year;
        }

        if let Some(t) = teacher {
            response.email = t.email;
            response.first_name = t.first_name;
            response.last_name = t.last_name;
            response.mobile_no = t.mobile_no.or(response.mobile_no);
            response.skills = Some(t.skills);
            response.experience_years = t.experience_years;
            response.experience_description = t.experience_description;
        }

        response
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchTeachersQuery {
    pub skills: Option<String>,
}

impl SearchTeachersQuery {
    /// Requested skills; empty means "every teacher".
    pub fn skills(&self) -> BTreeSet<String> {
        self.skills
            .clone()
            .map(|s| SkillsInput::Csv(s).into_set())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherSearchResponse {
    pub teachers: Vec<TeacherProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileWriteResponse {
    pub success: bool,
    pub message: String,
}
