use std::collections::{BTreeMap, BTreeSet};

use eyre::{Result, WrapErr};
use skillsession_core::models::profile::{LearnerChanges, LearnerProfile, TeacherChanges, TeacherProfile};
use tracing::warn;

use super::put_optional;
use crate::store::{Document, DocumentExt, DocumentStore, KeyedDocument, ScanFilter, scan_all};

fn identity(email: &str, first_name: &str, last_name: &str, mobile_no: Option<&String>) -> Document {
    let mut document = Document::from([
        ("email".to_string(), email.into()),
        ("firstName".to_string(), first_name.into()),
        ("lastName".to_string(), last_name.into()),
    ]);
    put_optional(&mut document, "mobileNo", mobile_no.cloned());
    document
}

pub fn learner_document(learner: &LearnerProfile) -> KeyedDocument {
    let mut document = identity(&learner.email, &learner.first_name, &learner.last_name, learner.mobile_no.as_ref());
    put_optional(&mut document, "university", learner.university.clone());
    put_optional(&mut document, "program", learner.program.clone());
    put_optional(&mut document, "courses", learner.courses.clone());
    put_optional(&mut document, "startYear", learner.start_year);
    put_optional(&mut document, "endYear", learner.end_year);
    KeyedDocument::new(learner.email.clone(), document)
}

pub fn teacher_document(teacher: &TeacherProfile) -> KeyedDocument {
    let mut document = identity(&teacher.email, &teacher.first_name, &teacher.last_name, teacher.mobile_no.as_ref());
    if !teacher.skills.is_empty() {
        document.insert("skills".to_string(), teacher.skills.clone().into());
    }
    put_optional(&mut document, "experienceYears", teacher.experience_years);
    put_optional(&mut document, "experienceDescription", teacher.experience_description.clone());
    KeyedDocument::new(teacher.email.clone(), document)
}

pub fn decode_learner(item: &KeyedDocument) -> Result<LearnerProfile> {
    let document = &item.document;
    Ok(LearnerProfile {
        email: document.optional_string("email").unwrap_or_else(|| item.key.clone()),
        first_name: document.string("firstName")?.to_string(),
        last_name: document.string("lastName")?.to_string(),
        mobile_no: document.optional_string("mobileNo"),
        university: document.optional_string("university"),
        program: document.optional_string("program"),
        courses: document.optional_string("courses"),
        start_year: document.optional_number("startYear"),
        end_year: document.optional_number("endYear"),
    })
}

pub fn decode_teacher(item: &KeyedDocument) -> Result<TeacherProfile> {
    let document = &item.document;
    Ok(TeacherProfile {
        email: document.optional_string("email").unwrap_or_else(|| item.key.clone()),
        first_name: document.string("firstName")?.to_string(),
        last_name: document.string("lastName")?.to_string(),
        mobile_no: document.optional_string("mobileNo"),
        skills: document.string_set("skills"),
        experience_years: document.optional_number("experienceYears"),
        experience_description: document.optional_string("experienceDescription"),
    })
}

pub async fn put_learner(store: &dyn DocumentStore, table: &str, learner: &LearnerProfile) -> Result<()> {
    store
        .put_item(table, learner_document(learner))
        .await
        .wrap_err_with(|| format!("failed to store learner '{}'", learner.email))
}

pub async fn put_teacher(store: &dyn DocumentStore, table: &str, teacher: &TeacherProfile) -> Result<()> {
    store
        .put_item(table, teacher_document(teacher))
        .await
        .wrap_err_with(|| format!("failed to store teacher '{}'", teacher.email))
}

pub async fn get_learner(store: &dyn DocumentStore, table: &str, email: &str) -> Result<Option<LearnerProfile>> {
    let document = store
        .get_item(table, email)
        .await
        .wrap_err_with(|| format!("failed to load learner '{}'", email))?;

    document
        .map(|document| decode_learner(&KeyedDocument::new(email, document)))
        .transpose()
}

pub async fn get_teacher(store: &dyn DocumentStore, table: &str, email: &str) -> Result<Option<TeacherProfile>> {
    let document = store
        .get_item(table, email)
        .await
        .wrap_err_with(|| format!("failed to load teacher '{}'", email))?;

    document
        .map(|document| decode_teacher(&KeyedDocument::new(email, document)))
        .transpose()
}

/// Returns `false` when no learner profile exists for `email`.
pub async fn update_learner(
    store: &dyn DocumentStore,
    table: &str,
    email: &str,
    changes: &LearnerChanges,
) -> Result<bool> {
    let mut document = Document::new();
    put_optional(&mut document, "university", changes.university.clone());
    put_optional(&mut document, "program", changes.program.clone());
    put_optional(&mut document, "courses", changes.courses.clone());
    put_optional(&mut document, "startYear", changes.start_year);
    put_optional(&mut document, "endYear", changes.end_year);

    store
        .update_item(table, email, document)
        .await
        .wrap_err_with(|| format!("failed to update learner '{}'", email))
}

/// Returns `false` when no teacher profile exists for `email`.
pub async fn update_teacher(
    store: &dyn DocumentStore,
    table: &str,
    email: &str,
    changes: &TeacherChanges,
) -> Result<bool> {
    let mut document = Document::new();
    put_optional(&mut document, "skills", changes.skills.clone());
    put_optional(&mut document, "experienceYears", changes.experience_years);
    put_optional(&mut document, "experienceDescription", changes.experience_description.clone());

    store
        .update_item(table, email, document)
        .await
        .wrap_err_with(|| format!("failed to update teacher '{}'", email))
}

/// Teachers having any of `skills`, ordered by email. An empty set returns every teacher.
pub async fn search_teachers(
    store: &dyn DocumentStore,
    table: &str,
    skills: &BTreeSet<String>,
) -> Result<Vec<TeacherProfile>> {
    let mut items = Vec::new();
    if skills.is_empty() {
        items = scan_all(store, table, &ScanFilter::all()).await?;
    } else {
        for skill in skills {
            let filter = ScanFilter::all().contains("skills", skill);
            items.extend(scan_all(store, table, &filter).await?);
        }
    }

    let mut teachers = BTreeMap::new();
    for item in &items {
        if teachers.contains_key(&item.key) {
            continue;
        }
        match decode_teacher(item) {
            Ok(teacher) => {
                teachers.insert(item.key.clone(), teacher);
            }
            Err(e) => warn!("Skipping malformed teacher '{}': {}", item.key, e),
        }
    }

    Ok(teachers.into_values().collect())
}
