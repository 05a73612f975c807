use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use skillsession_core::{
    errors::SessionError,
    models::profile::{
        ProfileQuery, ProfileResponse, ProfileWriteResponse, RegisterUserRequest, SearchTeachersQuery,
        TeacherSearchResponse, UpdateLearnerProfileRequest, UpdateTeacherProfileRequest, UserType,
    },
};
use skillsession_db::repositories::profile;
use tracing::info;

use crate::{ApiState, middleware::error_handling::AppError};

fn email_from_path(email: &str) -> Result<&str, AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(SessionError::validation("Email is required").into());
    }
    Ok(email)
}

#[axum::debug_handler]
pub async fn register_user(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProfileWriteResponse>), AppError> {
    let Json(payload) = payload?;
    let registration = payload.validate()?;
    let store = state.store.as_ref();

    if let Some(learner) = &registration.learner {
        profile::put_learner(store, &state.tables.learners, learner)
            .await
            .map_err(SessionError::Storage)?;
    }
    if let Some(teacher) = &registration.teacher {
        profile::put_teacher(store, &state.tables.teachers, teacher)
            .await
            .map_err(SessionError::Storage)?;
    }

    info!("Registered {} profile(s)", registration.user_type);

    let response = ProfileWriteResponse {
        success: true,
        message: "User registered successfully".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn update_learner_profile(
    State(state): State<Arc<ApiState>>,
    Path(email): Path<String>,
    payload: Result<Json<UpdateLearnerProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileWriteResponse>, AppError> {
    let email = email_from_path(&email)?;
    let Json(payload) = payload?;
    let changes = payload.validate()?;

    let updated = profile::update_learner(state.store.as_ref(), &state.tables.learners, email, &changes)
        .await
        .map_err(SessionError::Storage)?;
    if !updated {
        return Err(SessionError::NotFound("Learner profile not found".to_string()).into());
    }

    Ok(Json(ProfileWriteResponse {
        success: true,
        message: "Learner profile updated successfully".to_string(),
    }))
}

#[axum::debug_handler]
pub async fn update_teacher_profile(
    State(state): State<Arc<ApiState>>,
    Path(email): Path<String>,
    payload: Result<Json<UpdateTeacherProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileWriteResponse>, AppError> {
    let email = email_from_path(&email)?;
    let Json(payload) = payload?;
    let changes = payload.validate()?;

    let updated = profile::update_teacher(state.store.as_ref(), &state.tables.teachers, email, &changes)
        .await
        .map_err(SessionError::Storage)?;
    if !updated {
        return Err(SessionError::NotFound("Teacher profile not found".to_string()).into());
    }

    Ok(Json(ProfileWriteResponse {
        success: true,
        message: "Teacher profile updated successfully".to_string(),
    }))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<ApiState>>,
    Path(email): Path<String>,
    query: Result<Query<ProfileQuery>, QueryRejection>,
) -> Result<Json<ProfileResponse>, AppError> {
    let email = email_from_path(&email)?;
    let Query(query) = query?;
    let user_type = query.user_type()?;
    let store = state.store.as_ref();

    let learner = if user_type.is_learner() {
        profile::get_learner(store, &state.tables.learners, email)
            .await
            .map_err(SessionError::Storage)?
    } else {
        None
    };
    let teacher = if user_type.is_teacher() {
        profile::get_teacher(store, &state.tables.teachers, email)
            .await
            .map_err(SessionError::Storage)?
    } else {
        None
    };

    let missing = match user_type {
        UserType::Learner => learner.is_none().then_some("Learner profile not found"),
        UserType::Teacher => teacher.is_none().then_some("Teacher profile not found"),
        UserType::Both => (learner.is_none() && teacher.is_none()).then_some("User profile not found"),
    };
    if let Some(message) = missing {
        return Err(SessionError::NotFound(message.to_string()).into());
    }

    Ok(Json(ProfileResponse::merge(learner, teacher)))
}

/// Teachers with any of the requested skills; every teacher when none are given.
#[axum::debug_handler]
pub async fn search_teachers(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<SearchTeachersQuery>, QueryRejection>,
) -> Result<Json<TeacherSearchResponse>, AppError> {
    let Query(query) = query?;
    let skills = query.skills();

    let teachers = profile::search_teachers(state.store.as_ref(), &state.tables.teachers, &skills)
        .await
        .map_err(SessionError::Storage)?;

    Ok(Json(TeacherSearchResponse { teachers }))
}
