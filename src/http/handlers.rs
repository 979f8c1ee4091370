use crate::core::error::CoursekitError;
use crate::http::auth::AuthUser;
use crate::http::{blocking, AppState};
use crate::plugins::course::{CourseUpdate, NewCourse};
use crate::plugins::progress::{CompletionInput, ResultsInput};
use crate::plugins::quiz::Quiz;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

type ApiResult<T> = Result<T, CoursekitError>;

pub async fn health() -> &'static str {
    "OK"
}

pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let courses = state.courses;
    let list = blocking(move || courses.list()).await?;
    Ok(Json(json!({ "data": list })))
}

pub async fn create_course(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let course = NewCourse::from_request(&body)?;
    let courses = state.courses;
    let created = blocking(move || courses.create(course)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": created }))))
}

pub async fn show_course(
    State(state): State<AppState>,
    Path(course): Path<String>,
) -> ApiResult<Json<Value>> {
    let courses = state.courses;
    let doc = blocking(move || courses.get(&course)).await?;
    Ok(Json(json!({ "data": doc })))
}

pub async fn update_course(
    State(state): State<AppState>,
    Path(course): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let update = CourseUpdate::from_request(&body)?;
    let courses = state.courses;
    let doc = blocking(move || courses.update(&course, update)).await?;
    Ok(Json(json!({ "data": doc })))
}

pub async fn destroy_course(
    State(state): State<AppState>,
    Path(course): Path<String>,
) -> ApiResult<Json<Value>> {
    let courses = state.courses;
    blocking(move || courses.delete(&course)).await?;
    Ok(Json(json!({ "deleted": true })))
}

pub async fn show_quiz(
    State(state): State<AppState>,
    Path((course, chapter)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let quizzes = state.quizzes;
    let doc = blocking(move || quizzes.get(&course, &chapter)).await?;
    Ok(Json(json!({ "data": doc })))
}

pub async fn upsert_quiz(
    State(state): State<AppState>,
    Path((course, chapter)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let quiz = Quiz::from_request(&body)?;
    let quizzes = state.quizzes;
    let doc = blocking(move || quizzes.upsert(&course, &chapter, &quiz)).await?;
    Ok(Json(json!({ "data": doc })))
}

pub async fn destroy_quiz(
    State(state): State<AppState>,
    Path((course, chapter)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let quizzes = state.quizzes;
    blocking(move || quizzes.delete(&course, &chapter)).await?;
    Ok(Json(json!({ "deleted": true })))
}

pub async fn record_completion(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let input = CompletionInput::from_request(&body)?;
    let progress = state.progress;
    let saved = blocking(move || progress.record_completion(&user, &input)).await?;
    Ok(Json(json!({ "data": saved })))
}

pub async fn record_results(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let input = ResultsInput::from_request(&body)?;
    let progress = state.progress;
    let saved = blocking(move || progress.record_results(&user, &input)).await?;
    Ok(Json(json!({ "data": saved })))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let AppState {
        courses, progress, ..
    } = state;
    let rows = blocking(move || progress.dashboard(&user, &courses)).await?;
    Ok(Json(json!({ "courses": rows })))
}
