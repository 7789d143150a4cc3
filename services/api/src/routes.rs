//! API service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::error;

use common::backend::BackendConfig;
use common::error::RecordResult;
use common::models::Identity;
use common::session::Session;

use crate::{
    error::ApiResult,
    middleware::auth_middleware,
    models::{DashboardResponse, MealPlanView, MeasurementSummary, MeasurementsResponse, Section},
    repositories::Category,
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/goals", get(goals))
        .route("/measurements", get(measurements))
        .route("/calculations", get(calculations))
        .route("/workouts", get(workouts))
        .route("/meal-plans", get(meal_plans))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.sessions.health_check().await.unwrap_or(false);

    Json(json!({
        "status": "ok",
        "service": "api-service",
        "store": store,
    }))
}

/// Turn a category load into a section, logging the failure
fn section<T>(category: Category, student: &Identity, result: RecordResult<Vec<T>>) -> Section<T> {
    match result {
        Ok(items) => Section::loaded(items),
        Err(e) => {
            error!("Failed to load {} for student {}: {}", category, student.id, e);
            Section::unavailable(category.label())
        }
    }
}

fn measurements_response(
    student: &Identity,
    result: RecordResult<Vec<common::models::Measurement>>,
) -> MeasurementsResponse {
    let section = section(Category::Measurements, student, result);
    let summary = MeasurementSummary::new(&section.items, student);
    MeasurementsResponse { section, summary }
}

async fn backend(state: &AppState) -> ApiResult<BackendConfig> {
    Ok(state.effective_backend().await?)
}

/// Every category of the student, loaded concurrently
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<DashboardResponse>> {
    let config = backend(&state).await?;
    let student = &session.identity;
    let repo = &state.repository;

    let (goals, measurements, calculations, workouts, meal_plans) = tokio::join!(
        repo.goals(&config, student),
        repo.measurements(&config, student),
        repo.calculations(&config, student),
        repo.workouts(&config, student),
        repo.meal_plans(&config, student),
    );

    Ok(Json(DashboardResponse {
        goals: section(Category::Goals, student, goals),
        measurements: measurements_response(student, measurements),
        calculations: section(Category::Calculations, student, calculations),
        workouts: section(Category::Workouts, student, workouts),
        meal_plans: section(Category::MealPlans, student, meal_plans).map(MealPlanView::from),
        student: session.identity.clone(),
    }))
}

pub async fn goals(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<impl IntoResponse> {
    let config = backend(&state).await?;
    let student = &session.identity;
    let result = state.repository.goals(&config, student).await;
    Ok(Json(section(Category::Goals, student, result)))
}

pub async fn measurements(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<impl IntoResponse> {
    let config = backend(&state).await?;
    let student = &session.identity;
    let result = state.repository.measurements(&config, student).await;
    Ok(Json(measurements_response(student, result)))
}

pub async fn calculations(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<impl IntoResponse> {
    let config = backend(&state).await?;
    let student = &session.identity;
    let result = state.repository.calculations(&config, student).await;
    Ok(Json(section(Category::Calculations, student, result)))
}

pub async fn workouts(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<impl IntoResponse> {
    let config = backend(&state).await?;
    let student = &session.identity;
    let result = state.repository.workouts(&config, student).await;
    Ok(Json(section(Category::Workouts, student, result)))
}

pub async fn meal_plans(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<impl IntoResponse> {
    let config = backend(&state).await?;
    let student = &session.identity;
    let result = state.repository.meal_plans(&config, student).await;
    Ok(Json(
        section(Category::MealPlans, student, result).map(MealPlanView::from),
    ))
}
