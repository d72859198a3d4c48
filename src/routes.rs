use axum::Json;
use axum::extract::Path;
use axum::routing::{patch, post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::error;

use crate::error::AppError;
use crate::identity::User;
use crate::models::*;
use crate::services::{Insight, LoadOutcome, Recommendation};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ProgressResponse {
    overall: u8,
    goals: Vec<GoalSummary>,
}

#[derive(Debug, Serialize)]
struct GoalProgressResponse {
    goal_id: String,
    progress: u8,
}

#[derive(Debug, Serialize)]
struct AdviceResponse {
    recommendation: Recommendation,
    message: &'static str,
    insight: Insight,
    insight_message: &'static str,
}

#[derive(Debug, Serialize)]
struct ConnectivityResponse {
    online: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session", put(sign_in).delete(sign_out))
        .route("/goals", get(list_goals).post(create_goal))
        .route("/goals/{id}/tasks", post(create_task))
        .route("/goals/{id}/tasks/{task_id}/toggle", patch(toggle_task))
        .route("/goals/{id}/progress", get(goal_progress))
        .route("/progress", get(progress))
        .route("/stats", get(stats))
        .route("/recommendation", get(recommendation))
        .route("/connectivity", get(connectivity))
        .route("/reload", post(reload))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("select 1").execute(&state.db).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            error!("health check failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn sign_in(State(state): State<AppState>, Json(user): Json<User>) -> Result<StatusCode, AppError> {
    if user.uid.trim().is_empty() {
        return Err(AppError::BadRequest("uid must not be empty".to_string()));
    }
    state.session.sign_in(user);
    Ok(StatusCode::ACCEPTED)
}

async fn sign_out(State(state): State<AppState>) -> StatusCode {
    state.session.sign_out();
    StatusCode::NO_CONTENT
}

/// Mutations need a user and a connection.
fn ensure_writable(state: &AppState) -> Result<(), AppError> {
    if state.session.current_uid().is_none() {
        return Err(AppError::Unauthenticated);
    }
    if !state.network.is_online() {
        return Err(AppError::Offline);
    }
    Ok(())
}

async fn list_goals(State(state): State<AppState>) -> Json<Vec<Goal>> {
    Json(state.store.goals())
}

async fn create_goal(
    State(state): State<AppState>,
    Json(req): Json<NewGoalRequest>
) -> Result<(StatusCode, Json<Vec<Goal>>), AppError> {
    ensure_writable(&state)?;
    state.store.add_goal(&req.name).await?;
    Ok((StatusCode::CREATED, Json(state.store.goals())))
}

async fn create_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewTaskRequest>
) -> Result<(StatusCode, Json<Goal>), AppError> {
    ensure_writable(&state)?;
    state.store.add_task(&id, &req.title).await?;
    let goal = state.store.goal(&id).ok_or(AppError::NotFound)?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn toggle_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(String, String)>
) -> Result<Json<Goal>, AppError> {
    ensure_writable(&state)?;
    state.store.toggle_task(&id, &task_id).await?;
    let goal = state.store.goal(&id).ok_or(AppError::NotFound)?;
    Ok(Json(goal))
}

async fn goal_progress(
    State(state): State<AppState>,
    Path(id): Path<String>
) -> Result<Json<GoalProgressResponse>, AppError> {
    let goal = state.store.goal(&id).ok_or(AppError::NotFound)?;
    Ok(Json(GoalProgressResponse {
        goal_id: goal.id.clone(),
        progress: goal.progress(),
    }))
}

async fn progress(State(state): State<AppState>) -> Json<ProgressResponse> {
    Json(ProgressResponse {
        overall: state.store.overall_progress(),
        goals: state.store.goal_summaries(),
    })
}

async fn stats(State(state): State<AppState>) -> Json<GoalStats> {
    Json(state.store.stats())
}

async fn recommendation(State(state): State<AppState>) -> Json<AdviceResponse> {
    let recommendation = state.store.recommendation();
    let insight = state.store.insight();
    Json(AdviceResponse {
        recommendation,
        message: recommendation.message(),
        insight,
        insight_message: insight.message(),
    })
}

async fn connectivity(State(state): State<AppState>) -> Json<ConnectivityResponse> {
    Json(ConnectivityResponse {
        online: state.network.is_online(),
    })
}

async fn reload(State(state): State<AppState>) -> Result<Json<LoadOutcome>, AppError> {
    if state.session.current_uid().is_none() {
        return Err(AppError::Unauthenticated);
    }
    Ok(Json(state.store.load().await))
}
