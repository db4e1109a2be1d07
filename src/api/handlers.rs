use crate::api::ApiContext;
use crate::api::responses::{
    AssessmentBody, AssessmentErrorCode, AssessmentErrorResponse, HistorySuccessResponse,
    InternalErrorCode, InternalErrorResponse, ReadingSuccessResponse, SimulationSuccessResponse,
    StatusSuccessResponse, TriggerErrorCode, TriggerErrorResponse,
};
use crate::assessment;
use crate::error::AppError;
use crate::sensor::FieldUpdate;
use crate::state::{AppState, Assessment};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::error;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

fn format_timestamp(timestamp: SystemTime) -> Result<String, time::error::Format> {
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    OffsetDateTime::from(timestamp).format(&Rfc3339)
}

fn timestamp_or_epoch(timestamp: SystemTime) -> String {
    format_timestamp(timestamp).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format response timestamp");
        "1970-01-01T00:00:00Z".to_string()
    })
}

fn assessment_body(assessment: &Assessment) -> AssessmentBody {
    AssessmentBody {
        risk_level: assessment.risk_level,
        explanation: assessment.explanation.clone(),
        timestamp: timestamp_or_epoch(assessment.timestamp),
        reading: assessment.reading,
    }
}

fn internal_error_body() -> InternalErrorResponse {
    InternalErrorResponse {
        error_code: InternalErrorCode::InternalError,
        error_message: INTERNAL_ERROR_MESSAGE.to_string(),
        timestamp: timestamp_or_epoch(SystemTime::now()),
    }
}

// --- GET /api/assessment ---

pub enum AssessmentResponse {
    Success(AssessmentBody),
    Error {
        status: StatusCode,
        body: AssessmentErrorResponse,
    },
}

impl IntoResponse for AssessmentResponse {
    fn into_response(self) -> Response {
        match self {
            AssessmentResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            AssessmentResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_assessment(State(ctx): State<ApiContext>) -> impl IntoResponse {
    build_assessment_response(&ctx.state)
}

fn build_assessment_response(state: &Arc<RwLock<AppState>>) -> AssessmentResponse {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return assessment_internal_error("state lock poisoned while reading assessment");
        }
    };
    let assessment = guard.assessment().cloned();
    drop(guard);

    match assessment {
        Some(assessment) => AssessmentResponse::Success(assessment_body(&assessment)),
        None => AssessmentResponse::Error {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: AssessmentErrorResponse {
                error_code: AssessmentErrorCode::NoData,
                error_message: "No assessment available yet".to_string(),
                timestamp: timestamp_or_epoch(SystemTime::now()),
            },
        },
    }
}

fn assessment_internal_error(message: &str) -> AssessmentResponse {
    error!(
        message = message,
        "Internal error while handling /api/assessment"
    );
    AssessmentResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: AssessmentErrorResponse {
            error_code: AssessmentErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: timestamp_or_epoch(SystemTime::now()),
        },
    }
}

// --- GET /api/history ---

pub enum HistoryResponse {
    Success(HistorySuccessResponse),
    Error {
        status: StatusCode,
        body: InternalErrorResponse,
    },
}

impl IntoResponse for HistoryResponse {
    fn into_response(self) -> Response {
        match self {
            HistoryResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            HistoryResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_history(State(ctx): State<ApiContext>) -> impl IntoResponse {
    build_history_response(&ctx.state)
}

fn build_history_response(state: &Arc<RwLock<AppState>>) -> HistoryResponse {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return history_internal_error("state lock poisoned while reading history");
        }
    };
    let assessments = guard.history().iter().map(assessment_body).collect();
    drop(guard);

    HistoryResponse::Success(HistorySuccessResponse {
        assessments,
        timestamp: timestamp_or_epoch(SystemTime::now()),
    })
}

fn history_internal_error(message: &str) -> HistoryResponse {
    error!(
        message = message,
        "Internal error while handling /api/history"
    );
    HistoryResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: internal_error_body(),
    }
}

// --- GET & PATCH /api/reading ---

pub enum ReadingResponse {
    Success(ReadingSuccessResponse),
    Error {
        status: StatusCode,
        body: InternalErrorResponse,
    },
}

impl IntoResponse for ReadingResponse {
    fn into_response(self) -> Response {
        match self {
            ReadingResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ReadingResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_reading(State(ctx): State<ApiContext>) -> impl IntoResponse {
    let guard = match ctx.state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return reading_internal_error("state lock poisoned while reading sensor state");
        }
    };
    let reading = guard.reading();
    drop(guard);

    ReadingResponse::Success(ReadingSuccessResponse {
        reading,
        timestamp: timestamp_or_epoch(SystemTime::now()),
    })
}

pub async fn patch_reading(
    State(ctx): State<ApiContext>,
    Json(update): Json<FieldUpdate>,
) -> impl IntoResponse {
    // Operator edits are trusted as-is; no clamp on this path.
    let mut guard = match ctx.state.write() {
        Ok(guard) => guard,
        Err(_) => {
            return reading_internal_error("state lock poisoned while updating sensor state");
        }
    };
    let reading = match guard.update_field(update) {
        Ok(reading) => reading,
        Err(err) => {
            drop(guard);
            return reading_internal_error(&format!("field update failed: {err}"));
        }
    };
    drop(guard);

    ReadingResponse::Success(ReadingSuccessResponse {
        reading,
        timestamp: timestamp_or_epoch(SystemTime::now()),
    })
}

fn reading_internal_error(message: &str) -> ReadingResponse {
    error!(
        message = message,
        "Internal error while handling /api/reading"
    );
    ReadingResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: internal_error_body(),
    }
}

// --- GET /api/status ---

pub enum StatusResponse {
    Success(StatusSuccessResponse),
    Error {
        status: StatusCode,
        body: InternalErrorResponse,
    },
}

impl IntoResponse for StatusResponse {
    fn into_response(self) -> Response {
        match self {
            StatusResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            StatusResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_status(State(ctx): State<ApiContext>) -> impl IntoResponse {
    let analyzing = match ctx.state.read() {
        Ok(guard) => guard.analyzing(),
        Err(_) => {
            return status_internal_error("state lock poisoned while reading analyzing flag");
        }
    };
    let simulation_running = match ctx.driver.lock() {
        Ok(driver) => driver.is_running(),
        Err(_) => {
            return status_internal_error("driver lock poisoned while reading run state");
        }
    };

    StatusResponse::Success(StatusSuccessResponse {
        analyzing,
        simulation_running,
        timestamp: timestamp_or_epoch(SystemTime::now()),
    })
}

fn status_internal_error(message: &str) -> StatusResponse {
    error!(
        message = message,
        "Internal error while handling /api/status"
    );
    StatusResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: internal_error_body(),
    }
}

// --- POST /api/assess ---

pub enum TriggerResponse {
    Success(AssessmentBody),
    Error {
        status: StatusCode,
        body: TriggerErrorResponse,
    },
}

impl IntoResponse for TriggerResponse {
    fn into_response(self) -> Response {
        match self {
            TriggerResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            TriggerResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn post_assess(State(ctx): State<ApiContext>) -> impl IntoResponse {
    let state = Arc::clone(&ctx.state);
    let classifier = Arc::clone(&ctx.classifier);
    let result =
        tokio::task::spawn_blocking(move || assessment::assess_current(&state, classifier.as_ref()))
            .await;

    match result {
        Ok(Ok(assessment)) => TriggerResponse::Success(assessment_body(&assessment)),
        Ok(Err(AppError::Classifier(err))) => TriggerResponse::Error {
            status: StatusCode::BAD_GATEWAY,
            body: TriggerErrorResponse {
                error_code: TriggerErrorCode::ClassifierError,
                error_message: err.to_string(),
                timestamp: timestamp_or_epoch(SystemTime::now()),
            },
        },
        Ok(Err(err)) => trigger_internal_error(&format!("assessment failed: {err}")),
        Err(err) => trigger_internal_error(&format!("assessment task join failed: {err}")),
    }
}

fn trigger_internal_error(message: &str) -> TriggerResponse {
    error!(
        message = message,
        "Internal error while handling /api/assess"
    );
    TriggerResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: TriggerErrorResponse {
            error_code: TriggerErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: timestamp_or_epoch(SystemTime::now()),
        },
    }
}

// --- POST /api/simulation ---

#[derive(Debug, Deserialize)]
pub struct SimulationToggleRequest {
    pub enabled: bool,
}

pub enum SimulationResponse {
    Success(SimulationSuccessResponse),
    Error {
        status: StatusCode,
        body: InternalErrorResponse,
    },
}

impl IntoResponse for SimulationResponse {
    fn into_response(self) -> Response {
        match self {
            SimulationResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            SimulationResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn post_simulation(
    State(ctx): State<ApiContext>,
    Json(request): Json<SimulationToggleRequest>,
) -> impl IntoResponse {
    let mut driver = match ctx.driver.lock() {
        Ok(driver) => driver,
        Err(_) => {
            return simulation_internal_error("driver lock poisoned while toggling simulation");
        }
    };
    if request.enabled {
        driver.start();
    } else {
        driver.stop();
    }
    let running = driver.is_running();
    drop(driver);

    SimulationResponse::Success(SimulationSuccessResponse {
        running,
        timestamp: timestamp_or_epoch(SystemTime::now()),
    })
}

fn simulation_internal_error(message: &str) -> SimulationResponse {
    error!(
        message = message,
        "Internal error while handling /api/simulation"
    );
    SimulationResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: internal_error_body(),
    }
}
