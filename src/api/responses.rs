use crate::sensor::SensorReading;
use crate::state::RiskLevel;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AssessmentBody {
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub timestamp: String,
    pub reading: SensorReading,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AssessmentErrorResponse {
    pub error_code: AssessmentErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentErrorCode {
    NoData,
    InternalError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HistorySuccessResponse {
    pub assessments: Vec<AssessmentBody>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReadingSuccessResponse {
    pub reading: SensorReading,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusSuccessResponse {
    pub analyzing: bool,
    pub simulation_running: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SimulationSuccessResponse {
    pub running: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TriggerErrorResponse {
    pub error_code: TriggerErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerErrorCode {
    ClassifierError,
    InternalError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InternalErrorResponse {
    pub error_code: InternalErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternalErrorCode {
    InternalError,
}
