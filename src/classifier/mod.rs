use crate::sensor::SensorReading;
use crate::state::RiskLevel;
use std::fmt;
use thiserror::Error;

pub mod mock;
pub mod remote;

/// Verdict produced by a classification engine for a single reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskVerdict {
    pub risk_level: RiskLevel,
    pub explanation: String,
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("dns error: {0}")]
    Dns(String),
    #[error("connect error: {0}")]
    Connect(std::io::Error),
    #[error("io error: {0}")]
    Io(std::io::Error),
    #[error("http status {0} ({1})")]
    Http(u16, String),
    #[error("json error: {0}")]
    Json(serde_json::Error),
    #[error("timestamp error: {0}")]
    Timestamp(time::error::Format),
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

/// A classification engine mapping a sensor reading to a risk verdict.
///
/// The engine is the only party that reasons about risk; this crate treats it
/// as an opaque, fallible collaborator. Implementations are injected into the
/// orchestrator so the request cycle can be exercised against a deterministic
/// stub.
pub trait Classifier: Send + Sync + fmt::Debug {
    fn classify(&self, reading: &SensorReading) -> Result<RiskVerdict, ClassifyError>;
}
