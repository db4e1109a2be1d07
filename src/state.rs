use crate::error::AppError;
use crate::sensor::{FieldUpdate, SensorReading};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::watch;

/// Maximum number of past assessments retained, oldest dropped first.
pub const HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// The risk verdict produced for one reading, kept as a unit for display
/// correlation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub timestamp: SystemTime,
    pub reading: SensorReading,
}

/// Broadcast whenever a stored assessment is not LOW; consumed by the
/// audio/visual alert layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertSignal {
    pub risk_level: RiskLevel,
    pub timestamp: SystemTime,
}

#[derive(Debug)]
pub struct AppState {
    reading: SensorReading,
    reading_tx: watch::Sender<SensorReading>,
    // Each channel keeps its initial receiver so broadcasts succeed before
    // any client subscribes.
    reading_rx: watch::Receiver<SensorReading>,
    assessment: Option<Assessment>,
    assessment_tx: watch::Sender<Option<Assessment>>,
    assessment_rx: watch::Receiver<Option<Assessment>>,
    history: Vec<Assessment>,
    history_tx: watch::Sender<Vec<Assessment>>,
    history_rx: watch::Receiver<Vec<Assessment>>,
    analyzing: bool,
    analyzing_tx: watch::Sender<bool>,
    analyzing_rx: watch::Receiver<bool>,
    alert_tx: watch::Sender<Option<AlertSignal>>,
    alert_rx: watch::Receiver<Option<AlertSignal>>,
}

impl AppState {
    pub fn new() -> Self {
        let reading = SensorReading::default();
        let (reading_tx, reading_rx) = watch::channel(reading);
        let (assessment_tx, assessment_rx) = watch::channel(None);
        let (history_tx, history_rx) = watch::channel(Vec::new());
        let (analyzing_tx, analyzing_rx) = watch::channel(false);
        let (alert_tx, alert_rx) = watch::channel(None);
        Self {
            reading,
            reading_tx,
            reading_rx,
            assessment: None,
            assessment_tx,
            assessment_rx,
            history: Vec::new(),
            history_tx,
            history_rx,
            analyzing: false,
            analyzing_tx,
            analyzing_rx,
            alert_tx,
            alert_rx,
        }
    }

    pub fn reading(&self) -> SensorReading {
        self.reading
    }

    pub fn subscribe_reading(&self) -> watch::Receiver<SensorReading> {
        self.reading_rx.clone()
    }

    pub fn set_reading(&mut self, reading: SensorReading) -> Result<(), AppError> {
        self.reading = reading;
        self.reading_tx
            .send(reading)
            .map_err(|_| AppError::WatchSend)
    }

    /// Apply a single-channel edit and return the resulting reading. No
    /// validation on this path.
    pub fn update_field(&mut self, update: FieldUpdate) -> Result<SensorReading, AppError> {
        let next = self.reading.with_field(update);
        self.set_reading(next)?;
        Ok(next)
    }

    pub fn assessment(&self) -> Option<&Assessment> {
        self.assessment.as_ref()
    }

    pub fn subscribe_assessment(&self) -> watch::Receiver<Option<Assessment>> {
        self.assessment_rx.clone()
    }

    /// Newest-first log of past assessments.
    pub fn history(&self) -> &[Assessment] {
        &self.history
    }

    pub fn subscribe_history(&self) -> watch::Receiver<Vec<Assessment>> {
        self.history_rx.clone()
    }

    /// Store a completed assessment: replaces the current one, prepends to
    /// history (truncating to capacity), and signals the alert channel when
    /// the level is not LOW.
    pub fn record_assessment(&mut self, assessment: Assessment) -> Result<(), AppError> {
        self.assessment = Some(assessment.clone());
        self.assessment_tx
            .send(Some(assessment.clone()))
            .map_err(|_| AppError::WatchSend)?;

        self.history.insert(0, assessment.clone());
        self.history.truncate(HISTORY_CAPACITY);
        self.history_tx
            .send(self.history.clone())
            .map_err(|_| AppError::WatchSend)?;

        if assessment.risk_level != RiskLevel::Low {
            self.alert_tx
                .send(Some(AlertSignal {
                    risk_level: assessment.risk_level,
                    timestamp: assessment.timestamp,
                }))
                .map_err(|_| AppError::WatchSend)?;
        }
        Ok(())
    }

    pub fn analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn subscribe_analyzing(&self) -> watch::Receiver<bool> {
        self.analyzing_rx.clone()
    }

    pub fn set_analyzing(&mut self, analyzing: bool) -> Result<(), AppError> {
        self.analyzing = analyzing;
        self.analyzing_tx
            .send(analyzing)
            .map_err(|_| AppError::WatchSend)
    }

    pub fn subscribe_alert(&self) -> watch::Receiver<Option<AlertSignal>> {
        self.alert_rx.clone()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
