use crate::classifier::Classifier;
use crate::error::AppError;
use crate::sensor::SensorReading;
use crate::state::{AppState, Assessment};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Run one assessment cycle for `reading` against the classification engine.
///
/// The analyzing flag is raised for the duration of the engine call and
/// cleared on both outcomes. A failed call propagates the error and leaves the
/// current assessment and history untouched. Overlapping calls are not
/// blocked; the last one to complete wins.
pub fn assess(
    state: &Arc<RwLock<AppState>>,
    classifier: &dyn Classifier,
    reading: SensorReading,
) -> Result<Assessment, AppError> {
    {
        let mut guard = state.write().map_err(|_| AppError::StateLock)?;
        guard.set_analyzing(true)?;
    }

    // Engine call happens with no lock held.
    let verdict = classifier.classify(&reading);

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    guard.set_analyzing(false)?;

    let verdict = match verdict {
        Ok(verdict) => verdict,
        Err(err) => {
            warn!(error = %err, "Classification call failed");
            return Err(AppError::Classifier(err));
        }
    };

    let assessment = Assessment {
        risk_level: verdict.risk_level,
        explanation: verdict.explanation,
        timestamp: SystemTime::now(),
        reading,
    };
    guard.record_assessment(assessment.clone())?;
    debug!(risk = ?assessment.risk_level, "Assessment stored");

    Ok(assessment)
}

/// Manual trigger: assess whatever reading the state currently holds.
pub fn assess_current(
    state: &Arc<RwLock<AppState>>,
    classifier: &dyn Classifier,
) -> Result<Assessment, AppError> {
    let reading = {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        guard.reading()
    };
    assess(state, classifier, reading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::mock::{MockClassifier, MockOutcome};
    use crate::state::{HISTORY_CAPACITY, RiskLevel};

    #[test]
    fn history_is_bounded_to_capacity_newest_first() -> Result<(), AppError> {
        let outcomes = (1..=25)
            .map(|run| MockOutcome::verdict(RiskLevel::Low, format!("run {run}")))
            .collect();
        let classifier = MockClassifier::new(outcomes);
        let state = Arc::new(RwLock::new(AppState::new()));

        for _ in 0..25 {
            assess_current(&state, &classifier)?;
        }

        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert_eq!(guard.history().len(), HISTORY_CAPACITY);
        assert_eq!(guard.history()[0].explanation, "run 25");
        assert_eq!(guard.history()[HISTORY_CAPACITY - 1].explanation, "run 6");
        Ok(())
    }

    #[test]
    fn failed_call_leaves_state_untouched() -> Result<(), AppError> {
        let classifier = MockClassifier::new(vec![
            MockOutcome::verdict(RiskLevel::Low, "clear"),
            MockOutcome::transport_failure("connection refused"),
        ]);
        let state = Arc::new(RwLock::new(AppState::new()));

        let first = assess_current(&state, &classifier)?;

        let result = assess_current(&state, &classifier);
        assert!(matches!(result, Err(AppError::Classifier(_))));

        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert_eq!(guard.assessment(), Some(&first));
        assert_eq!(guard.history(), &[first]);
        assert!(!guard.analyzing());
        Ok(())
    }

    #[test]
    fn analyzing_flag_is_cleared_after_success() -> Result<(), AppError> {
        let classifier = MockClassifier::always_low("clear");
        let state = Arc::new(RwLock::new(AppState::new()));

        assess_current(&state, &classifier)?;

        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert!(!guard.analyzing());
        Ok(())
    }

    #[test]
    fn non_low_verdict_signals_alert() -> Result<(), AppError> {
        let classifier = MockClassifier::new(vec![MockOutcome::verdict(
            RiskLevel::Medium,
            "closing fast",
        )]);
        let state = Arc::new(RwLock::new(AppState::new()));
        let alert_rx = {
            let guard = state.read().map_err(|_| AppError::StateLock)?;
            guard.subscribe_alert()
        };

        let assessment = assess_current(&state, &classifier)?;

        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        let signal = alert_rx.borrow().expect("alert should be signalled");
        assert_eq!(signal.risk_level, RiskLevel::Medium);
        Ok(())
    }

    #[test]
    fn assess_uses_the_supplied_reading() -> Result<(), AppError> {
        let classifier = MockClassifier::always_low("clear");
        let state = Arc::new(RwLock::new(AppState::new()));
        let mut reading = SensorReading::default();
        reading.left_clearance_cm = 25.0;

        let assessment = assess(&state, &classifier, reading)?;

        assert_eq!(assessment.reading, reading);
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert_eq!(guard.assessment().map(|a| a.reading), Some(reading));
        Ok(())
    }
}
