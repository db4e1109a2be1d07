use margin_watch::assessment::{assess, assess_current};
use margin_watch::classifier::mock::{MockClassifier, MockOutcome};
use margin_watch::error::AppError;
use margin_watch::sensor::{DrivingMode, FieldUpdate, SensorReading};
use margin_watch::state::{AppState, RiskLevel};
use std::sync::{Arc, RwLock};

#[test]
fn initial_reading_yields_low_assessment_with_history_of_one() -> Result<(), AppError> {
    let classifier = MockClassifier::new(vec![MockOutcome::verdict(RiskLevel::Low, "clear")]);
    let state = Arc::new(RwLock::new(AppState::new()));

    let assessment = assess_current(&state, &classifier)?;

    assert_eq!(assessment.risk_level, RiskLevel::Low);
    assert_eq!(assessment.explanation, "clear");
    assert_eq!(assessment.reading, SensorReading::default());
    assert_eq!(assessment.reading.left_clearance_cm, 120.0);
    assert_eq!(assessment.reading.right_clearance_cm, 115.0);
    assert_eq!(assessment.reading.closing_speed_mps, 0.5);
    assert_eq!(assessment.reading.vehicle_speed_kmh, 45.0);
    assert_eq!(assessment.reading.driving_mode, DrivingMode::Traffic);

    let guard = state.read().map_err(|_| AppError::StateLock)?;
    assert_eq!(
        guard.assessment().map(|a| a.risk_level),
        Some(RiskLevel::Low)
    );
    assert_eq!(guard.history().len(), 1);
    assert!(!guard.analyzing());
    Ok(())
}

#[test]
fn engine_failure_preserves_prior_assessment_and_later_calls_recover() -> Result<(), AppError> {
    let classifier = MockClassifier::new(vec![
        MockOutcome::verdict(RiskLevel::Low, "clear"),
        MockOutcome::transport_failure("connection refused"),
        MockOutcome::verdict(RiskLevel::Medium, "gap narrowing"),
    ]);
    let state = Arc::new(RwLock::new(AppState::new()));
    let alert_rx = {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        guard.subscribe_alert()
    };

    let first = assess_current(&state, &classifier)?;
    assert_eq!(first.risk_level, RiskLevel::Low);

    let failed = assess_current(&state, &classifier);
    assert!(matches!(failed, Err(AppError::Classifier(_))));
    {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert_eq!(guard.assessment(), Some(&first));
        assert_eq!(guard.history(), &[first.clone()]);
        assert!(!guard.analyzing());
        assert!(alert_rx.borrow().is_none());
    }

    let recovered = assess_current(&state, &classifier)?;
    assert_eq!(recovered.risk_level, RiskLevel::Medium);

    let guard = state.read().map_err(|_| AppError::StateLock)?;
    assert_eq!(guard.history().len(), 2);
    assert_eq!(guard.history()[0], recovered);
    assert_eq!(guard.history()[1], first);
    let alert = alert_rx.borrow().expect("alert for non-low verdict");
    assert_eq!(alert.risk_level, RiskLevel::Medium);
    Ok(())
}

#[test]
fn operator_edit_flows_into_next_assessment() -> Result<(), AppError> {
    let classifier = MockClassifier::new(vec![MockOutcome::verdict(
        RiskLevel::High,
        "left side critical",
    )]);
    let state = Arc::new(RwLock::new(AppState::new()));

    let edited = {
        let mut guard = state.write().map_err(|_| AppError::StateLock)?;
        guard.update_field(FieldUpdate::LeftClearanceCm(18.0))?
    };
    assert_eq!(edited.left_clearance_cm, 18.0);

    let assessment = assess(&state, &classifier, edited)?;

    assert_eq!(assessment.risk_level, RiskLevel::High);
    assert_eq!(assessment.reading.left_clearance_cm, 18.0);
    assert_eq!(assessment.reading.right_clearance_cm, 115.0);
    Ok(())
}
