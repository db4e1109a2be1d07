use crate::classifier::{Classifier, ClassifyError, RiskVerdict};
use crate::sensor::SensorReading;
use crate::state::RiskLevel;
use std::sync::Mutex;

/// One scripted engine response.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Verdict(RiskVerdict),
    TransportFailure(String),
}

impl MockOutcome {
    pub fn verdict(risk_level: RiskLevel, explanation: impl Into<String>) -> Self {
        Self::Verdict(RiskVerdict {
            risk_level,
            explanation: explanation.into(),
        })
    }

    pub fn transport_failure(reason: impl Into<String>) -> Self {
        Self::TransportFailure(reason.into())
    }
}

/// Scripted classification engine for tests: plays its outcomes in order and
/// keeps returning a LOW verdict once the script is exhausted.
#[derive(Debug)]
pub struct MockClassifier {
    outcomes: Vec<MockOutcome>,
    next_index: Mutex<usize>,
}

impl MockClassifier {
    pub fn new(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            outcomes,
            next_index: Mutex::new(0),
        }
    }

    pub fn always_low(explanation: &str) -> Self {
        Self::new(vec![MockOutcome::verdict(RiskLevel::Low, explanation)])
    }

    fn next_outcome(&self) -> MockOutcome {
        let mut index = self
            .next_index
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let outcome = self
            .outcomes
            .get(*index)
            .cloned()
            .unwrap_or_else(|| MockOutcome::verdict(RiskLevel::Low, "all clear"));
        *index += 1;
        outcome
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, _reading: &SensorReading) -> Result<RiskVerdict, ClassifyError> {
        match self.next_outcome() {
            MockOutcome::Verdict(verdict) => Ok(verdict),
            MockOutcome::TransportFailure(reason) => Err(ClassifyError::Unavailable(reason)),
        }
    }
}
