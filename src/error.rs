use crate::classifier::ClassifyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifyError),
    #[error("watch channel send failed")]
    WatchSend,
    #[error("state lock poisoned")]
    StateLock,
}
