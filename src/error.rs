use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenefitsError {
    #[error("No monthly budget configuration found for service month {0}")]
    MissingMonthlyConfig(NaiveDate),

    #[error("Cannot aggregate a C&E summary over zero months")]
    EmptyAggregation,

    #[error("Ingestion error on row {row}: {details}")]
    Ingestion { row: usize, details: String },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BenefitsError>;
