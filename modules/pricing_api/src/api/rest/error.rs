use apikit::ApiError;

use crate::domain::error::DomainError;

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Query(err) => err.into(),
            DomainError::InvalidParameter { parameter, message } => {
                ApiError::invalid_parameter(parameter, message)
            }
            DomainError::InvalidTimeWindow(message) => ApiError::InvalidTimeWindow(message),
            DomainError::ZoneNotFound(zone_id) => ApiError::ZoneNotFound(zone_id),
            DomainError::RunNotFound(message) => ApiError::RunNotFound(message),
            DomainError::Source(err) => ApiError::Internal(err),
        }
    }
}
