//! Static catalog of error codes exposed by the API.
use axum::http::StatusCode;

use crate::api::problem::ErrorBody;

/// Static error definition from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: u16,
    pub code: &'static str,
    /// Message used when the call site has nothing more specific to say.
    pub message: &'static str,
}

impl ErrDef {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Convert this definition into an error body with the given message.
    #[inline]
    pub fn to_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody::new(self.code, message)
    }

    #[inline]
    pub fn to_default_body(&self) -> ErrorBody {
        self.to_body(self.message)
    }
}

pub const INVALID_QUERY_PARAM: ErrDef = ErrDef {
    status: 400,
    code: "INVALID_QUERY_PARAM",
    message: "Invalid query parameter.",
};

pub const INVALID_TIME_WINDOW: ErrDef = ErrDef {
    status: 400,
    code: "INVALID_TIME_WINDOW",
    message: "start_ts must be less than or equal to end_ts.",
};

pub const BAD_REQUEST: ErrDef = ErrDef {
    status: 400,
    code: "BAD_REQUEST",
    message: "The request could not be processed.",
};

pub const ZONE_NOT_FOUND: ErrDef = ErrDef {
    status: 404,
    code: "ZONE_NOT_FOUND",
    message: "Zone not found.",
};

pub const RUN_NOT_FOUND: ErrDef = ErrDef {
    status: 404,
    code: "RUN_NOT_FOUND",
    message: "Run not found.",
};

pub const NOT_FOUND: ErrDef = ErrDef {
    status: 404,
    code: "NOT_FOUND",
    message: "Resource not found.",
};

pub const METHOD_NOT_ALLOWED: ErrDef = ErrDef {
    status: 405,
    code: "METHOD_NOT_ALLOWED",
    message: "Method not allowed for this resource.",
};

pub const REQUEST_TIMEOUT: ErrDef = ErrDef {
    status: 408,
    code: "REQUEST_TIMEOUT",
    message: "The request took too long to complete.",
};

pub const PAYLOAD_TOO_LARGE: ErrDef = ErrDef {
    status: 413,
    code: "PAYLOAD_TOO_LARGE",
    message: "Request body exceeds the configured limit.",
};

pub const INTERNAL_SERVER_ERROR: ErrDef = ErrDef {
    status: 500,
    code: "INTERNAL_SERVER_ERROR",
    message: "The server encountered an unexpected error.",
};

/// Every catalog entry, in a stable order.
pub const ALL: &[ErrDef] = &[
    INVALID_QUERY_PARAM,
    INVALID_TIME_WINDOW,
    BAD_REQUEST,
    ZONE_NOT_FOUND,
    RUN_NOT_FOUND,
    NOT_FOUND,
    METHOD_NOT_ALLOWED,
    REQUEST_TIMEOUT,
    PAYLOAD_TOO_LARGE,
    INTERNAL_SERVER_ERROR,
];

/// Pick the catalog entry used for a bare framework response with `status`.
pub fn for_status(status: StatusCode) -> &'static ErrDef {
    match status {
        StatusCode::NOT_FOUND => &NOT_FOUND,
        StatusCode::METHOD_NOT_ALLOWED => &METHOD_NOT_ALLOWED,
        StatusCode::REQUEST_TIMEOUT => &REQUEST_TIMEOUT,
        StatusCode::PAYLOAD_TOO_LARGE => &PAYLOAD_TOO_LARGE,
        s if s.is_client_error() => &BAD_REQUEST,
        _ => &INTERNAL_SERVER_ERROR,
    }
}
