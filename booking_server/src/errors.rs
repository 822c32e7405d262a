use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use booking_engine::{
    AccountApiError,
    CatalogApiError,
    GatewayError,
    OrderFlowError,
    PaymentApiError,
    PaymentGuardError,
};
use log::error;
use serde_json::{json, Value};
use thiserror::Error;

const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred. Please try again later.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PaymentNotAllowed(#[from] PaymentGuardError),
    #[error("The payment gateway rejected the request")]
    GatewayRejection { status: u16, body: String },
    #[error("The payment gateway is unavailable. {0}")]
    GatewayUnavailable(String),
}

impl ServerError {
    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::TokenIssueError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentNotAllowed(_) => StatusCode::BAD_REQUEST,
            Self::GatewayRejection { status, .. } => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::GatewayRejection { body, .. } => {
                // Pass the gateway's answer on as JSON when it is JSON, otherwise as a string
                let gateway_response = serde_json::from_str::<Value>(body).unwrap_or_else(|_| json!(body));
                json!({ "error": self.to_string(), "gateway_response": gateway_response })
            },
            e if e.is_internal() => {
                error!("💻️ {e}");
                json!({ "error": INTERNAL_ERROR_MESSAGE })
            },
            e => json!({ "error": e.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("You are not logged in.")]
    MissingToken,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Could not issue an access token. {0}")]
    TokenIssueError(String),
    #[error("The notification signature is invalid.")]
    InvalidSignature,
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::InvalidInput(s) => Self::InvalidInput(s),
            AccountApiError::EmailTaken(_) => Self::Conflict(e.to_string()),
            AccountApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AccountApiError::DatabaseError(_) | AccountApiError::PasswordError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::InvalidInput(s) => Self::InvalidInput(s),
            CatalogApiError::PackageNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogApiError::PackageInUse(_, _) => Self::Conflict(e.to_string()),
            CatalogApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::InvalidInput(s) => Self::InvalidInput(s),
            OrderFlowError::MalformedOrderId(_) | OrderFlowError::InvalidTransition(_) => {
                Self::InvalidInput(e.to_string())
            },
            OrderFlowError::PackageNotFound(_) | OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::ScheduleConflict(_) => Self::Conflict(e.to_string()),
            OrderFlowError::DatabaseError(_) | OrderFlowError::Contention(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<PaymentApiError> for ServerError {
    fn from(e: PaymentApiError) -> Self {
        match e {
            PaymentApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentApiError::Guard(g) => Self::PaymentNotAllowed(g),
            PaymentApiError::Gateway(GatewayError::Upstream { status, body }) => Self::GatewayRejection { status, body },
            PaymentApiError::Gateway(GatewayError::Unavailable(s)) => Self::GatewayUnavailable(s),
            PaymentApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}
