use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt::{Display, Formatter};

use crate::core::store::StoreError;
use crate::services::backend::BackendError;
use crate::services::registration_store::ContractError;

#[derive(Debug, PartialEq)]
pub enum AppErrorType {
    NotFoundError,
    AuthError,
    PayloadValidationError,
    ConflictError,
    BackendError { function: String },
    NetworkError,
    TimeoutError,
    CacheError,
    SerializationError,
    InternalServerError,
    ForbiddenError,
}

#[derive(Debug, PartialEq)]
pub struct AppError {
    pub error_type: AppErrorType,
    pub message: Option<String>,
    pub cause: Option<String>,
}

#[derive(Serialize)]
pub struct AppErrorResponse {
    pub success: bool,
    pub message: String,
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            AppError {
                message: Some(message),
                ..
            } => message.clone(),

            AppError {
                message: None,
                error_type: AppErrorType::NotFoundError,
                ..
            } => "The requested item was not found".to_string(),
            _ => "An unexpected error has occurred".to_string(),
        }
    }

    pub fn not_found(message: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type: AppErrorType::NotFoundError,
            message: Some(message.to_string()),
        }
    }

    pub fn bad_request(message: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type: AppErrorType::PayloadValidationError,
            message: Some(message.to_string()),
        }
    }

    pub fn conflict(message: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type: AppErrorType::ConflictError,
            message: Some(message.to_string()),
        }
    }

    pub fn forbidden_error(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::ForbiddenError,
            message: Some(error.to_string()),
        }
    }

    pub fn unauthorized(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::AuthError,
            message: Some(error.to_string()),
        }
    }

    pub fn internal_error(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::InternalServerError,
            message: Some(error.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        AppError {
            cause: Some(error.to_string()),
            message: Some("Internal Caching Error".to_string()),
            error_type: AppErrorType::CacheError,
        }
    }
}

impl From<BackendError> for AppError {
    fn from(error: BackendError) -> Self {
        let error_type = match &error {
            BackendError::Network(_) => AppErrorType::NetworkError,
            BackendError::Timeout(_) => AppErrorType::TimeoutError,
            BackendError::Decode(_) => AppErrorType::SerializationError,
            BackendError::Function { function, .. } => AppErrorType::BackendError {
                function: function.clone(),
            },
        };
        AppError {
            cause: Some(error.to_string()),
            message: Some(error.user_message()),
            error_type,
        }
    }
}

impl From<ContractError> for AppError {
    fn from(error: ContractError) -> Self {
        match error {
            ContractError::Store(e) => e.into(),
            other @ ContractError::PlanNotSelected => AppError::conflict(other),
            other => AppError::bad_request(other),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError {
            cause: Some(error.to_string()),
            message: Some("Failed to process payload".to_string()),
            error_type: AppErrorType::SerializationError,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(error: validator::ValidationErrors) -> Self {
        AppError {
            cause: Some(error.to_string()),
            message: Some(format!("Invalid request: {}", error)),
            error_type: AppErrorType::PayloadValidationError,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.error_type {
            AppErrorType::AuthError => StatusCode::UNAUTHORIZED,
            AppErrorType::CacheError
            | AppErrorType::SerializationError
            | AppErrorType::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            AppErrorType::NotFoundError => StatusCode::NOT_FOUND,
            AppErrorType::PayloadValidationError => StatusCode::BAD_REQUEST,
            AppErrorType::ConflictError => StatusCode::CONFLICT,
            AppErrorType::BackendError { .. } | AppErrorType::NetworkError => {
                StatusCode::BAD_GATEWAY
            }
            AppErrorType::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
            AppErrorType::ForbiddenError => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(AppErrorResponse {
            success: false,
            message: self.message(),
        })
    }
}

#[derive(Serialize)]
pub struct AppSuccessResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T: Serialize> AppSuccessResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> HttpResponse {
        HttpResponse::Ok().json(AppSuccessResponse {
            success: true,
            data,
            message: message.into(),
        })
    }

    pub fn created(data: T, message: impl Into<String>) -> HttpResponse {
        HttpResponse::Created().json(AppSuccessResponse {
            success: true,
            data,
            message: message.into(),
        })
    }
}
