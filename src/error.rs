use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-level error type for the shop.
///
/// Store operations and handlers surface failures through this enum; the
/// `IntoResponse` impl maps each kind to the HTTP status the client sees.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Signup attempted with a username that is already registered.
    #[error("Username already exists")]
    DuplicateUser,

    /// Login with a username/password pair that does not match any user.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No catalog row matches the requested product name.
    #[error("Product not found")]
    ProductNotFound,

    /// A catalog row exists but holds less stock than was requested.
    #[error("Not enough quantity available")]
    InsufficientQuantity,

    /// A file upload was missing, empty, or had a disallowed extension.
    #[error("No usable file data received")]
    MissingUploadFile,

    /// Malformed client input (empty fields, unparseable numbers, bad form data).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Password hashing or hash parsing failed.
    #[error("Password hashing failed")]
    PasswordHash,

    /// Reading or writing a table file failed.
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    /// A table file exists but its contents could not be decoded.
    #[error("Corrupt table data: {0}")]
    Codec(#[from] bincode::Error),

    /// Spreadsheet export failed.
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::DuplicateUser
            | Self::InsufficientQuantity
            | Self::MissingUploadFile
            | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::FORBIDDEN,
            Self::ProductNotFound => StatusCode::NOT_FOUND,
            Self::PasswordHash | Self::Io(_) | Self::Codec(_) | Self::Xlsx(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Don't expose internal error details to clients
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}
