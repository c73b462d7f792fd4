pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Study not found: {study_id}")]
	StudyNotFound { study_id: String },
	#[error("Access denied: {message}")]
	AccessDenied { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<cbio_storage::Error> for Error {
	fn from(err: cbio_storage::Error) -> Self {
		match err {
			cbio_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			cbio_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}
