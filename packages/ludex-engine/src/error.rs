pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Query text must be non-empty.")]
	EmptyQuery,
	#[error("Unknown item: {id}.")]
	UnknownItem { id: String },
	#[error("{message}")]
	InvalidParameter { message: String },
	#[error("Embedding service unavailable: {message}")]
	EmbeddingUnavailable { message: String },
	#[error("Item store unavailable: {message}")]
	BackendUnavailable { message: String },
}

impl From<ludex_domain::query::QueryError> for Error {
	fn from(err: ludex_domain::query::QueryError) -> Self {
		match err {
			ludex_domain::query::QueryError::EmptyText => Self::EmptyQuery,
			ludex_domain::query::QueryError::InvalidParameter { message } =>
				Self::InvalidParameter { message },
		}
	}
}

impl From<ludex_storage::Error> for Error {
	fn from(err: ludex_storage::Error) -> Self {
		Self::BackendUnavailable { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::EmbeddingUnavailable { message: err.to_string() }
	}
}
