pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Connectivity or timeout failure; the request never produced a usable
	/// response. Retryable.
	#[error("Upstream unavailable: {message}")]
	Unavailable { message: String },
	/// The upstream answered with a non-2xx status that is not a single-object
	/// not-found. The status code is preserved for the caller.
	#[error("Upstream rejected the request with status {status}.")]
	Rejected { status: u16 },
	/// The response body could not be interpreted as the documented envelope.
	#[error("Invalid upstream response: {message}")]
	InvalidResponse { message: String },
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		match err.status() {
			Some(status) => Self::Rejected { status: status.as_u16() },
			// Timeouts are indistinguishable from other transport failures by
			// design; both surface as Unavailable.
			None => Self::Unavailable { message: err.to_string() },
		}
	}
}
