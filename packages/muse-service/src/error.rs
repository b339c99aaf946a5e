pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Upstream unavailable: {message}")]
	Unavailable { message: String },
	#[error("Upstream rejected the request with status {status}.")]
	Rejected { status: u16 },
	#[error("Invalid upstream response: {message}")]
	InvalidResponse { message: String },
}

impl From<muse_client::Error> for Error {
	fn from(err: muse_client::Error) -> Self {
		match err {
			muse_client::Error::Unavailable { message } => Self::Unavailable { message },
			muse_client::Error::Rejected { status } => Self::Rejected { status },
			muse_client::Error::InvalidResponse { message } => Self::InvalidResponse { message },
		}
	}
}
