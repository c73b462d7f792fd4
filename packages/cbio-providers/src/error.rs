pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	/// The upstream answered with a 4xx or 5xx status.
	#[error("Upstream responded with status {status}.")]
	Status { status: u16, body: String },
	#[error("{message}")]
	InvalidConfig { message: String },
}
