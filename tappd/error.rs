use thiserror::Error;

#[derive(Debug, Error)]
pub enum TappdError {
	#[error("the request to tappd timed out")]
	Timeout,
	#[error("could not connect to tappd at {0}")]
	ConnectionRefused(String),
	#[error("tappd responded with status {0}")]
	Status(u16),
	#[error("malformed response from tappd: {0}")]
	MalformedResponse(String),
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
	#[error(transparent)]
	Request(reqwest::Error),
}

impl TappdError {
	pub(crate) fn from_reqwest(error: reqwest::Error, endpoint: &str) -> TappdError {
		if error.is_timeout() {
			TappdError::Timeout
		} else if error.is_connect() {
			TappdError::ConnectionRefused(endpoint.to_owned())
		} else if error.is_decode() {
			TappdError::MalformedResponse(error.to_string())
		} else if let Some(status) = error.status() {
			TappdError::Status(status.as_u16())
		} else {
			TappdError::Request(error)
		}
	}
}
