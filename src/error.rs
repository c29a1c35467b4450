//! Failures of the play path, categorized for the user

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayError {
    #[error("The selected track has an invalid URI and cannot be played.")]
    InvalidTrack(String),

    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error("Playback device not found. Please ensure Spotify is active on a device.")]
    DeviceUnavailable,

    #[error("Cannot play the selected track. Please try another one.")]
    BadTrack,

    #[error("An error occurred while trying to play the track. Please try again.")]
    Other(#[source] anyhow::Error),
}

impl PlayError {
    /// Classify a backend failure by the HTTP status it carries.
    pub fn from_backend(error: anyhow::Error) -> Self {
        let error_str = error.to_string();

        if error_str.contains("401") {
            PlayError::SessionExpired
        } else if error_str.contains("404") {
            PlayError::DeviceUnavailable
        } else if error_str.contains("400") {
            PlayError::BadTrack
        } else {
            PlayError::Other(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_status_codes() {
        let classify = |msg: &str| PlayError::from_backend(anyhow::anyhow!(msg.to_string()));

        assert!(matches!(classify("status code 401 Unauthorized"), PlayError::SessionExpired));
        assert!(matches!(classify("status code 404 Not Found"), PlayError::DeviceUnavailable));
        assert!(matches!(classify("status code 400 Bad Request"), PlayError::BadTrack));
        assert!(matches!(classify("connection reset"), PlayError::Other(_)));
    }

    #[test]
    fn messages_are_user_facing() {
        let err = PlayError::InvalidTrack("not-a-uri".into());
        assert_eq!(err.to_string(), "The selected track has an invalid URI and cannot be played.");
    }
}
