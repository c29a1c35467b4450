//! Track references and the metadata derived from them for display

use serde::{Deserialize, Serialize};

const TRACK_URI_PREFIX: &str = "spotify:track:";

pub const UNKNOWN_ARTIST: &str = "Unknown artist";
pub const NO_TRACK_PLAYING: &str = "No track playing";

/// Minimal identity of a playable track.
///
/// Only `id` and `uri` are needed to start playback; everything else is
/// display metadata and may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRef {
    pub id: String,
    pub uri: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub album_art: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u32>,
}

impl TrackRef {
    /// Build a bare reference from a playable URI (no metadata).
    pub fn from_uri(uri: &str) -> Self {
        let id = parse_track_uri(uri).unwrap_or_default().to_string();
        Self {
            id,
            uri: uri.to_string(),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uri)
    }

    pub fn artists_joined(&self) -> String {
        if self.artists.is_empty() {
            UNKNOWN_ARTIST.to_string()
        } else {
            self.artists.join(", ")
        }
    }
}

/// Extract the track id from a `spotify:track:<id>` URI.
///
/// Returns `None` for anything that is not a track URI with a non-empty
/// alphanumeric id.
pub fn parse_track_uri(uri: &str) -> Option<&str> {
    let id = uri.strip_prefix(TRACK_URI_PREFIX)?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(id)
}

pub fn track_uri(id: &str) -> String {
    format!("{}{}", TRACK_URI_PREFIX, id)
}

/// Ready-to-display field set for the footer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackInfo {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub album_art: String,
    pub duration_ms: u32,
}

impl TrackInfo {
    /// Placeholder shown while nothing is playing.
    pub fn idle(default_album_art: &str) -> Self {
        Self {
            id: String::new(),
            uri: String::new(),
            name: NO_TRACK_PLAYING.to_string(),
            artist: String::new(),
            album: String::new(),
            album_art: default_album_art.to_string(),
            duration_ms: 0,
        }
    }

    /// Fill display fields from a reference, defaulting whatever is missing.
    pub fn from_track(track: &TrackRef, default_album_art: &str) -> Self {
        Self {
            id: track.id.clone(),
            uri: track.uri.clone(),
            name: track.display_name().to_string(),
            artist: track.artists_joined(),
            album: track.album.clone().unwrap_or_default(),
            album_art: track
                .album_art
                .clone()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| default_album_art.to_string()),
            duration_ms: track.duration_ms.unwrap_or(0),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.uri.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_track_uris() {
        assert_eq!(parse_track_uri("spotify:track:4uLU6hMCjMI75M1A2tKUQC"), Some("4uLU6hMCjMI75M1A2tKUQC"));
        assert_eq!(parse_track_uri("not-a-uri"), None);
        assert_eq!(parse_track_uri("spotify:track:"), None);
        assert_eq!(parse_track_uri("spotify:album:4uLU6hMCjMI75M1A2tKUQC"), None);
        assert_eq!(parse_track_uri("spotify:track:abc/def"), None);
    }

    #[test]
    fn track_info_defaults_missing_fields() {
        let track = TrackRef::from_uri("spotify:track:abc");
        let info = TrackInfo::from_track(&track, "/art.jpg");

        assert_eq!(info.id, "abc");
        assert_eq!(info.name, "spotify:track:abc");
        assert_eq!(info.artist, UNKNOWN_ARTIST);
        assert_eq!(info.album_art, "/art.jpg");
        assert_eq!(info.duration_ms, 0);
    }

    #[test]
    fn track_info_joins_artists() {
        let track = TrackRef {
            id: "abc".into(),
            uri: "spotify:track:abc".into(),
            name: Some("Song".into()),
            artists: vec!["A".into(), "B".into()],
            album: Some("Album".into()),
            album_art: Some("https://i.scdn.co/image/1".into()),
            duration_ms: Some(1000),
        };
        let info = TrackInfo::from_track(&track, "/art.jpg");

        assert_eq!(info.artist, "A, B");
        assert_eq!(info.album_art, "https://i.scdn.co/image/1");
    }

    #[test]
    fn stored_json_uses_camel_case() {
        let track = TrackRef {
            album_art: Some("x".into()),
            ..TrackRef::from_uri("spotify:track:abc")
        };
        let json = serde_json::to_string(&track).unwrap();
        assert!(json.contains("\"albumArt\":\"x\""));

        let back: TrackRef = serde_json::from_str(r#"{"id":"abc","uri":"spotify:track:abc"}"#).unwrap();
        assert_eq!(back, TrackRef::from_uri("spotify:track:abc"));
    }
}
