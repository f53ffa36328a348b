//! Wire types for the fabdl upstream.

use std::fmt;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

/// Upstream endpoints called by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Endpoint {
    /// `GET /spotify/get?url=...`: track metadata.
    #[strum(serialize = "track_info")]
    TrackInfo,
    /// `GET /spotify/mp3-convert-task/{gid}/{id}`: download link.
    #[strum(serialize = "conversion")]
    Conversion,
}

/// Opaque identifier returned by the metadata endpoint.
///
/// fabdl sends these as strings or numbers depending on the track.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Identifier {
    /// String identifier.
    Text(String),
    /// Numeric identifier.
    Number(serde_json::Number),
}

impl Identifier {
    /// Whether the identifier carries a usable value.
    ///
    /// Empty strings and zero are treated as absent.
    pub fn is_present(&self) -> bool {
        match self {
            Identifier::Text(s) => !s.is_empty(),
            Identifier::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        }
    }
}

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Text(s) => f.write_str(s),
            // `2.0` goes into the conversion path as `2`
            Identifier::Number(n) => match n.as_f64() {
                Some(v) if n.is_f64() && v.fract() == 0.0 && v.abs() <= MAX_EXACT_FLOAT => {
                    write!(f, "{}", v as i64)
                }
                _ => write!(f, "{}", n),
            },
        }
    }
}

/// Artist credit: a single name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Artists {
    /// One preformatted credit.
    One(String),
    /// Separate names.
    Many(Vec<String>),
}

impl From<&str> for Artists {
    fn from(name: &str) -> Self {
        Artists::One(name.to_string())
    }
}

/// Decode a field, mapping a value of the wrong shape to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode a `result` payload; anything other than an object is `None`.
fn object_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
        _ => Ok(None),
    }
}

/// Response from the metadata endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackInfoResponse {
    /// Track payload; `None` when absent, null, or not an object.
    #[serde(default, deserialize_with = "object_or_none")]
    pub result: Option<TrackInfoResult>,
}

/// Raw `result` object of the metadata response.
///
/// Every field is optional and a mistyped field decodes as `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackInfoResult {
    /// Track identifier.
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<Identifier>,
    /// Group identifier.
    #[serde(default, deserialize_with = "lenient")]
    pub gid: Option<Identifier>,
    /// Track title.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Artist name(s).
    #[serde(default, deserialize_with = "lenient")]
    pub artists: Option<Artists>,
    /// Duration in milliseconds, as sent.
    #[serde(default, deserialize_with = "lenient")]
    pub duration_ms: Option<serde_json::Number>,
}

/// Track metadata with both identifiers known to be present.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    /// Track identifier.
    pub id: Identifier,
    /// Group identifier.
    pub gid: Identifier,
    /// Track title.
    pub name: Option<String>,
    /// Artist name(s).
    pub artists: Option<Artists>,
    /// Duration in milliseconds.
    pub duration_ms: Option<serde_json::Number>,
}

impl TrackInfoResponse {
    /// Extract track metadata, or `None` if `id` or `gid` is missing.
    pub fn into_track_info(self) -> Option<TrackInfo> {
        let result = self.result?;
        let id = result.id.filter(Identifier::is_present)?;
        let gid = result.gid.filter(Identifier::is_present)?;

        Some(TrackInfo {
            id,
            gid,
            name: result.name,
            artists: result.artists,
            duration_ms: result.duration_ms,
        })
    }
}

/// Response from the conversion endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionResponse {
    /// Conversion payload; `None` when absent, null, or not an object.
    #[serde(default, deserialize_with = "object_or_none")]
    pub result: Option<ConversionResult>,
}

/// `result` object of the conversion response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionResult {
    /// Download path relative to the upstream host.
    #[serde(default, deserialize_with = "lenient")]
    pub download_url: Option<String>,
}

impl ConversionResponse {
    /// Download path, or `None` if missing or empty.
    pub fn download_path(&self) -> Option<&str> {
        self.result
            .as_ref()?
            .download_url
            .as_deref()
            .filter(|path| !path.is_empty())
    }
}
