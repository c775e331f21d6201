//! Query string decoding for dice requests.
//!
//! The target must look like `/?game=<id>&dice=<notation>`. Only the two
//! known keys are accepted; anything else rejects the whole query.

use thiserror::Error;
use url::form_urlencoded;

/// Fixed prefix stripped from the request target before decoding.
pub const QUERY_PREFIX: &str = "/?";

/// Decoded `game` / `dice` parameters. Missing keys stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiceQuery {
    pub game: String,
    pub dice: String,
}

impl DiceQuery {
    pub fn new(game: impl Into<String>, dice: impl Into<String>) -> Self {
        Self {
            game: game.into(),
            dice: dice.into(),
        }
    }

    /// Form-encode back into a request target.
    pub fn to_target(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("game", &self.game)
            .append_pair("dice", &self.dice)
            .finish();
        format!("{QUERY_PREFIX}{query}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("request target has no query string")]
    MissingQuery,

    #[error("query pair '{0}' is not a single key=value")]
    MalformedPair(String),

    #[error("unknown query key '{0}'")]
    UnknownKey(String),
}

/// Decode a request target into a [`DiceQuery`].
pub fn decode_query(target: &str) -> Result<DiceQuery, QueryError> {
    let query = target
        .strip_prefix(QUERY_PREFIX)
        .ok_or(QueryError::MissingQuery)?;

    let mut decoded = DiceQuery::default();
    if query.is_empty() {
        return Ok(decoded);
    }

    for pair in query.split('&') {
        let mut segments = pair.split('=');
        let (key, value) = match (segments.next(), segments.next(), segments.next()) {
            (Some(key), Some(value), None) => (key, value),
            _ => return Err(QueryError::MalformedPair(pair.to_string())),
        };

        let value = decode_component(value);
        match key {
            "game" => decoded.game = value,
            "dice" => decoded.dice = value,
            other => return Err(QueryError::UnknownKey(other.to_string())),
        }
    }

    Ok(decoded)
}

/// Form-decode one component: `+` is a space, `%XX` is a byte.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn decode_component(component: &str) -> String {
    // The component holds no '&' or '=', so it parses as a single bare name.
    form_urlencoded::parse(component.as_bytes())
        .next()
        .map(|(name, _)| name.into_owned())
        .unwrap_or_default()
}
