//! Serde support for human-readable durations.
//!
//! Durations are written as `humantime` strings (`"30s"`, `"1m 30s"`). Bare
//! integers, as numbers or as digit-only strings such as
//! `GATEWAY_TARGET_DIAL_TIMEOUT=5`, are read as whole seconds.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Foo {
//!     #[serde(with = "crate::config::duration")]
//!     timeout: Duration,
//! }
//! ```

use std::fmt;
use std::time::Duration;

use serde::{de, Deserializer, Serializer};

pub fn serialize<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&humantime::format_duration(*d).to_string())
}

pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    d.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl de::Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a duration such as \"10s\" or a number of seconds")
    }

    fn visit_str<E>(self, v: &str) -> Result<Duration, E>
    where
        E: de::Error,
    {
        let v = v.trim();
        if let Ok(secs) = v.parse::<u64>() {
            return Ok(Duration::from_secs(secs));
        }
        humantime::parse_duration(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Duration, E>
    where
        E: de::Error,
    {
        Ok(Duration::from_secs(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Duration, E>
    where
        E: de::Error,
    {
        u64::try_from(v)
            .map(Duration::from_secs)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }
}
