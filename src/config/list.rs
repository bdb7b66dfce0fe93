//! Serde support for list fields written either as a sequence or as one
//! comma-separated string (`"kafka,prometheus"`).
//!
//! Environment variables always arrive as a single string, so every list
//! field in the schema reads through [`deserialize`]. Items are split with
//! the same rule as the command-line flags.

use std::fmt;

use serde::{de, Deserializer};

use crate::cli::clean_split;

pub fn deserialize<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    d.deserialize_any(ListVisitor)
}

struct ListVisitor;

impl<'de> de::Visitor<'de> for ListVisitor {
    type Value = Vec<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a list of strings or a comma-separated string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Vec<String>, E>
    where
        E: de::Error,
    {
        Ok(clean_split(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Vec<String>, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<String>()? {
            items.push(item);
        }
        Ok(items)
    }
}
