//! Custom serde implementations for config values.

/// Numbers written as decimal (or `0x` hex) strings.
///
/// Plain JSON integers are accepted on input as long as they fit in a `u64`.
/// Values above 2^53 lose precision in most JSON tooling, so they should be
/// written as strings.
pub mod number_as_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Int(u64),
    }

    /// Serializes `number` as a string.
    ///
    /// # Errors
    /// Returns the serializer's error.
    pub fn serialize<T, S>(number: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: ToString,
        S: Serializer,
    {
        serializer.serialize_str(&number.to_string())
    }

    /// Parses a number from a string or a JSON integer.
    ///
    /// # Errors
    /// Returns an error if the value does not parse as `T`.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
        D: Deserializer<'de>,
    {
        let text = match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s,
            Repr::Int(n) => n.to_string(),
        };
        text.trim().parse().map_err(serde::de::Error::custom)
    }
}
