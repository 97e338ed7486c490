//! Typed accessors layered on the string-valued [`Preferences`] facade.
//!
//! A [`Preference`] binds one key to a [`Codec`] and keeps a local view of the
//! last value it read or wrote. Writes and clears reach the backend before the
//! view changes, so on failure the view still reflects the stored state.
//!
//! A stored string that the codec cannot decode (for example a value written
//! by a different accessor) reads as absent and is logged, it never fails the
//! read.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::{Preferences, PrefsResult};

/// Conversion between a typed value and its stored string form.
pub trait Codec {
    type Value;

    fn encode(value: &Self::Value) -> PrefsResult<String>;

    fn decode(raw: &str) -> anyhow::Result<Self::Value>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec for StringCodec {
    type Value = String;

    fn encode(value: &Self::Value) -> PrefsResult<String> {
        Ok(value.clone())
    }

    fn decode(raw: &str) -> anyhow::Result<Self::Value> {
        Ok(raw.to_owned())
    }
}

/// Numbers are stored in their `Display` form and parsed back with `FromStr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCodec<N = f64>(PhantomData<N>);

impl<N> Codec for NumberCodec<N>
where
    N: FromStr + fmt::Display + PartialOrd,
    N::Err: fmt::Display,
{
    type Value = N;

    fn encode(value: &N) -> PrefsResult<String> {
        Ok(value.to_string())
    }

    fn decode(raw: &str) -> anyhow::Result<N> {
        let value: N = raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("'{raw}' is not a number: {e}"))?;
        // NaN is unordered even against itself
        if value.partial_cmp(&value).is_none() {
            return Err(anyhow!("'{raw}' is not a number"));
        }
        Ok(value)
    }
}

/// Booleans are stored as `"true"`/`"false"`; `"1"`/`"0"` are accepted on read.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCodec;

impl Codec for BoolCodec {
    type Value = bool;

    fn encode(value: &bool) -> PrefsResult<String> {
        Ok(value.to_string())
    }

    fn decode(raw: &str) -> anyhow::Result<bool> {
        if raw.eq_ignore_ascii_case("true") || raw == "1" {
            Ok(true)
        } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
            Ok(false)
        } else {
            Err(anyhow!("'{raw}' is not a boolean"))
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec<T>(PhantomData<T>);

impl<T> Codec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Value = T;

    fn encode(value: &T) -> PrefsResult<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(raw: &str) -> anyhow::Result<T> {
        Ok(serde_json::from_str(raw)?)
    }
}

pub type StringPreference = Preference<StringCodec>;
pub type NumberPreference<N = f64> = Preference<NumberCodec<N>>;
pub type BoolPreference = Preference<BoolCodec>;
pub type ObjectPreference<T> = Preference<JsonCodec<T>>;

/// One typed key in a [`Preferences`] store plus a local view of its value.
pub struct Preference<C: Codec> {
    prefs: Arc<Preferences>,
    key: String,
    value: Option<C::Value>,
    contains: bool,
}

impl<C: Codec> Preference<C> {
    /// Binds `key` without reading it; the view starts out empty.
    pub fn new(prefs: Arc<Preferences>, key: impl Into<String>) -> Self {
        Self {
            prefs,
            key: key.into(),
            value: None,
            contains: false,
        }
    }

    /// Binds `key` and reads its current value.
    pub async fn load(prefs: Arc<Preferences>, key: impl Into<String>) -> PrefsResult<Self> {
        let mut pref = Self::new(prefs, key);
        pref.refresh().await?;
        Ok(pref)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The last value read or written, `None` if absent or undecodable.
    pub fn value(&self) -> Option<&C::Value> {
        self.value.as_ref()
    }

    /// Whether the key held a value at the last read or write, regardless of
    /// whether that value decoded.
    pub fn contains(&self) -> bool {
        self.contains
    }

    /// Re-reads the key from the store.
    pub async fn refresh(&mut self) -> PrefsResult<()> {
        let raw = self.prefs.get(&self.key).await?;
        self.contains = raw.is_some();
        self.value = raw.and_then(|raw| self.decode(&raw));
        Ok(())
    }

    /// Persists `value`, then updates the view.
    ///
    /// A value that encodes to the empty string is not stored; the view is
    /// re-read instead so it keeps matching the store.
    pub async fn set(&mut self, value: C::Value) -> PrefsResult<()> {
        let raw = C::encode(&value)?;
        if raw.is_empty() {
            return self.refresh().await;
        }
        self.prefs.set(&self.key, &raw).await?;
        self.value = Some(value);
        self.contains = true;
        Ok(())
    }

    /// Removes the key, then empties the view.
    pub async fn clear(&mut self) -> PrefsResult<()> {
        self.prefs.clear(&self.key).await?;
        self.value = None;
        self.contains = false;
        Ok(())
    }

    fn decode(&self, raw: &str) -> Option<C::Value> {
        match C::decode(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %self.key, "prefs: ignoring undecodable value: {err:#}");
                None
            }
        }
    }
}

impl<C> fmt::Debug for Preference<C>
where
    C: Codec,
    C::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preference")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("contains", &self.contains)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_codec_accepts_common_spellings() {
        assert!(BoolCodec::decode("true").unwrap());
        assert!(BoolCodec::decode("TRUE").unwrap());
        assert!(BoolCodec::decode("1").unwrap());
        assert!(!BoolCodec::decode("False").unwrap());
        assert!(!BoolCodec::decode("0").unwrap());
        assert!(BoolCodec::decode("yes").is_err());
        assert!(BoolCodec::decode("").is_err());
        assert_eq!(BoolCodec::encode(&true).unwrap(), "true");
    }

    #[test]
    fn number_codec_parses_and_rejects() {
        assert_eq!(NumberCodec::<f64>::decode("42").unwrap(), 42.0);
        assert_eq!(NumberCodec::<f64>::decode(" 3.5 ").unwrap(), 3.5);
        assert_eq!(NumberCodec::<i64>::decode("-7").unwrap(), -7);
        assert!(NumberCodec::<f64>::decode("abc").is_err());
        assert!(NumberCodec::<f64>::decode("NaN").is_err());
        assert!(NumberCodec::<i32>::decode("1.5").is_err());
        assert_eq!(NumberCodec::<f64>::encode(&42.0).unwrap(), "42");
    }

    #[test]
    fn json_codec_reports_bad_input() {
        assert_eq!(JsonCodec::<Vec<u8>>::decode("[1,2]").unwrap(), vec![1u8, 2]);
        assert!(JsonCodec::<Vec<u8>>::decode("{not json").is_err());
        assert_eq!(JsonCodec::<Vec<u8>>::encode(&vec![3]).unwrap(), "[3]");
    }
}
