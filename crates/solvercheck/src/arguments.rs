//! Named test-case parameters.
//!
//! Parameters arrive as strings (`n=64 incx=1 timing=true`, `(key, value)`
//! pairs, or a JSON object) and are parsed on demand by whoever consumes them.
//! Every read marks the key as consumed so that a misspelled parameter is
//! caught by [`Arguments::validate_consumed`] instead of silently ignored.

use core::fmt::Display;
use core::str::FromStr;
use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::{HarnessError, HarnessResult};

/// Named parameter map with consumption tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    values: BTreeMap<String, String>,
    consumed: BTreeSet<String>,
}

impl Arguments {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.values.insert(key.into(), value.to_string());
        self
    }

    /// Builder form of [`Arguments::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// True when `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Parse `key`; fails if it is absent.
    pub fn get<T>(&mut self, key: &str) -> HarnessResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.try_get(key)?
            .ok_or_else(|| HarnessError::MissingArgument(key.to_string()))
    }

    /// Parse `key`, or return `default` if it is absent.
    pub fn get_or<T>(&mut self, key: &str, default: T) -> HarnessResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        Ok(self.try_get(key)?.unwrap_or(default))
    }

    /// Parse `key` if present.
    pub fn try_get<T>(&mut self, key: &str) -> HarnessResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(raw) = self.values.get(key) else {
            return Ok(None);
        };
        self.consumed.insert(key.to_string());
        raw.parse()
            .map(Some)
            .map_err(|err: T::Err| HarnessError::InvalidArgument {
                name: key.to_string(),
                value: raw.clone(),
                reason: err.to_string(),
            })
    }

    /// Boolean flag: `true/false`, `1/0` or `yes/no`.
    pub fn flag(&mut self, key: &str, default: bool) -> HarnessResult<bool> {
        let Some(raw) = self.try_get::<String>(key)? else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(HarnessError::InvalidArgument {
                name: key.to_string(),
                value: raw,
                reason: "expected a boolean".to_string(),
            }),
        }
    }

    /// Single character parameter, e.g. a fill mode.
    pub fn char_or(&mut self, key: &str, default: char) -> HarnessResult<char> {
        self.get_or(key, default)
    }

    /// Fail if any parameter was never read.
    pub fn validate_consumed(&self) -> HarnessResult<()> {
        let unused: Vec<String> = self
            .values
            .keys()
            .filter(|key| !self.consumed.contains(*key))
            .cloned()
            .collect();
        if unused.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::UnconsumedArguments(unused))
        }
    }

    /// Parse a JSON object whose values are strings, numbers or booleans.
    pub fn from_json(json: &str) -> HarnessResult<Self> {
        let invalid = |reason: String| HarnessError::InvalidArgument {
            name: "<json>".to_string(),
            value: json.to_string(),
            reason,
        };

        let value: Value = serde_json::from_str(json).map_err(|err| invalid(err.to_string()))?;
        let Value::Object(map) = value else {
            return Err(invalid("expected an object".to_string()));
        };

        let mut args = Self::new();
        for (key, value) in map {
            let raw = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => return Err(invalid(format!("unsupported value for {key}: {other}"))),
            };
            args.set(key, raw);
        }
        Ok(args)
    }

    /// Iterate over `(key, raw value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for Arguments {
    type Err = HarnessError;

    /// `key=value` pairs separated by whitespace or commas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut args = Self::new();
        for pair in s.split(|c: char| c.is_whitespace() || c == ',') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| HarnessError::InvalidArgument {
                name: pair.to_string(),
                value: String::new(),
                reason: "expected key=value".to_string(),
            })?;
            args.set(key.trim(), value.trim());
        }
        Ok(args)
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = Self::new();
        for (key, value) in iter {
            args.set(key, value);
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value_string() {
        let mut args: Arguments = "n=64, incx=-2 timing=yes".parse().unwrap();
        assert_eq!(args.get::<i64>("n").unwrap(), 64);
        assert_eq!(args.get::<i64>("incx").unwrap(), -2);
        assert!(args.flag("timing", false).unwrap());
        assert!(args.validate_consumed().is_ok());
    }

    #[test]
    fn test_missing_and_invalid() {
        let mut args = Arguments::new().with("n", "two");
        assert!(matches!(
            args.get::<i64>("incx"),
            Err(HarnessError::MissingArgument(_))
        ));
        assert!(matches!(
            args.get::<i64>("n"),
            Err(HarnessError::InvalidArgument { .. })
        ));
        assert_eq!(args.get_or("batch_count", 1usize).unwrap(), 1);
    }

    #[test]
    fn test_unconsumed_arguments_are_reported() {
        let mut args: Arguments = [("n", "4"), ("icnx", "1")].into_iter().collect();
        let _ = args.get::<i64>("n").unwrap();
        assert_eq!(
            args.validate_consumed(),
            Err(HarnessError::UnconsumedArguments(vec!["icnx".to_string()]))
        );
    }

    #[test]
    fn test_from_json() {
        let mut args = Arguments::from_json(r#"{"n": 10, "uplo": "L", "timing": true}"#).unwrap();
        assert_eq!(args.get::<usize>("n").unwrap(), 10);
        assert_eq!(args.char_or("uplo", 'U').unwrap(), 'L');
        assert!(args.flag("timing", false).unwrap());

        assert!(Arguments::from_json("[1, 2]").is_err());
        assert!(Arguments::from_json(r#"{"n": [1]}"#).is_err());
    }
}
