//! Agent configuration parsed from `key=value` strings.
//!
//! Known keys become typed fields as soon as the string is parsed, so a bad
//! seed or learning rate fails at construction, not on first use. Every
//! other key lands in `extra`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration key `{0}`")]
    Missing(String),
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Invalid { key: String, value: String, reason: String },
    #[error("malformed token `{0}`, expected key=value")]
    MalformedToken(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgentConfig {
    pub name: String,
    pub role: String,
    pub seed: Option<u64>,
    /// Table sizes for a fresh weight store.
    pub init: Option<Vec<usize>>,
    pub load: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub alpha: f32,
    pub extra: BTreeMap<String, String>,
    /// Text of the typed keys as given, for `property`.
    given: BTreeMap<String, String>,
}

impl AgentConfig {
    /// Parse `args` on top of the given `name` and `role` defaults.
    ///
    /// ```
    /// use threes_td::config::AgentConfig;
    /// let cfg = AgentConfig::with_defaults("slide", "slider", "seed=7 alpha=0.1 depth=2").unwrap();
    /// assert_eq!(cfg.seed, Some(7));
    /// assert_eq!(cfg.property("depth").unwrap(), "2");
    /// ```
    pub fn with_defaults(name: &str, role: &str, args: &str) -> Result<Self, ConfigError> {
        let mut cfg = AgentConfig { name: name.to_owned(), role: role.to_owned(), ..Default::default() };
        for token in args.split_whitespace() {
            cfg.notify(token)?;
        }
        Ok(cfg)
    }

    pub fn parse(args: &str) -> Result<Self, ConfigError> {
        Self::with_defaults("unknown", "unknown", args)
    }

    /// Apply one `key=value` token; later tokens override earlier ones.
    pub fn notify(&mut self, token: &str) -> Result<(), ConfigError> {
        let (key, value) = token.split_once('=').ok_or_else(|| ConfigError::MalformedToken(token.to_owned()))?;
        if key.is_empty() {
            return Err(ConfigError::MalformedToken(token.to_owned()));
        }
        match key {
            "name" => self.name = value.to_owned(),
            "role" => self.role = value.to_owned(),
            "seed" => self.seed = Some(parse_value(key, value)?),
            "alpha" => self.alpha = parse_value(key, value)?,
            "init" => self.init = Some(parse_size_list(value)?),
            "load" => self.load = Some(PathBuf::from(value)),
            "save" => self.save = Some(PathBuf::from(value)),
            _ => {
                self.extra.insert(key.to_owned(), value.to_owned());
                return Ok(());
            }
        }
        if !matches!(key, "name" | "role") {
            self.given.insert(key.to_owned(), value.to_owned());
        }
        Ok(())
    }

    /// Raw value of `key`. Absent keys are an error, never a silent default.
    pub fn property(&self, key: &str) -> Result<&str, ConfigError> {
        let value = match key {
            "name" => Some(self.name.as_str()),
            "role" => Some(self.role.as_str()),
            _ => self.given.get(key).or_else(|| self.extra.get(key)).map(String::as_str),
        };
        value.ok_or_else(|| ConfigError::Missing(key.to_owned()))
    }

    /// A property converted to a number.
    pub fn number<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        parse_value(key, self.property(key)?)
    }
}

impl FromStr for AgentConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentConfig::parse(s)
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_owned(),
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

/// Sizes separated by any non-digit characters, e.g. `65536,65536`.
pub fn parse_size_list(value: &str) -> Result<Vec<usize>, ConfigError> {
    let sizes = value
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(|s| parse_value::<usize>("init", s))
        .collect::<Result<Vec<_>, _>>()?;
    if sizes.is_empty() {
        return Err(ConfigError::Invalid {
            key: "init".into(),
            value: value.to_owned(),
            reason: "no table sizes given".into(),
        });
    }
    Ok(sizes)
}
