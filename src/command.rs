//! Command definitions
//!
//! A command value for every engine operation, plus a line parser used by
//! the CLI.
//!
//! ## Line Syntax
//! ```text
//! put <key> <value...>     (alias: set)  value is the rest of the line
//! get <key>
//! del <key>                (alias: delete)
//! flush
//! compact
//! # comment                blank lines and comments parse to None
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{LsmError, Result};

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Get,
    Put,
    Delete,
    Flush,
    Compact,
}

impl CommandType {
    pub fn name(&self) -> &'static str {
        match self {
            CommandType::Get => "get",
            CommandType::Put => "put",
            CommandType::Delete => "del",
            CommandType::Flush => "flush",
            CommandType::Compact => "compact",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<K, V> {
    /// Get a value by key
    Get { key: K },

    /// Put a key-value pair
    Put { key: K, value: V },

    /// Delete a key
    Delete { key: K },

    /// Flush the memtable into a segment
    Flush,

    /// Compact all sources into one segment
    Compact,
}

impl<K, V> Command<K, V> {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Put { .. } => CommandType::Put,
            Command::Delete { .. } => CommandType::Delete,
            Command::Flush => CommandType::Flush,
            Command::Compact => CommandType::Compact,
        }
    }
}

impl<K, V> Command<K, V>
where
    K: FromStr,
    V: FromStr,
{
    /// Parse one line of command text
    ///
    /// Returns `Ok(None)` for blank lines and `#` comments.
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (verb, rest) = next_token(line);
        let command = match verb.to_ascii_lowercase().as_str() {
            "get" => {
                let key = parse_key(rest, verb)?;
                Command::Get { key }
            }
            "put" | "set" => {
                let (key_text, value_text) = next_token(rest);
                let key = parse_key(key_text, verb)?;
                let value_text = value_text.trim();
                if value_text.is_empty() {
                    return Err(LsmError::Parse(format!("{}: missing value", verb)));
                }
                let value = value_text
                    .parse()
                    .map_err(|_| LsmError::Parse(format!("{}: invalid value {:?}", verb, value_text)))?;
                Command::Put { key, value }
            }
            "del" | "delete" => {
                let key = parse_key(rest, verb)?;
                Command::Delete { key }
            }
            "flush" => no_arguments(rest, verb, Command::Flush)?,
            "compact" => no_arguments(rest, verb, Command::Compact)?,
            _ => return Err(LsmError::Parse(format!("unknown command {:?}", verb))),
        };

        Ok(Some(command))
    }
}

impl<K, V> FromStr for Command<K, V>
where
    K: FromStr,
    V: FromStr,
{
    type Err = LsmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_line(s)?.ok_or_else(|| LsmError::Parse("empty command".to_string()))
    }
}

/// Split off the first whitespace-delimited token
fn next_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, ""),
    }
}

/// Parse a single key token; anything after it is an error
fn parse_key<K: FromStr>(text: &str, verb: &str) -> Result<K> {
    let (key, extra) = next_token(text);
    if key.is_empty() {
        return Err(LsmError::Parse(format!("{}: missing key", verb)));
    }
    if !extra.trim().is_empty() {
        return Err(LsmError::Parse(format!(
            "{}: unexpected arguments {:?}",
            verb,
            extra.trim()
        )));
    }
    key.parse()
        .map_err(|_| LsmError::Parse(format!("{}: invalid key {:?}", verb, key)))
}

fn no_arguments<T>(rest: &str, verb: &str, command: T) -> Result<T> {
    if rest.trim().is_empty() {
        Ok(command)
    } else {
        Err(LsmError::Parse(format!("{} takes no arguments", verb)))
    }
}
