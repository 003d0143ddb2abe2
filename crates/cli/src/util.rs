// Path: crates/cli/src/util.rs

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Trailing `key=value` arguments of a command.
///
/// Keys the command does not ask for and bare words without `=` are logged
/// and skipped.
#[derive(Debug, Default)]
pub struct KvArgs(BTreeMap<String, String>);

impl KvArgs {
    pub fn parse(raw: &[String], known: &[&str]) -> Result<Self> {
        let mut map = BTreeMap::new();
        for item in raw {
            let Some((key, value)) = item.split_once('=') else {
                log::debug!("Ignoring argument '{}' without a value", item);
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            if !known.contains(&key.as_str()) {
                log::debug!("Ignoring unrecognized argument '{}'", key);
                continue;
            }
            map.insert(key, value.trim().to_string());
        }
        Ok(Self(map))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn get_owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    pub fn parse_opt<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|e| anyhow!("invalid value for '{}': {}", key, e))
            })
            .transpose()
    }

    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parse_opt(key)?.unwrap_or(default))
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_known_keys_and_ignores_the_rest() {
        let kv = KvArgs::parse(&raw(&["net=2", "colour=blue", "NODE=all"]), &["net", "node"]).unwrap();
        assert_eq!(kv.get("net"), Some("2"));
        assert_eq!(kv.get("node"), Some("all"));
        assert_eq!(kv.get("colour"), None);
    }

    #[test]
    fn typed_access_falls_back_to_default() {
        let kv = KvArgs::parse(&raw(&["user=3"]), &["user", "net"]).unwrap();
        assert_eq!(kv.parse_or::<u32>("user", 1).unwrap(), 3);
        assert_eq!(kv.parse_or::<u32>("net", 1).unwrap(), 1);
        assert!(kv.parse_opt::<u32>("net").unwrap().is_none());
    }

    #[test]
    fn skips_bare_words() {
        let kv = KvArgs::parse(&raw(&["verbose", "net=3", "amount"]), &["net", "amount"]).unwrap();
        assert_eq!(kv.get("net"), Some("3"));
        assert_eq!(kv.get("amount"), None);
        assert_eq!(kv.get("verbose"), None);
    }

    #[test]
    fn rejects_bad_values() {
        let kv = KvArgs::parse(&raw(&["user=two"]), &["user"]).unwrap();
        assert!(kv.parse_opt::<u32>("user").is_err());
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let kv = KvArgs::parse(&raw(&["validator=01ab=cd"]), &["validator"]).unwrap();
        assert_eq!(kv.get("validator"), Some("01ab=cd"));
    }
}
