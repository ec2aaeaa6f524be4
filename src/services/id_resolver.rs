//! Thermostat identifier resolution
//!
//! Callers rarely have a full SDM device path at hand. Every listing registers
//! a handful of aliases (ordinal, short id, `thermostat-N`) that later calls
//! can use instead. Aliases are only as stable as the listing that produced
//! them: a later listing overwrites ordinal and short-id keys.

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const SUFFIX_MATCH_MIN_LEN: usize = 4;

/// Shorten a long device ID for display, keeping the last 8 characters
pub fn shorten_device_id(device_id: &str) -> String {
    if device_id.contains('/') {
        let tail = device_id.rsplit('/').next().unwrap_or(device_id);
        return ellipsize(tail, 8);
    }
    ellipsize(device_id, 12)
}

fn ellipsize(value: &str, max: usize) -> String {
    let len = value.chars().count();
    if len > max {
        let tail: String = value.chars().skip(len - 8).collect();
        format!("...{tail}")
    } else {
        value.to_string()
    }
}

/// Alias table that iterates in first-insertion order
#[derive(Debug, Default, Clone)]
pub struct AliasCache {
    order: Vec<String>,
    map: HashMap<String, String>,
}

impl AliasCache {
    pub fn insert(&mut self, alias: String, full_id: String) {
        if !self.map.contains_key(&alias) {
            self.order.push(alias.clone());
        }
        self.map.insert(alias, full_id);
    }

    pub fn get(&self, alias: &str) -> Option<&String> {
        self.map.get(alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.order
            .iter()
            .filter_map(|key| self.map.get(key).map(|id| (key, id)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Owner of the alias cache, shared by the tool layer
#[derive(Debug, Default)]
pub struct ThermostatIdResolver {
    cache: RwLock<AliasCache>,
}

impl ThermostatIdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the aliases for a device listed at 1-based `index`
    pub async fn cache_identifiers(&self, full_id: &str, index: usize) {
        let short_id = shorten_device_id(full_id);
        let aliases = [
            short_id.clone(),
            short_id.trim_start_matches('.').to_string(),
            index.to_string(),
            format!("thermostat-{index}"),
            format!("thermostat {index}"),
            full_id.to_string(),
        ];

        let mut cache = self.cache.write().await;
        for alias in aliases {
            cache.insert(alias, full_id.to_string());
        }
    }

    /// Map a caller-supplied identifier to a full device ID.
    ///
    /// Never fails: an identifier nothing matches is returned unchanged and
    /// left for the backend to reject.
    pub async fn resolve(&self, thermostat_id: &str) -> String {
        let cache = self.cache.read().await;

        if let Some(full_id) = cache.get(thermostat_id) {
            return full_id.clone();
        }

        let normalized = thermostat_id.trim().to_lowercase();
        if let Some((_, full_id)) = cache.iter().find(|(key, _)| key.to_lowercase() == normalized)
        {
            return full_id.clone();
        }

        if thermostat_id.contains("enterprises") || thermostat_id.contains("devices") {
            return thermostat_id.to_string();
        }

        if thermostat_id.chars().count() >= SUFFIX_MATCH_MIN_LEN {
            let suffix = thermostat_id.trim_start_matches('.');
            if let Some((key, full_id)) = cache.iter().find(|(key, _)| key.ends_with(suffix)) {
                debug!("Resolved {thermostat_id} by suffix of alias {key}");
                return full_id.clone();
            }
        }

        warn!("Could not resolve thermostat ID: {thermostat_id}");
        thermostat_id.to_string()
    }

    /// Snapshot of the current aliases in iteration order
    pub async fn aliases(&self) -> Vec<(String, String)> {
        self.cache
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SDM_ID: &str = "enterprises/p/devices/ABCDEFGHIJKL";

    #[rstest]
    #[case(SDM_ID, "...EFGHIJKL")]
    #[case("enterprises/p/devices/SHORT", "SHORT")]
    #[case("enterprises/p/devices/12345678", "12345678")]
    #[case("thermostat-1", "thermostat-1")]
    #[case("abcdefghijklm", "...fghijklm")]
    #[case("abcdefghijkl", "abcdefghijkl")]
    fn test_shorten_device_id(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(shorten_device_id(input), expected);
    }

    #[tokio::test]
    async fn test_cache_registers_all_aliases() {
        let resolver = ThermostatIdResolver::new();
        resolver.cache_identifiers(SDM_ID, 2).await;

        let keys: Vec<String> = resolver.aliases().await.into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "...EFGHIJKL",
                "EFGHIJKL",
                "2",
                "thermostat-2",
                "thermostat 2",
                SDM_ID
            ]
        );
        assert_eq!(resolver.resolve("2").await, SDM_ID);
        assert_eq!(resolver.resolve("...EFGHIJKL").await, SDM_ID);
        assert_eq!(resolver.resolve("EFGHIJKL").await, SDM_ID);
    }

    #[tokio::test]
    async fn test_case_insensitive_and_trimmed() {
        let resolver = ThermostatIdResolver::new();
        resolver.cache_identifiers(SDM_ID, 1).await;

        assert_eq!(resolver.resolve("Thermostat 1").await, SDM_ID);
        assert_eq!(resolver.resolve("  THERMOSTAT-1 ").await, SDM_ID);
        assert_eq!(resolver.resolve("efghijkl").await, SDM_ID);
    }

    #[tokio::test]
    async fn test_full_paths_pass_through() {
        let resolver = ThermostatIdResolver::new();
        let other = "enterprises/p/devices/NOT-LISTED";
        assert_eq!(resolver.resolve(other).await, other);
    }

    #[tokio::test]
    async fn test_suffix_match() {
        let resolver = ThermostatIdResolver::new();
        resolver.cache_identifiers(SDM_ID, 1).await;

        assert_eq!(resolver.resolve("IJKL").await, SDM_ID);
        assert_eq!(resolver.resolve("..HIJKL").await, SDM_ID);
    }

    #[tokio::test]
    async fn test_short_unknown_ids_pass_through() {
        let resolver = ThermostatIdResolver::new();
        resolver.cache_identifiers(SDM_ID, 1).await;

        assert_eq!(resolver.resolve("JKL").await, "JKL");
        assert_eq!(resolver.resolve("9").await, "9");
        assert_eq!(resolver.resolve("zzzzzz").await, "zzzzzz");
    }

    #[tokio::test]
    async fn test_later_listing_overwrites_ordinals() {
        let resolver = ThermostatIdResolver::new();
        resolver.cache_identifiers("thermostat-1", 1).await;
        resolver.cache_identifiers("thermostat-2", 2).await;
        assert_eq!(resolver.resolve("1").await, "thermostat-1");

        resolver.cache_identifiers("thermostat-2", 1).await;
        assert_eq!(resolver.resolve("1").await, "thermostat-2");
        assert_eq!(resolver.resolve("thermostat-1").await, "thermostat-2");

        // position of a key survives the overwrite
        let keys: Vec<String> = resolver.aliases().await.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys[0], "thermostat-1");
    }

    #[tokio::test]
    async fn test_first_match_wins_on_ambiguous_suffix() {
        let resolver = ThermostatIdResolver::new();
        resolver
            .cache_identifiers("enterprises/p/devices/AAAA1234", 1)
            .await;
        resolver
            .cache_identifiers("enterprises/p/devices/BBBB1234", 2)
            .await;

        assert_eq!(
            resolver.resolve("1234").await,
            "enterprises/p/devices/AAAA1234"
        );
    }
}
