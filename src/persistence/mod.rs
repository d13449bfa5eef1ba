//! Persistence Module
//!
//! Snapshot shapes plus the serializer and storage collaborators.
//!
//! A snapshot is a map from key to entry that keeps store order. Binary
//! formats carry [`CacheEntry`] as is; text formats use [`PersistedEntry`],
//! whose expiration time is an explicit RFC 3339 string.

mod serializer;
mod storage;

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cache::CacheEntry;
use crate::error::PersistError;

pub use serializer::{Payload, SerializerKind};
pub use storage::{FileStorage, Storage};

// == Ordered Map ==
/// Key/value pairs serialized as a map, in their original order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<K, E>(pub Vec<(K, E)>);

impl<K, E> Serialize for OrderedMap<K, E>
where
    K: Serialize,
    E: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(key, entry)| (key, entry)))
    }
}

impl<'de, K, E> Deserialize<'de> for OrderedMap<K, E>
where
    K: Deserialize<'de>,
    E: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<K, E>(PhantomData<(K, E)>);

        impl<'de, K, E> Visitor<'de> for OrderedMapVisitor<K, E>
        where
            K: Deserialize<'de>,
            E: Deserialize<'de>,
        {
            type Value = OrderedMap<K, E>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of cache entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(pair) = map.next_entry()? {
                    pairs.push(pair);
                }
                Ok(OrderedMap(pairs))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

// == Persisted Entry ==
/// Text snapshot shape of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntry<V> {
    pub value: V,
    /// RFC 3339 expiration instant
    pub expiration_time: String,
    pub ttl: u64,
}

impl<'a, V> From<&'a CacheEntry<V>> for PersistedEntry<&'a V> {
    fn from(entry: &'a CacheEntry<V>) -> Self {
        PersistedEntry {
            value: &entry.value,
            expiration_time: entry
                .expiration_time
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ttl: entry.ttl,
        }
    }
}

impl<V> TryFrom<PersistedEntry<V>> for CacheEntry<V> {
    type Error = PersistError;

    fn try_from(persisted: PersistedEntry<V>) -> Result<Self, Self::Error> {
        let expiration_time = DateTime::parse_from_rfc3339(&persisted.expiration_time)
            .map_err(|source| PersistError::Timestamp {
                value: persisted.expiration_time.clone(),
                source,
            })?
            .with_timezone(&Utc);

        Ok(CacheEntry {
            value: persisted.value,
            expiration_time,
            ttl: persisted.ttl,
        })
    }
}

// == Snapshot Encoding ==
/// Encodes entries, in order, into a snapshot payload.
pub fn encode_entries<'a, V, I>(kind: SerializerKind, entries: I) -> Result<Payload, PersistError>
where
    V: Serialize + 'a,
    I: IntoIterator<Item = (&'a str, &'a CacheEntry<V>)>,
{
    if kind.is_binary() {
        kind.encode(&OrderedMap(entries.into_iter().collect()))
    } else {
        let shaped: Vec<(&str, PersistedEntry<&V>)> = entries
            .into_iter()
            .map(|(key, entry)| (key, PersistedEntry::from(entry)))
            .collect();
        kind.encode(&OrderedMap(shaped))
    }
}

/// Decodes a snapshot payload into entries in their saved order.
pub fn decode_entries<V>(
    kind: SerializerKind,
    payload: &Payload,
) -> Result<Vec<(String, CacheEntry<V>)>, PersistError>
where
    V: DeserializeOwned,
{
    if kind.is_binary() {
        let OrderedMap(entries) = kind.decode::<OrderedMap<String, CacheEntry<V>>>(payload)?;
        Ok(entries)
    } else {
        let OrderedMap(shaped) = kind.decode::<OrderedMap<String, PersistedEntry<V>>>(payload)?;
        shaped
            .into_iter()
            .map(|(key, persisted)| Ok((key, CacheEntry::try_from(persisted)?)))
            .collect()
    }
}
