//! On-medium key layout.
//!
//! Every key starts with the owning collection's scope byte followed by a
//! subtable tag, so one flat byte-ordered medium holds all collections:
//!
//! - `[scope, MAIN] ++ encode(primary_key)` — a record.
//! - `[scope, INDEX, d] ++ encode(index_value) ++ encode(primary_key)` — an
//!   index entry; `d` is the index's position in the persisted index list.
//! - the empty key — the schema manifest singleton.
//!
//! Exact-match index lookups are prefix scans: bincode length-prefixes
//! variable-size data, so two distinct index values never share a prefix.

use bincode::config::{self, Configuration};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::StoreError;

const MAIN: u8 = 0;
const INDEX: u8 = 1;

fn configuration() -> Configuration {
    config::standard()
}

pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serde::encode_to_vec(value, configuration())?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, configuration())?;
    Ok(value)
}

/// The reserved key of the schema manifest singleton.
pub(crate) fn manifest_key() -> Vec<u8> {
    Vec::new()
}

/// Prefix covering every record of a collection.
pub(crate) fn main_prefix(scope: u8) -> Vec<u8> {
    vec![scope, MAIN]
}

/// The key of a single record, from its already-encoded primary key.
pub(crate) fn main_key(scope: u8, key_bytes: &[u8]) -> Vec<u8> {
    let mut key = main_prefix(scope);
    key.extend_from_slice(key_bytes);
    key
}

/// Prefix covering every entry of one index that matches one value exactly.
pub(crate) fn index_value_prefix(scope: u8, discriminator: u8, value_bytes: &[u8]) -> Vec<u8> {
    let mut key = vec![scope, INDEX, discriminator];
    key.extend_from_slice(value_bytes);
    key
}

/// The key of a single index entry.
pub(crate) fn index_key(
    scope: u8,
    discriminator: u8,
    value_bytes: &[u8],
    key_bytes: &[u8],
) -> Vec<u8> {
    let mut key = index_value_prefix(scope, discriminator, value_bytes);
    key.extend_from_slice(key_bytes);
    key
}
