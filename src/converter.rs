//! Converters between typed values and runtime records.
//!
//! The engine stores and ships [`RuntimeRecord`]s: a key slot and a value slot,
//! both [`Datum`]s. A [`Converter`] knows how a typed `T` occupies those slots:
//!
//! - [`ValueConverter`]: `T` lives in the value slot, the key slot is `Datum::Null`.
//! - [`KeyValueConverter`]: `(K, V)` is split across both slots.
//!
//! Which of the two a descriptor uses is decided when the descriptor is built and
//! is reported by [`Converter::output_shape`]; it never changes afterwards.
//! Converters hold no per-call state, so the engine may run them concurrently
//! over independent records.

use crate::datum::Datum;
use crate::error::ConversionError;
use crate::map_fn::SharedMapFn;
use crate::type_token::OutputShape;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Typed value -> runtime datum.
pub type EncodeFn<T> = Arc<dyn Fn(&T) -> Result<Datum, ConversionError> + Send + Sync>;

/// One record as the engine sees it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuntimeRecord {
    pub key: Datum,
    pub value: Datum,
}

impl RuntimeRecord {
    #[must_use]
    pub fn value(value: Datum) -> Self {
        Self {
            key: Datum::Null,
            value,
        }
    }

    #[must_use]
    pub fn key_value(key: Datum, value: Datum) -> Self {
        Self { key, value }
    }
}

pub trait Converter<T>: Send + Sync {
    /// Whether records carry a plain value or a key/value pair.
    fn output_shape(&self) -> OutputShape;

    /// Encode a typed value for transport or storage.
    ///
    /// # Errors
    /// Returns a [`ConversionError`] if the value cannot be represented.
    fn to_runtime(&self, value: &T) -> Result<RuntimeRecord, ConversionError>;

    /// Rebuild a typed value from a record delivered by the engine.
    ///
    /// # Errors
    /// Returns a [`ConversionError`] if the record does not match the declared type.
    fn from_runtime(&self, key: Datum, value: Datum) -> Result<T, ConversionError>;
}

/// Plain values in the value slot.
pub struct ValueConverter<T> {
    encode: EncodeFn<T>,
    decode: SharedMapFn<Datum, T>,
}

impl<T> ValueConverter<T> {
    pub fn new(encode: EncodeFn<T>, decode: SharedMapFn<Datum, T>) -> Self {
        Self { encode, decode }
    }
}

impl<T> Converter<T> for ValueConverter<T> {
    fn output_shape(&self) -> OutputShape {
        OutputShape::Value
    }

    fn to_runtime(&self, value: &T) -> Result<RuntimeRecord, ConversionError> {
        Ok(RuntimeRecord::value((self.encode)(value)?))
    }

    // The key slot is ignored: the engine is free to fill it with anything.
    fn from_runtime(&self, _key: Datum, value: Datum) -> Result<T, ConversionError> {
        self.decode.map(value)
    }
}

/// Pairs split across the key and value slots.
pub struct KeyValueConverter<K, V> {
    encode_key: EncodeFn<K>,
    decode_key: SharedMapFn<Datum, K>,
    encode_value: EncodeFn<V>,
    decode_value: SharedMapFn<Datum, V>,
}

impl<K, V> KeyValueConverter<K, V> {
    pub fn new(
        (encode_key, decode_key): (EncodeFn<K>, SharedMapFn<Datum, K>),
        (encode_value, decode_value): (EncodeFn<V>, SharedMapFn<Datum, V>),
    ) -> Self {
        Self {
            encode_key,
            decode_key,
            encode_value,
            decode_value,
        }
    }
}

impl<K, V> Converter<(K, V)> for KeyValueConverter<K, V> {
    fn output_shape(&self) -> OutputShape {
        OutputShape::KeyValue
    }

    fn to_runtime(&self, (k, v): &(K, V)) -> Result<RuntimeRecord, ConversionError> {
        Ok(RuntimeRecord::key_value(
            (self.encode_key)(k)?,
            (self.encode_value)(v)?,
        ))
    }

    fn from_runtime(&self, key: Datum, value: Datum) -> Result<(K, V), ConversionError> {
        Ok((self.decode_key.map(key)?, self.decode_value.map(value)?))
    }
}
