//! Typed descriptors.
//!
//! [`PType<T>`] declares how values of `T` cross into the runtime representation:
//! it bundles a [`Descriptor`], a [`Converter`], the decoding [`MapFn`] used by the
//! engine and the matching encoder. Atomic `PType`s come from a
//! [`PTypeFamily`](crate::family::PTypeFamily); composites are built from them:
//!
//! - [`pairs`]: `(A, B)` stored as a single `Datum::Pair` value.
//! - [`collections`]: `Vec<T>` stored as a `Datum::List`.
//! - [`table_of`]: `(K, V)` split across the record key and value slots; the
//!   input to a group-by.
//!
//! ```
//! use ironbeam_types::*;
//!
//! let words = Native.strings();
//! let counts = Native.longs();
//! let table = table_of(&words, &counts)?;
//! assert_eq!(table.sub_types(), &[words.descriptor().clone(), counts.descriptor().clone()]);
//! # Ok::<(), ironbeam_types::TypeError>(())
//! ```

use crate::converter::{Converter, EncodeFn, KeyValueConverter, ValueConverter};
use crate::datum::Datum;
use crate::descriptor::{Descriptor, DescriptorKind, Family, TypeDescriptor};
use crate::error::{ConversionError, Result};
use crate::grouped::GroupedType;
use crate::map_fn::{MapFn, SharedMapFn, fn_map};
use crate::type_token::{OutputShape, ShapeTag};
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::sync::Arc;

/// Bound shared by every value type a descriptor can carry.
pub trait PBound: Send + Sync + 'static {}
impl<T> PBound for T where T: Send + Sync + 'static {}

pub struct PType<T> {
    descriptor: Descriptor,
    converter: Arc<dyn Converter<T>>,
    input_fn: SharedMapFn<Datum, T>,
    encode: EncodeFn<T>,
}

impl<T> Clone for PType<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            converter: Arc::clone(&self.converter),
            input_fn: Arc::clone(&self.input_fn),
            encode: Arc::clone(&self.encode),
        }
    }
}

impl<T> Debug for PType<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("PType")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl<T: PBound> PType<T> {
    /// An atomic type of `family` with the given encoder and decoder.
    pub fn atomic(family: Family, encode: EncodeFn<T>, decode: SharedMapFn<Datum, T>) -> Self {
        Self::from_parts(
            Descriptor::atomic(family, ShapeTag::value_of::<T>()),
            encode,
            decode,
        )
    }

    fn from_parts(
        descriptor: Descriptor,
        encode: EncodeFn<T>,
        decode: SharedMapFn<Datum, T>,
    ) -> Self {
        let converter: Arc<dyn Converter<T>> =
            Arc::new(ValueConverter::new(Arc::clone(&encode), Arc::clone(&decode)));
        Self {
            descriptor,
            converter,
            input_fn: decode,
            encode,
        }
    }

    #[must_use]
    pub fn converter(&self) -> Arc<dyn Converter<T>> {
        Arc::clone(&self.converter)
    }

    /// The runtime -> typed conversion function.
    #[must_use]
    pub fn input_fn(&self) -> SharedMapFn<Datum, T> {
        Arc::clone(&self.input_fn)
    }

    pub(crate) fn encoder(&self) -> EncodeFn<T> {
        Arc::clone(&self.encode)
    }

    /// # Errors
    /// Returns a [`ConversionError`] if `value` cannot be represented.
    pub fn encode(&self, value: &T) -> std::result::Result<Datum, ConversionError> {
        (self.encode)(value)
    }

    /// # Errors
    /// Returns a [`ConversionError`] if `datum` does not match this type.
    pub fn decode(&self, datum: Datum) -> std::result::Result<T, ConversionError> {
        self.input_fn.map(datum)
    }
}

impl<T: PBound> TypeDescriptor for PType<T> {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}

/// `(A, B)` as one `Datum::Pair` value.
///
/// # Errors
/// [`TypeError::FamilyMismatch`](crate::TypeError::FamilyMismatch) if `a` and `b`
/// come from different families.
pub fn pairs<A: PBound, B: PBound>(a: &PType<A>, b: &PType<B>) -> Result<PType<(A, B)>> {
    let descriptor = Descriptor::composite(
        DescriptorKind::Pair,
        ShapeTag::value_of::<(A, B)>(),
        vec![a.descriptor.clone(), b.descriptor.clone()],
    )?;

    let (enc_a, enc_b) = (a.encoder(), b.encoder());
    let encode: EncodeFn<(A, B)> = Arc::new(
        move |(x, y): &(A, B)| -> std::result::Result<Datum, ConversionError> {
            Ok(Datum::pair(enc_a(x)?, enc_b(y)?))
        },
    );

    let (dec_a, dec_b) = (a.input_fn(), b.input_fn());
    let name = descriptor.type_tag().name;
    let decode = fn_map(
        move |datum: Datum| -> std::result::Result<(A, B), ConversionError> {
            match datum {
                Datum::Pair(x, y) => Ok((dec_a.map(*x)?, dec_b.map(*y)?)),
                other => Err(ConversionError::new(name, "pair", other.kind())),
            }
        },
    );

    Ok(PType::from_parts(descriptor, encode, decode))
}

/// `Vec<T>` as one `Datum::List` value.
///
/// # Errors
/// Never fails for a single element type; the `Result` matches the other composites.
pub fn collections<T: PBound>(elem: &PType<T>) -> Result<PType<Vec<T>>> {
    let descriptor = Descriptor::composite(
        DescriptorKind::Collection,
        ShapeTag::value_of::<Vec<T>>(),
        vec![elem.descriptor.clone()],
    )?;

    let enc = elem.encoder();
    let encode: EncodeFn<Vec<T>> = Arc::new(
        move |items: &Vec<T>| -> std::result::Result<Datum, ConversionError> {
            items
                .iter()
                .map(|i| enc(i))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Datum::List)
        },
    );

    let dec = elem.input_fn();
    let name = descriptor.type_tag().name;
    let decode = fn_map(
        move |datum: Datum| -> std::result::Result<Vec<T>, ConversionError> {
            match datum {
                Datum::List(items) => items.into_iter().map(|i| dec.map(i)).collect(),
                other => Err(ConversionError::new(name, "list", other.kind())),
            }
        },
    );

    Ok(PType::from_parts(descriptor, encode, decode))
}

struct TableInner<K, V> {
    key: PType<K>,
    value: PType<V>,
    descriptor: Descriptor,
    converter: Arc<dyn Converter<(K, V)>>,
    grouping_converter: Arc<dyn Converter<(K, V)>>,
}

/// A key/value descriptor: records keep `K` in the key slot and `V` in the value slot.
///
/// Cloning is cheap and shares the same underlying descriptor.
pub struct TableType<K, V> {
    inner: Arc<TableInner<K, V>>,
}

impl<K, V> Clone for TableType<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Debug for TableType<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("TableType")
            .field("descriptor", &self.inner.descriptor)
            .finish_non_exhaustive()
    }
}

/// A table over `key` and `value`.
///
/// # Errors
/// [`TypeError::FamilyMismatch`](crate::TypeError::FamilyMismatch) if the two
/// types come from different families.
pub fn table_of<K: PBound, V: PBound>(key: &PType<K>, value: &PType<V>) -> Result<TableType<K, V>> {
    let descriptor = Descriptor::composite(
        DescriptorKind::Table,
        ShapeTag::key_value_of::<(K, V)>(),
        vec![key.descriptor.clone(), value.descriptor.clone()],
    )?;
    let converter: Arc<dyn Converter<(K, V)>> = Arc::new(KeyValueConverter::new(
        (key.encoder(), key.input_fn()),
        (value.encoder(), value.input_fn()),
    ));
    Ok(TableType {
        inner: Arc::new(TableInner {
            key: key.clone(),
            value: value.clone(),
            descriptor,
            grouping_converter: Arc::clone(&converter),
            converter,
        }),
    })
}

impl<K: PBound, V: PBound> TableType<K, V> {
    #[must_use]
    pub fn key_type(&self) -> &PType<K> {
        &self.inner.key
    }

    #[must_use]
    pub fn value_type(&self) -> &PType<V> {
        &self.inner.value
    }

    #[must_use]
    pub fn converter(&self) -> Arc<dyn Converter<(K, V)>> {
        Arc::clone(&self.inner.converter)
    }

    /// The converter the shuffle uses when comparing records.
    #[must_use]
    pub fn grouping_converter(&self) -> Arc<dyn Converter<(K, V)>> {
        Arc::clone(&self.inner.grouping_converter)
    }

    /// A copy of this table whose shuffle compares records through `converter`.
    ///
    /// The record converter is unchanged, so stored records look the same; only
    /// the keys handed to partitioners and comparators differ. `converter` must
    /// produce key/value records; [`GroupedType::configure_shuffle`] rejects it
    /// otherwise.
    #[must_use]
    pub fn with_grouping_converter(&self, converter: Arc<dyn Converter<(K, V)>>) -> Self {
        Self {
            inner: Arc::new(TableInner {
                key: self.inner.key.clone(),
                value: self.inner.value.clone(),
                descriptor: self.inner.descriptor.clone(),
                converter: Arc::clone(&self.inner.converter),
                grouping_converter: converter,
            }),
        }
    }

    /// The type of this table after a group-by.
    #[must_use]
    pub fn grouped(&self) -> GroupedType<K, V> {
        GroupedType::new(self)
    }

    /// Record-level decoding function: `(key, value)` datums to `(K, V)`.
    #[must_use]
    pub fn input_fn(&self) -> SharedMapFn<(Datum, Datum), (K, V)> {
        let converter = self.converter();
        fn_map(move |(k, v): (Datum, Datum)| converter.from_runtime(k, v))
    }

    #[must_use]
    pub fn output_shape(&self) -> OutputShape {
        self.inner.converter.output_shape()
    }
}

impl<K: PBound, V: PBound> TypeDescriptor for TableType<K, V> {
    fn descriptor(&self) -> &Descriptor {
        &self.inner.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeError;
    use crate::family::{Native, PTypeFamily, Postcard};

    #[test]
    fn pair_sub_types_keep_order() -> Result<()> {
        let a = Native.strings();
        let b = Native.longs();
        let p = pairs(&a, &b)?;
        assert_eq!(p.sub_types(), &[a.descriptor().clone(), b.descriptor().clone()]);
        assert_eq!(p.family(), Family::Native);
        assert_eq!(p.descriptor().kind(), DescriptorKind::Pair);
        Ok(())
    }

    #[test]
    fn mixed_families_are_rejected() {
        let err = pairs(&Native.strings(), &Postcard.longs()).unwrap_err();
        assert!(matches!(
            err,
            TypeError::FamilyMismatch {
                left: Family::Native,
                right: Family::Postcard
            }
        ));
    }

    #[test]
    fn pair_decode_rejects_non_pairs() -> Result<()> {
        let p = pairs(&Native.strings(), &Native.longs())?;
        let err = p.decode(Datum::Int(3)).unwrap_err();
        assert_eq!(err.expected, "pair");
        assert_eq!(err.found, "int");
        Ok(())
    }

    #[test]
    fn table_converter_splits_slots() -> Result<()> {
        let t = table_of(&Native.strings(), &Native.longs())?;
        let rec = t.converter().to_runtime(&("k".to_string(), 7))?;
        assert_eq!(rec.key, Datum::from("k"));
        assert_eq!(rec.value, Datum::Int(7));
        assert_eq!(t.output_shape(), OutputShape::KeyValue);
        Ok(())
    }
}
