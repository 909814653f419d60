use super::PTypeFamily;
use crate::converter::EncodeFn;
use crate::datum::Datum;
use crate::descriptor::Family;
use crate::error::ConversionError;
use crate::map_fn::fn_map;
use crate::ptype::{PBound, PType};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::type_name;
use std::sync::Arc;

/// The serde family: values are `postcard`-encoded into `Datum::Bytes`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Postcard;

impl Postcard {
    /// The descriptor for any serde type, typically a user record struct.
    #[must_use]
    pub fn records<T>(self) -> PType<T>
    where
        T: PBound + Serialize + DeserializeOwned,
    {
        let encode: EncodeFn<T> = Arc::new(|v: &T| -> Result<Datum, ConversionError> {
            postcard::to_allocvec(v)
                .map(Datum::Bytes)
                .map_err(|e| {
                    ConversionError::new(type_name::<T>(), "serializable value", e.to_string())
                })
        });
        let decode = fn_map(|datum: Datum| -> Result<T, ConversionError> {
            match datum {
                Datum::Bytes(bytes) => postcard::from_bytes(&bytes).map_err(|e| {
                    ConversionError::new(type_name::<T>(), "postcard bytes", format!("bytes ({e})"))
                }),
                other => Err(ConversionError::new(type_name::<T>(), "bytes", other.kind())),
            }
        });
        PType::atomic(Family::Postcard, encode, decode)
    }
}

impl PTypeFamily for Postcard {
    fn family(&self) -> Family {
        Family::Postcard
    }

    fn strings(&self) -> PType<String> {
        self.records()
    }

    fn longs(&self) -> PType<i64> {
        self.records()
    }

    fn ints(&self) -> PType<i32> {
        self.records()
    }

    fn doubles(&self) -> PType<f64> {
        self.records()
    }

    fn booleans(&self) -> PType<bool> {
        self.records()
    }

    fn bytes(&self) -> PType<Vec<u8>> {
        self.records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_bytes_are_a_conversion_error() -> anyhow::Result<()> {
        let strings = Postcard.strings();
        let Datum::Bytes(mut bytes) = strings.encode(&"hello".to_string())? else {
            panic!("postcard values are bytes");
        };
        bytes.truncate(2);
        let err = strings.decode(Datum::Bytes(bytes)).unwrap_err();
        assert_eq!(err.expected, "postcard bytes");
        Ok(())
    }
}
