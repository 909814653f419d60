use super::PTypeFamily;
use crate::converter::EncodeFn;
use crate::datum::Datum;
use crate::descriptor::Family;
use crate::error::ConversionError;
use crate::map_fn::fn_map;
use crate::ptype::PType;
use ordered_float::OrderedFloat;
use std::any::type_name;
use std::sync::Arc;

/// Values with a structural runtime form.
pub trait NativeValue: Sized + Send + Sync + 'static {
    /// Name of the `Datum` variant the value is stored as.
    const DATUM_KIND: &'static str;

    fn to_datum(&self) -> Datum;

    /// `None` when `datum` is the wrong variant or out of range.
    fn from_datum(datum: Datum) -> Option<Self>;
}

macro_rules! native_value {
    ($t:ty, $kind:literal, |$v:ident| $to:expr, $pat:pat => $from:expr) => {
        impl NativeValue for $t {
            const DATUM_KIND: &'static str = $kind;

            fn to_datum(&self) -> Datum {
                let $v = self;
                $to
            }

            fn from_datum(datum: Datum) -> Option<Self> {
                match datum {
                    $pat => $from,
                    _ => None,
                }
            }
        }
    };
}

native_value!(String, "text", |v| Datum::Text(v.clone()), Datum::Text(s) => Some(s));
native_value!(i64, "int", |v| Datum::Int(*v), Datum::Int(i) => Some(i));
// Widened on the way out; values outside i32 fail to narrow back.
native_value!(i32, "int", |v| Datum::Int(i64::from(*v)), Datum::Int(i) => i32::try_from(i).ok());
native_value!(f64, "float", |v| Datum::Float(OrderedFloat(*v)), Datum::Float(x) => Some(x.0));
native_value!(bool, "bool", |v| Datum::Bool(*v), Datum::Bool(b) => Some(b));
native_value!(Vec<u8>, "bytes", |v| Datum::Bytes(v.clone()), Datum::Bytes(b) => Some(b));

/// The structural family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Native;

impl Native {
    /// The atomic descriptor for any [`NativeValue`].
    #[must_use]
    pub fn atomic<T: NativeValue>(self) -> PType<T> {
        let encode: EncodeFn<T> =
            Arc::new(|v: &T| -> Result<Datum, ConversionError> { Ok(v.to_datum()) });
        let decode = fn_map(|datum: Datum| -> Result<T, ConversionError> {
            let found = datum.kind();
            T::from_datum(datum)
                .ok_or_else(|| ConversionError::new(type_name::<T>(), T::DATUM_KIND, found))
        });
        PType::atomic(Family::Native, encode, decode)
    }
}

impl PTypeFamily for Native {
    fn family(&self) -> Family {
        Family::Native
    }

    fn strings(&self) -> PType<String> {
        self.atomic()
    }

    fn longs(&self) -> PType<i64> {
        self.atomic()
    }

    fn ints(&self) -> PType<i32> {
        self.atomic()
    }

    fn doubles(&self) -> PType<f64> {
        self.atomic()
    }

    fn booleans(&self) -> PType<bool> {
        self.atomic()
    }

    fn bytes(&self) -> PType<Vec<u8>> {
        self.atomic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_refuse_to_narrow_out_of_range() {
        let err = Native.ints().decode(Datum::Int(i64::MAX)).unwrap_err();
        assert_eq!(err.expected, "int");
        assert_eq!(err.type_name, "i32");
    }

    #[test]
    fn wrong_variant_reports_what_was_found() {
        let err = Native.strings().decode(Datum::Bool(true)).unwrap_err();
        assert_eq!(err.found, "bool");
    }
}
