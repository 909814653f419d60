//! Serialization families.
//!
//! A family decides how atomic values are laid out in the runtime
//! representation. Every atomic [`PType`] is obtained from one, and composites
//! refuse to mix families, so a pipeline's records are encoded consistently.
//!
//! - [`Native`]: structural [`Datum`](crate::datum::Datum) variants. The runtime
//!   order of keys matches the value order, which is what shuffles sort by default.
//! - [`Postcard`]: any serde type, `postcard`-encoded into `Datum::Bytes`. Also
//!   provides [`Postcard::records`] for user structs. Byte order is not value order.
//!
//! ```
//! use ironbeam_types::*;
//!
//! let table = Native.table_of(&Native.strings(), &Native.longs())?;
//! assert_eq!(table.family(), Family::Native);
//!
//! // mixing families is caught when the composite is built
//! assert!(Native.pairs(&Native.strings(), &Postcard.longs()).is_err());
//! # Ok::<(), TypeError>(())
//! ```

mod native;
mod postcard;

pub use native::{Native, NativeValue};
pub use postcard::Postcard;

use crate::descriptor::{Family, TypeDescriptor};
use crate::error::{Result, TypeError};
use crate::ptype::{PBound, PType, TableType, collections, pairs, table_of};

pub trait PTypeFamily: Copy + Send + Sync + 'static {
    fn family(&self) -> Family;

    fn strings(&self) -> PType<String>;
    fn longs(&self) -> PType<i64>;
    fn ints(&self) -> PType<i32>;
    fn doubles(&self) -> PType<f64>;
    fn booleans(&self) -> PType<bool>;
    fn bytes(&self) -> PType<Vec<u8>>;

    /// # Errors
    /// [`TypeError::FamilyMismatch`] unless both sub-types belong to this family.
    fn pairs<A: PBound, B: PBound>(&self, a: &PType<A>, b: &PType<B>) -> Result<PType<(A, B)>> {
        self.check(a)?;
        self.check(b)?;
        pairs(a, b)
    }

    /// # Errors
    /// [`TypeError::FamilyMismatch`] unless both sub-types belong to this family.
    fn table_of<K: PBound, V: PBound>(
        &self,
        key: &PType<K>,
        value: &PType<V>,
    ) -> Result<TableType<K, V>> {
        self.check(key)?;
        self.check(value)?;
        table_of(key, value)
    }

    /// # Errors
    /// [`TypeError::FamilyMismatch`] unless `elem` belongs to this family.
    fn collections<T: PBound>(&self, elem: &PType<T>) -> Result<PType<Vec<T>>> {
        self.check(elem)?;
        collections(elem)
    }

    /// # Errors
    /// [`TypeError::FamilyMismatch`] if `ptype` was built by another family.
    fn check(&self, ptype: &dyn TypeDescriptor) -> Result<()> {
        if ptype.family() == self.family() {
            Ok(())
        } else {
            Err(TypeError::FamilyMismatch {
                left: self.family(),
                right: ptype.family(),
            })
        }
    }
}
