//! Erased type descriptors.
//!
//! A [`Descriptor`] is the generic-free view of a typed shape: its kind (atomic,
//! pair, collection, table, grouped), the serialization [`Family`] that built it,
//! the [`ShapeTag`] its converter produces, and its ordered sub-descriptors.
//!
//! Descriptors are what the engine, targets and the pipeline inspect. The typed
//! side ([`PType<T>`](crate::ptype::PType) and friends) carries the generic
//! parameter from the construction call site and hands out its descriptor via
//! [`TypeDescriptor::descriptor`].
//!
//! Composite descriptors are only built from sub-descriptors, and
//! [`Descriptor::composite`] refuses to mix families.

use crate::error::{Result, TypeError};
use crate::target::Target;
use crate::type_token::{ShapeTag, TypeTag};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::path::Path;
use std::sync::Arc;

/// Which serialization family produced a descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Values map onto structural [`Datum`](crate::datum::Datum) variants.
    Native,
    /// Values are `postcard`-encoded into `Datum::Bytes`.
    Postcard,
}

impl Family {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Family::Native => "native",
            Family::Postcard => "postcard",
        }
    }

    /// The engine resource a job must provide to shuffle this family's records.
    #[must_use]
    pub fn codec_resource(self) -> &'static str {
        match self {
            Family::Native => "codec.native",
            Family::Postcard => "codec.postcard",
        }
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Atomic,
    Pair,
    Collection,
    Table,
    Grouped,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct DescriptorInner {
    kind: DescriptorKind,
    family: Family,
    shape: ShapeTag,
    sub_types: Vec<Descriptor>,
}

/// Cheaply cloneable, immutable description of a typed shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Descriptor(Arc<DescriptorInner>);

impl Descriptor {
    #[must_use]
    pub fn atomic(family: Family, shape: ShapeTag) -> Self {
        Self(Arc::new(DescriptorInner {
            kind: DescriptorKind::Atomic,
            family,
            shape,
            sub_types: Vec::new(),
        }))
    }

    /// Build a composite from its sub-descriptors.
    ///
    /// # Errors
    /// [`TypeError::FamilyMismatch`] if the sub-descriptors come from different
    /// families, [`TypeError::UnsupportedShape`] if there are none.
    pub fn composite(
        kind: DescriptorKind,
        shape: ShapeTag,
        sub_types: Vec<Descriptor>,
    ) -> Result<Self> {
        let Some(first) = sub_types.first() else {
            return Err(TypeError::unsupported(
                shape.tag.name,
                "a composite needs at least one sub-type",
            ));
        };
        let family = first.family();
        if let Some(other) = sub_types.iter().find(|d| d.family() != family) {
            return Err(TypeError::FamilyMismatch {
                left: family,
                right: other.family(),
            });
        }
        Ok(Self(Arc::new(DescriptorInner {
            kind,
            family,
            shape,
            sub_types,
        })))
    }

    /// A descriptor of another kind and shape over the same family and sub-types.
    pub(crate) fn derive(&self, kind: DescriptorKind, shape: ShapeTag) -> Self {
        Self(Arc::new(DescriptorInner {
            kind,
            family: self.family(),
            shape,
            sub_types: self.sub_types().to_vec(),
        }))
    }

    #[must_use]
    pub fn kind(&self) -> DescriptorKind {
        self.0.kind
    }

    #[must_use]
    pub fn family(&self) -> Family {
        self.0.family
    }

    #[must_use]
    pub fn shape(&self) -> ShapeTag {
        self.0.shape
    }

    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        self.0.shape.tag
    }

    #[must_use]
    pub fn sub_types(&self) -> &[Descriptor] {
        &self.0.sub_types
    }

    /// The file target a value of this shape is written to when no target is given.
    ///
    /// # Errors
    /// Grouped descriptors have no flattened form and always fail with
    /// [`TypeError::UnsupportedShape`]; so does every descriptor when no file
    /// target backend is compiled in.
    pub fn default_target(&self, path: &Path) -> Result<Box<dyn Target>> {
        if self.kind() == DescriptorKind::Grouped {
            return Err(grouped_write_error(self.type_tag().name));
        }
        default_file_target(path)
    }
}

impl Display for Descriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "{:?}<{}>[{}]", self.kind(), self.shape(), self.family())
    }
}

pub(crate) fn grouped_write_error(type_name: &str) -> TypeError {
    TypeError::unsupported(
        type_name,
        "grouped tables cannot be written out directly; ungroup or aggregate first",
    )
}

#[cfg(feature = "io-jsonl")]
fn default_file_target(path: &Path) -> Result<Box<dyn Target>> {
    Ok(Box::new(crate::io::jsonl::JsonlTarget::new(path)))
}

#[cfg(not(feature = "io-jsonl"))]
fn default_file_target(path: &Path) -> Result<Box<dyn Target>> {
    Err(TypeError::unsupported(
        path.display().to_string(),
        "no file target backend is enabled (feature `io-jsonl`)",
    ))
}

/// The engine-facing view shared by every typed descriptor.
pub trait TypeDescriptor: Send + Sync {
    fn descriptor(&self) -> &Descriptor;

    fn family(&self) -> Family {
        self.descriptor().family()
    }

    fn sub_types(&self) -> &[Descriptor] {
        self.descriptor().sub_types()
    }

    fn shape(&self) -> ShapeTag {
        self.descriptor().shape()
    }

    fn type_name(&self) -> &'static str {
        self.descriptor().type_tag().name
    }

    /// # Errors
    /// See [`Descriptor::default_target`].
    fn default_target(&self, path: &Path) -> Result<Box<dyn Target>> {
        self.descriptor().default_target(path)
    }
}

impl TypeDescriptor for Descriptor {
    fn descriptor(&self) -> &Descriptor {
        self
    }
}
