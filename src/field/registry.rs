//! Registry of field types.
//!
//! This module provides the [`FieldRegistry`], which maps a field-type tag (`time_delta`,
//! `float`, ...) to the functions that construct and read fields of that type. The owning
//! [`crate::Dataset`] only ever creates fields through the registry, so it never
//! special-cases a concrete type.
//!
//! # Key Components
//!
//! - [`FieldRegistry`] - Tag to descriptor map, with a process-wide instance
//! - [`FieldDescriptor`] - Tag plus constructor and reader functions
//! - [`FieldFactory`] - Implemented by field types to derive a descriptor
//!
//! # Thread Safety
//!
//! The registry is backed by a `DashMap` and can be read and extended from any thread.
//! The process-wide instance is created on first use and seeded with the built-in types.
//!
//! # Examples
//!
//! ```rust
//! use obsdata::{FieldConfig, FieldValue, field::FieldRegistry};
//!
//! let registry = FieldRegistry::global();
//! let field = registry.construct(
//!     "float",
//!     3,
//!     "residual",
//!     FieldValue::Floats(vec![0.1, -0.2, 0.05]),
//!     FieldConfig::new().with_unit("meter"),
//! )?;
//!
//! assert_eq!(field.tag(), "float");
//! assert_eq!(field.num_obs(), 3);
//! # Ok::<(), obsdata::Error>(())
//! ```

use std::{fmt, sync::OnceLock};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    config::FieldConfig,
    field::{BoolField, FieldType, FieldValue, FloatField, PositionField, TextField, TimeDeltaField},
    memo::ReadMemo,
    store::Group,
    Error, Result,
};

/// Builds a field from `num_obs`, a name, raw values and construction arguments
pub type ConstructFn = fn(usize, &str, FieldValue, &FieldConfig) -> Result<Box<dyn FieldType>>;

/// Reads a field from a store group
pub type ReadFn = fn(&Group, &mut ReadMemo) -> Result<Box<dyn FieldType>>;

/// A field type as known to the registry.
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    /// Tag the type is registered under
    pub tag: &'static str,
    /// Constructor
    pub construct: ConstructFn,
    /// Reader
    pub read: ReadFn,
}

impl FieldDescriptor {
    /// Descriptor of the field type `F`
    #[must_use]
    pub fn of<F: FieldFactory>() -> Self {
        FieldDescriptor {
            tag: F::TAG,
            construct: construct_boxed::<F>,
            read: read_boxed::<F>,
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Construction and reading of a concrete field type.
pub trait FieldFactory: FieldType + Sized + 'static {
    /// Registry tag of the type
    const TAG: &'static str;

    /// Builds a field of `num_obs` observations.
    ///
    /// # Errors
    /// Returns [`crate::Error::Initialization`] for missing or conflicting arguments or an
    /// unsupported value, and [`crate::Error::Shape`] if the value does not hold `num_obs`
    /// observations.
    fn construct(num_obs: usize, name: &str, value: FieldValue, config: &FieldConfig)
        -> Result<Self>;

    /// Reads a field written by [`FieldType::write`].
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the group does not hold a field of this type.
    fn read(group: &Group, memo: &mut ReadMemo) -> Result<Self>;
}

fn construct_boxed<F: FieldFactory>(
    num_obs: usize,
    name: &str,
    value: FieldValue,
    config: &FieldConfig,
) -> Result<Box<dyn FieldType>> {
    Ok(Box::new(F::construct(num_obs, name, value, config)?))
}

fn read_boxed<F: FieldFactory>(group: &Group, memo: &mut ReadMemo) -> Result<Box<dyn FieldType>> {
    Ok(Box::new(F::read(group, memo)?))
}

/// Maps field-type tags to their descriptors.
pub struct FieldRegistry {
    descriptors: DashMap<&'static str, FieldDescriptor>,
}

impl FieldRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        FieldRegistry {
            descriptors: DashMap::new(),
        }
    }

    /// Creates a registry holding the built-in field types
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = FieldRegistry::new();
        for descriptor in [
            FieldDescriptor::of::<TimeDeltaField>(),
            FieldDescriptor::of::<FloatField>(),
            FieldDescriptor::of::<BoolField>(),
            FieldDescriptor::of::<TextField>(),
            FieldDescriptor::of::<PositionField>(),
        ] {
            registry.descriptors.insert(descriptor.tag, descriptor);
        }
        registry
    }

    /// The process-wide registry, seeded with the built-in field types on first use
    pub fn global() -> &'static FieldRegistry {
        static GLOBAL: OnceLock<FieldRegistry> = OnceLock::new();
        GLOBAL.get_or_init(FieldRegistry::with_builtins)
    }

    /// Registers a field type.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateFieldType`] if the tag is taken.
    pub fn register(&self, descriptor: FieldDescriptor) -> Result<()> {
        match self.descriptors.entry(descriptor.tag) {
            Entry::Occupied(_) => Err(Error::DuplicateFieldType(descriptor.tag.to_string())),
            Entry::Vacant(entry) => {
                log::debug!("registered field type '{}'", descriptor.tag);
                entry.insert(descriptor);
                Ok(())
            }
        }
    }

    /// Looks up the descriptor registered under `tag`.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownFieldType`] if nothing is registered under `tag`.
    pub fn get(&self, tag: &str) -> Result<FieldDescriptor> {
        self.descriptors
            .get(tag)
            .map(|entry| *entry.value())
            .ok_or_else(|| Error::UnknownFieldType(tag.to_string()))
    }

    /// Returns `true` if a field type is registered under `tag`
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.descriptors.contains_key(tag)
    }

    /// All registered tags, sorted
    #[must_use]
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.descriptors.iter().map(|entry| *entry.key()).collect();
        tags.sort_unstable();
        tags
    }

    /// Constructs a field of the type registered under `tag`.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownFieldType`] for an unknown tag, and the constructor's
    /// error otherwise.
    pub fn construct(
        &self,
        tag: &str,
        num_obs: usize,
        name: &str,
        value: FieldValue,
        config: FieldConfig,
    ) -> Result<Box<dyn FieldType>> {
        let descriptor = self.get(tag)?;
        (descriptor.construct)(num_obs, name, value, &config)
    }

    /// Reads a field, dispatching on the group's `fieldtype` attribute.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the attribute is missing,
    /// [`crate::Error::UnknownFieldType`] for an unknown tag, and the reader's error
    /// otherwise.
    pub fn read(&self, group: &Group, memo: &mut ReadMemo) -> Result<Box<dyn FieldType>> {
        let descriptor = self.get(group.attr_str("fieldtype")?)?;
        (descriptor.read)(group, memo)
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        array::{ArrayKind, ArrayRef, FloatArray},
        field::{existing_array, FieldCore},
        memo::WriteMemo,
    };

    /// A float field that insists on a unit
    #[derive(Debug, Clone)]
    struct DistanceField {
        core: FieldCore,
    }

    impl FieldFactory for DistanceField {
        const TAG: &'static str = "distance";

        fn construct(
            num_obs: usize,
            name: &str,
            value: FieldValue,
            config: &FieldConfig,
        ) -> Result<Self> {
            if config.unit.is_none() {
                return Err(initialization_error!("unit", "Distances need a unit"));
            }
            let data = match value {
                FieldValue::Floats(values) => ArrayRef::new(FloatArray::new(values)),
                other => existing_array(Self::TAG, ArrayKind::Float, &other)?,
            };
            Ok(DistanceField {
                core: FieldCore::new(num_obs, name, data, config)?,
            })
        }

        fn read(group: &Group, memo: &mut ReadMemo) -> Result<Self> {
            Ok(DistanceField {
                core: FieldCore::read(group, memo)?,
            })
        }
    }

    crate::field::impl_field_type!(DistanceField, "distance");

    #[test]
    fn test_builtins() {
        let registry = FieldRegistry::with_builtins();
        assert_eq!(
            registry.tags(),
            vec!["bool", "float", "position", "text", "time_delta"]
        );
        assert!(registry.contains("time_delta"));
        assert!(!FieldRegistry::new().contains("time_delta"));
    }

    #[test]
    fn test_unknown_tag() {
        let registry = FieldRegistry::with_builtins();
        let result = registry.construct(
            "complex",
            0,
            "signal",
            FieldValue::Floats(Vec::new()),
            FieldConfig::new(),
        );
        assert!(matches!(result, Err(Error::UnknownFieldType(tag)) if tag == "complex"));
    }

    #[test]
    fn test_register_twice() {
        let registry = FieldRegistry::with_builtins();
        let result = registry.register(FieldDescriptor::of::<FloatField>());
        assert!(matches!(result, Err(Error::DuplicateFieldType(tag)) if tag == "float"));
    }

    #[test]
    fn test_custom_field_type() {
        let registry = FieldRegistry::with_builtins();
        registry
            .register(FieldDescriptor::of::<DistanceField>())
            .unwrap();

        let missing_unit = registry.construct(
            "distance",
            1,
            "baseline",
            FieldValue::Floats(vec![1.0]),
            FieldConfig::new(),
        );
        assert!(matches!(
            missing_unit,
            Err(Error::Initialization { parameter, .. }) if parameter == "unit"
        ));

        let field = registry
            .construct(
                "distance",
                1,
                "baseline",
                FieldValue::Floats(vec![1.0]),
                FieldConfig::new().with_unit("meter"),
            )
            .unwrap();

        let mut group = Group::new();
        field.write(&mut group, &mut WriteMemo::new()).unwrap();
        let read = registry.read(&group, &mut ReadMemo::new()).unwrap();
        assert_eq!(read.tag(), "distance");
        assert_eq!(read.unit(), Some("meter"));
        assert_eq!(read.data(), field.data());
    }

    #[test]
    fn test_read_without_fieldtype() {
        let registry = FieldRegistry::with_builtins();
        let group = Group::new();
        assert!(matches!(
            registry.read(&group, &mut ReadMemo::new()),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_global_is_seeded() {
        assert!(FieldRegistry::global().contains("position"));
        assert!(matches!(
            FieldRegistry::global().get("matrix"),
            Err(Error::UnknownFieldType(_))
        ));
    }
}
