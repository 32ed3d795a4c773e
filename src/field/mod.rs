//! Field types wrapping typed arrays inside a dataset.
//!
//! A field is a named column of a dataset. It owns exactly one [`ArrayRef`], whose length
//! is the field's `num_obs` at all times, plus some metadata (unit, write level,
//! description). Concrete field types differ only in which array kind they hold and how
//! they validate their construction arguments:
//!
//! - [`TimeDeltaField`] (`time_delta`) - requires `scale` and `fmt`, never carries a unit
//! - [`FloatField`] (`float`)
//! - [`BoolField`] (`bool`)
//! - [`TextField`] (`text`)
//! - [`PositionField`] (`position`) - requires `system`, may nest a time array
//!
//! The structural operations of [`FieldType`] never edit an array. They build a new one
//! through [`ArrayRef::insert`] or [`ArrayRef::subset`] with the memo handed in by the
//! caller, and replace the field's handle. Fields holding the same handle before the
//! operation hold the same (new) handle afterwards, as long as the caller passes one memo
//! through all of them.
//!
//! Fields are created polymorphically through the [`FieldRegistry`].

mod boolean;
mod float;
mod position;
mod registry;
mod text;
mod timedelta;

pub use boolean::BoolField;
pub use float::FloatField;
pub use position::PositionField;
pub use registry::{ConstructFn, FieldDescriptor, FieldFactory, FieldRegistry, ReadFn};
pub use text::TextField;
pub use timedelta::TimeDeltaField;

use std::{fmt, str::FromStr};

use crate::{
    array::{ArrayKind, ArrayRef, PlotValues},
    config::{FieldConfig, WriteLevel},
    memo::{MutationMemo, ReadMemo, WriteMemo},
    store::{Attr, Group},
    Error, Result,
};

/// Raw values a field is constructed from.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// One number per observation
    Floats(Vec<f64>),
    /// One row of numbers per observation
    Rows(Vec<Vec<f64>>),
    /// One flag per observation
    Bools(Vec<bool>),
    /// One string per observation
    Text(Vec<String>),
    /// One 3D position per observation
    Positions(Vec<[f64; 3]>),
    /// An existing array, wrapped as-is
    Array(ArrayRef),
}

impl FieldValue {
    /// Short name of the value variant, used in error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            FieldValue::Floats(_) => "floats".to_string(),
            FieldValue::Rows(_) => "rows".to_string(),
            FieldValue::Bools(_) => "bools".to_string(),
            FieldValue::Text(_) => "text".to_string(),
            FieldValue::Positions(_) => "positions".to_string(),
            FieldValue::Array(array) => format!("{} array", array.kind()),
        }
    }
}

impl From<ArrayRef> for FieldValue {
    fn from(array: ArrayRef) -> Self {
        FieldValue::Array(array)
    }
}

/// State shared by every field type: name, metadata and the backing array.
#[derive(Debug, Clone)]
pub struct FieldCore {
    name: String,
    num_obs: usize,
    unit: Option<String>,
    write_level: WriteLevel,
    description: Option<String>,
    data: ArrayRef,
}

impl FieldCore {
    /// Creates the core of a field named `name` holding `data`.
    ///
    /// Takes `unit`, `write_level` and `description` from `config`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Shape`] if `data` does not hold `num_obs` observations.
    pub fn new(num_obs: usize, name: &str, data: ArrayRef, config: &FieldConfig) -> Result<Self> {
        check_length(name, num_obs, data.len())?;
        Ok(FieldCore {
            name: name.to_string(),
            num_obs,
            unit: config.unit.clone(),
            write_level: config.write_level,
            description: config.description.clone(),
            data,
        })
    }

    /// Reads the core of a field written by [`FieldType::write`].
    ///
    /// The name is the group's `fieldname` with any dotted prefix stripped, `num_obs` is the
    /// length of the array read.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for missing or inconsistent attributes.
    pub fn read(group: &Group, memo: &mut ReadMemo) -> Result<Self> {
        let fieldname = group.attr_str("fieldname")?;
        let name = fieldname.rsplit('.').next().unwrap_or(fieldname).to_string();

        let data = ArrayRef::read(group, memo)?;
        if let Some(num_obs) = group.attr("num_obs").and_then(Attr::as_int) {
            if usize::try_from(num_obs).ok() != Some(data.len()) {
                return Err(malformed_error!(
                    "Field '{}' claims {} observations but holds {}",
                    fieldname,
                    num_obs,
                    data.len()
                ));
            }
        }

        let write_level = match group.attr("write_level").and_then(Attr::as_str) {
            Some(level) => level
                .parse()
                .map_err(|_| malformed_error!("Unknown write level '{}'", level))?,
            None => WriteLevel::default(),
        };

        Ok(FieldCore {
            name,
            num_obs: data.len(),
            unit: group.attr("unit").and_then(Attr::as_str).map(str::to_string),
            write_level,
            description: group
                .attr("description")
                .and_then(Attr::as_str)
                .map(str::to_string),
            data,
        })
    }

    /// Name of the field
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of observations
    #[must_use]
    pub fn num_obs(&self) -> usize {
        self.num_obs
    }

    /// Display unit, if any
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Write level
    #[must_use]
    pub fn write_level(&self) -> WriteLevel {
        self.write_level
    }

    /// Free-text description, if any
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The backing array
    #[must_use]
    pub fn data(&self) -> &ArrayRef {
        &self.data
    }

    /// Construction arguments that recreate this field's metadata
    #[must_use]
    pub fn config(&self) -> FieldConfig {
        FieldConfig {
            unit: self.unit.clone(),
            write_level: self.write_level,
            description: self.description.clone(),
            ..FieldConfig::default()
        }
    }

    /// Replaces the backing array after a mutation that should leave `num_obs` observations.
    fn replace_data(&mut self, data: ArrayRef, num_obs: usize) -> Result<()> {
        check_length(&self.name, num_obs, data.len())?;
        self.data = data;
        self.num_obs = num_obs;
        Ok(())
    }

    /// Fails unless the backing array is of `kind`
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for any other kind.
    pub fn expect_kind(&self, kind: ArrayKind) -> Result<()> {
        if self.data.kind() != kind {
            return Err(malformed_error!(
                "Field '{}' holds a {} array, expected {}",
                self.name,
                self.data.kind(),
                kind
            ));
        }
        Ok(())
    }
}

/// A named column of a dataset.
///
/// Implementors provide access to their [`FieldCore`]; the structural operations and
/// persistence are shared.
pub trait FieldType: fmt::Debug + Send + Sync {
    /// Registry tag of the field type
    fn tag(&self) -> &'static str;

    /// Shared field state
    fn core(&self) -> &FieldCore;

    /// Shared field state, mutably
    fn core_mut(&mut self) -> &mut FieldCore;

    /// Clones the field behind a box
    fn clone_box(&self) -> Box<dyn FieldType>;

    /// Name of the field
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Number of observations
    fn num_obs(&self) -> usize {
        self.core().num_obs()
    }

    /// Display unit, if any
    fn unit(&self) -> Option<&str> {
        self.core().unit()
    }

    /// The backing array
    fn data(&self) -> &ArrayRef {
        self.core().data()
    }

    /// Adds `num_obs` empty observations before the first one.
    ///
    /// # Errors
    /// Returns [`crate::Error::Shape`] if the replacement has the wrong length.
    fn prepend_empty(&mut self, num_obs: usize, memo: &mut MutationMemo) -> Result<()> {
        let replacement = self.data().pad(0, num_obs, memo)?;
        let expected = self.num_obs() + num_obs;
        self.core_mut().replace_data(replacement, expected)
    }

    /// Adds `num_obs` empty observations after the last one.
    ///
    /// # Errors
    /// See [`FieldType::prepend_empty`].
    fn append_empty(&mut self, num_obs: usize, memo: &mut MutationMemo) -> Result<()> {
        let replacement = self.data().pad(self.num_obs(), num_obs, memo)?;
        let expected = self.num_obs() + num_obs;
        self.core_mut().replace_data(replacement, expected)
    }

    /// Keeps the observations at `indices`, in that order. Indices may repeat.
    ///
    /// # Errors
    /// Returns [`crate::Error::Index`] for an index outside the field.
    fn subset(&mut self, indices: &[usize], memo: &mut MutationMemo) -> Result<()> {
        let replacement = self.data().subset(indices, memo)?;
        self.core_mut().replace_data(replacement, indices.len())
    }

    /// Appends the observations of `other` after this field's.
    ///
    /// # Errors
    /// Returns [`crate::Error::Shape`] if the ranks, array kinds or row widths differ. The
    /// field is unchanged on error.
    fn extend(&mut self, other: &dyn FieldType, memo: &mut MutationMemo) -> Result<()> {
        let (ndim, other_ndim) = (self.data().ndim(), other.data().ndim());
        if ndim != other_ndim {
            return Err(shape_error!(
                ndim,
                other_ndim,
                "Field '{}' has rank {} but '{}' has rank {}",
                self.name(),
                ndim,
                other.name(),
                other_ndim
            ));
        }

        let data = self.data().clone();
        let replacement = ArrayRef::insert(&data, self.num_obs(), other.data(), memo)?;
        let expected = self.num_obs() + other.num_obs();
        self.core_mut().replace_data(replacement, expected)
    }

    /// Writes the field into `group`.
    ///
    /// The group receives the attributes `fieldname`, `fieldtype`, `num_obs` and
    /// `write_level`, plus `unit` and `description` when present, and the array payload.
    ///
    /// # Errors
    /// Propagates errors from the array writer.
    fn write(&self, group: &mut Group, memo: &mut WriteMemo) -> Result<()> {
        let core = self.core();
        group.set_attr("fieldname", core.name());
        group.set_attr("fieldtype", self.tag());
        group.set_attr(
            "num_obs",
            i64::try_from(core.num_obs()).map_err(|_| Error::OutOfBounds)?,
        );
        group.set_attr("write_level", core.write_level().to_string());
        if let Some(unit) = core.unit() {
            group.set_attr("unit", unit);
        }
        if let Some(description) = core.description() {
            group.set_attr("description", description);
        }

        core.data().write(group, memo)
    }

    /// Values for plotting, optionally of a named sub-field.
    ///
    /// # Errors
    /// Returns [`crate::Error::FieldNotFound`] for an unknown sub-field.
    fn plot_values(&self, sub: Option<&str>) -> Result<PlotValues> {
        self.data().plot_values(sub)
    }
}

impl Clone for Box<dyn FieldType> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Implements the boilerplate half of [`FieldType`] for a struct with a `core` member.
macro_rules! impl_field_type {
    ($field:ident, $tag:expr) => {
        impl $crate::field::FieldType for $field {
            fn tag(&self) -> &'static str {
                $tag
            }

            fn core(&self) -> &$crate::field::FieldCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut $crate::field::FieldCore {
                &mut self.core
            }

            fn clone_box(&self) -> Box<dyn $crate::field::FieldType> {
                Box::new(self.clone())
            }
        }
    };
}
pub(crate) use impl_field_type;

/// Fails with [`Error::Shape`] unless a field of `num_obs` observations can hold `len`.
fn check_length(name: &str, num_obs: usize, len: usize) -> Result<()> {
    if len != num_obs {
        return Err(shape_error!(
            len,
            num_obs,
            "Length of '{}' does not match the number of observations",
            name
        ));
    }
    Ok(())
}

/// Error for a value the field type cannot be built from
pub(crate) fn unsupported_value(tag: &str, value: &FieldValue) -> Error {
    initialization_error!(
        "value",
        "A {} field cannot be built from {}",
        tag,
        value.describe()
    )
}

/// Parses a required construction argument of a `type_name` array.
pub(crate) fn required_arg<T: FromStr>(
    type_name: &str,
    parameter: &str,
    value: Option<&str>,
) -> Result<T> {
    let Some(value) = value else {
        return Err(initialization_error!(
            parameter,
            "{}() missing 1 required argument: '{}'",
            type_name,
            parameter
        ));
    };

    value
        .parse()
        .map_err(|_| initialization_error!(parameter, "Invalid {} '{}'", parameter, value))
}

/// Unwraps an existing array of `kind`, or fails as [`unsupported_value`].
pub(crate) fn existing_array(tag: &str, kind: ArrayKind, value: &FieldValue) -> Result<ArrayRef> {
    match value {
        FieldValue::Array(array) if array.kind() == kind => Ok(array.clone()),
        other => Err(unsupported_value(tag, other)),
    }
}
