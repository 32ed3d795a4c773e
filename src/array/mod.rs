//! Typed arrays backing dataset fields.
//!
//! Every field owns exactly one array, held through an [`ArrayRef`]: a cheap, clonable
//! handle made of a stable [`ArrayId`] and an immutable [`TypedArray`] behind an `Arc`.
//! Cloning a handle aliases the array; two fields holding clones of one handle share it.
//!
//! Arrays are never edited in place. [`ArrayRef::insert`] and [`ArrayRef::subset`] always
//! produce a new handle, and consult a [`MutationMemo`] first so that an array reachable
//! from several places (several fields, or a field and a nested sub-array of another
//! field) is transformed once and every place receives the same replacement.
//!
//! # Capability Contract
//!
//! Each concrete array implements [`ArrayData`]:
//!
//! - [`TimeDeltaArray`] - signed durations with a time scale and input format
//! - [`FloatArray`] - floats of rank 1 or 2
//! - [`BoolArray`] - flags
//! - [`TextArray`] - strings
//! - [`PositionArray`] - 3D positions with an optional nested (shareable) time array
//!
//! [`TypedArray`] is the closed set of these, and dispatches the contract to the variant.
//!
//! # Persistence
//!
//! [`ArrayRef::write`] writes an array into a store [`Group`] whose `fieldname` attribute is
//! already set. The first write of an array records that name in the [`WriteMemo`]; later
//! writes of the same array only emit a `reference` attribute pointing at it.
//! [`ArrayRef::read`] resolves references through the [`ReadMemo`], so aliases come back as
//! one shared handle.

mod boolean;
mod float;
mod position;
mod text;
mod timedelta;

pub use boolean::BoolArray;
pub use float::FloatArray;
pub use position::PositionArray;
pub use text::TextArray;
pub use timedelta::{TimeDeltaArray, TimeFormat, TimeScale};

use std::{fmt, str::FromStr, sync::Arc};

use strum::{Display, EnumIter, EnumString};

use crate::{
    memo::{ArrayId, Mutation, MutationMemo, ReadMemo, WriteMemo},
    store::{Attr, Group},
    Error, Result,
};

/// Kind tag of a [`TypedArray`], written to the store as `array_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ArrayKind {
    /// [`TimeDeltaArray`]
    TimeDelta,
    /// [`FloatArray`]
    Float,
    /// [`BoolArray`]
    Bool,
    /// [`TextArray`]
    Text,
    /// [`PositionArray`]
    Position,
}

/// Values of an array in a form suitable for plotting.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotValues {
    /// Numeric values
    Floats(Vec<f64>),
    /// Flags
    Bools(Vec<bool>),
    /// Labels
    Text(Vec<String>),
}

/// Capability contract every concrete array satisfies.
///
/// Implementations never modify `self`; structural operations return a new array. Nested
/// sub-arrays must be transformed through the memo handed in, so that sharing survives.
pub trait ArrayData: Sized + Clone + fmt::Debug + PartialEq + Into<TypedArray> {
    /// Kind tag of this array type
    const KIND: ArrayKind;

    /// Number of observations
    fn len(&self) -> usize;

    /// Returns `true` if there are no observations
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rank of the array, the observation axis included
    fn ndim(&self) -> usize;

    /// Extent of every dimension, the observation axis first
    fn shape(&self) -> Vec<usize> {
        vec![self.len()]
    }

    /// An array of `num_obs` empty observations compatible with `self`
    fn empty_like(&self, num_obs: usize) -> Self;

    /// `self` with `other` spliced in before observation `position`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Shape`] if the arrays are incompatible.
    fn splice(&self, position: usize, other: &Self, memo: &mut MutationMemo) -> Result<Self>;

    /// The observations at `indices`, in that order.
    ///
    /// # Errors
    /// Returns [`crate::Error::Index`] for an index outside the array.
    fn take(&self, indices: &[usize], memo: &mut MutationMemo) -> Result<Self>;

    /// Writes the payload of this array into `group`.
    ///
    /// # Errors
    /// Propagates errors from writing nested arrays.
    fn write_data(&self, group: &mut Group, memo: &mut WriteMemo) -> Result<()>;

    /// Reads an array written by [`ArrayData::write_data`].
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the group content is inconsistent.
    fn read_data(group: &Group, memo: &mut ReadMemo) -> Result<Self>;

    /// Values for plotting, optionally of a named sub-field.
    ///
    /// # Errors
    /// Returns [`crate::Error::FieldNotFound`] for an unknown sub-field.
    fn plot_values(&self, sub: Option<&str>) -> Result<PlotValues>;

    /// Borrows the concrete array out of a [`TypedArray`] of the matching kind
    fn from_typed(array: &TypedArray) -> Option<&Self>;
}

/// The closed set of array implementations.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    /// Durations
    TimeDelta(TimeDeltaArray),
    /// Floats of rank 1 or 2
    Float(FloatArray),
    /// Flags
    Bool(BoolArray),
    /// Strings
    Text(TextArray),
    /// Positions
    Position(PositionArray),
}

macro_rules! dispatch {
    ($array:expr, $inner:ident => $body:expr) => {
        match $array {
            TypedArray::TimeDelta($inner) => $body,
            TypedArray::Float($inner) => $body,
            TypedArray::Bool($inner) => $body,
            TypedArray::Text($inner) => $body,
            TypedArray::Position($inner) => $body,
        }
    };
}

macro_rules! dispatch_pair {
    ($left:expr, $right:expr, $l:ident, $r:ident => $body:expr, $mismatch:expr) => {
        match ($left, $right) {
            (TypedArray::TimeDelta($l), TypedArray::TimeDelta($r)) => $body,
            (TypedArray::Float($l), TypedArray::Float($r)) => $body,
            (TypedArray::Bool($l), TypedArray::Bool($r)) => $body,
            (TypedArray::Text($l), TypedArray::Text($r)) => $body,
            (TypedArray::Position($l), TypedArray::Position($r)) => $body,
            _ => $mismatch,
        }
    };
}

impl TypedArray {
    /// Kind tag of the variant
    #[must_use]
    pub fn kind(&self) -> ArrayKind {
        match self {
            TypedArray::TimeDelta(_) => ArrayKind::TimeDelta,
            TypedArray::Float(_) => ArrayKind::Float,
            TypedArray::Bool(_) => ArrayKind::Bool,
            TypedArray::Text(_) => ArrayKind::Text,
            TypedArray::Position(_) => ArrayKind::Position,
        }
    }

    /// Number of observations
    #[must_use]
    pub fn len(&self) -> usize {
        dispatch!(self, array => array.len())
    }

    /// Returns `true` if there are no observations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rank of the array
    #[must_use]
    pub fn ndim(&self) -> usize {
        dispatch!(self, array => array.ndim())
    }

    /// Extent of every dimension
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        dispatch!(self, array => array.shape())
    }

    /// An array of `num_obs` empty observations compatible with `self`
    #[must_use]
    pub fn empty_like(&self, num_obs: usize) -> TypedArray {
        dispatch!(self, array => array.empty_like(num_obs).into())
    }

    /// `self` with `other` spliced in before observation `position`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Index`] if `position` is past the end, and
    /// [`crate::Error::Shape`] if the kinds or ranks differ.
    pub fn splice(
        &self,
        position: usize,
        other: &TypedArray,
        memo: &mut MutationMemo,
    ) -> Result<TypedArray> {
        if position > self.len() {
            return Err(Error::Index {
                index: position,
                len: self.len(),
            });
        }

        if self.ndim() != other.ndim() {
            return Err(shape_error!(
                self.ndim(),
                other.ndim(),
                "Dimensions must be equal"
            ));
        }

        dispatch_pair!(
            self,
            other,
            left,
            right => Ok(left.splice(position, right, memo)?.into()),
            Err(shape_error!(
                self.kind(),
                other.kind(),
                "Array kinds must be equal"
            ))
        )
    }

    /// The observations at `indices`, in that order.
    ///
    /// # Errors
    /// Returns [`crate::Error::Index`] for an index outside the array.
    pub fn take(&self, indices: &[usize], memo: &mut MutationMemo) -> Result<TypedArray> {
        check_indices(indices, self.len())?;
        dispatch!(self, array => Ok(array.take(indices, memo)?.into()))
    }

    /// Values for plotting, optionally of a named sub-field.
    ///
    /// # Errors
    /// Returns [`crate::Error::FieldNotFound`] for an unknown sub-field.
    pub fn plot_values(&self, sub: Option<&str>) -> Result<PlotValues> {
        dispatch!(self, array => array.plot_values(sub))
    }

    fn write_data(&self, group: &mut Group, memo: &mut WriteMemo) -> Result<()> {
        dispatch!(self, array => array.write_data(group, memo))
    }

    fn read_data(kind: ArrayKind, group: &Group, memo: &mut ReadMemo) -> Result<TypedArray> {
        Ok(match kind {
            ArrayKind::TimeDelta => TimeDeltaArray::read_data(group, memo)?.into(),
            ArrayKind::Float => FloatArray::read_data(group, memo)?.into(),
            ArrayKind::Bool => BoolArray::read_data(group, memo)?.into(),
            ArrayKind::Text => TextArray::read_data(group, memo)?.into(),
            ArrayKind::Position => PositionArray::read_data(group, memo)?.into(),
        })
    }
}

/// Shared handle to an immutable array.
///
/// Cloning the handle aliases the array. Equality (`==`) compares values; use
/// [`ArrayRef::same_array`] to test identity.
#[derive(Clone)]
pub struct ArrayRef {
    id: ArrayId,
    array: Arc<TypedArray>,
}

impl ArrayRef {
    /// Wraps an array under a fresh identity
    pub fn new(array: impl Into<TypedArray>) -> Self {
        ArrayRef {
            id: ArrayId::next(),
            array: Arc::new(array.into()),
        }
    }

    /// Identity of the array
    #[must_use]
    pub fn id(&self) -> ArrayId {
        self.id
    }

    /// The array behind the handle
    #[must_use]
    pub fn array(&self) -> &TypedArray {
        &self.array
    }

    /// Borrows the concrete array, if it is of kind `A`
    #[must_use]
    pub fn downcast<A: ArrayData>(&self) -> Option<&A> {
        A::from_typed(&self.array)
    }

    /// Returns `true` if both handles refer to the same array instance
    #[must_use]
    pub fn same_array(&self, other: &ArrayRef) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.array, &other.array)
    }

    /// Kind of the array
    #[must_use]
    pub fn kind(&self) -> ArrayKind {
        self.array.kind()
    }

    /// Number of observations
    #[must_use]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Returns `true` if there are no observations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Rank of the array
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.array.ndim()
    }

    /// Extent of every dimension
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.array.shape()
    }

    /// A new array of `num_obs` empty observations compatible with this one
    #[must_use]
    pub fn empty_like(&self, num_obs: usize) -> ArrayRef {
        ArrayRef::new(self.array.empty_like(num_obs))
    }

    /// Values for plotting, optionally of a named sub-field.
    ///
    /// # Errors
    /// Returns [`crate::Error::FieldNotFound`] for an unknown sub-field.
    pub fn plot_values(&self, sub: Option<&str>) -> Result<PlotValues> {
        self.array.plot_values(sub)
    }

    /// `target` with `source` spliced in before observation `position`.
    ///
    /// If `target` was already grown by the same `source` at the same `position` earlier in
    /// the same operation, that result is returned instead, so every holder of `target`
    /// ends up with one shared result. A different `source` produces a separate result.
    ///
    /// # Errors
    /// Returns [`crate::Error::Index`] if `position` is past the end, and
    /// [`crate::Error::Shape`] if the arrays are incompatible.
    pub fn insert(
        target: &ArrayRef,
        position: usize,
        source: &ArrayRef,
        memo: &mut MutationMemo,
    ) -> Result<ArrayRef> {
        let key = Mutation::Insert {
            target: target.id,
            position,
            source: source.id,
        };
        if let Some(done) = memo.get(&key) {
            log::trace!("insert of {} into {} resolved from memo", source.id, target.id);
            return Ok(done.clone());
        }

        let result = ArrayRef::new(target.array.splice(position, &source.array, memo)?);
        memo.insert(key, result.clone());
        Ok(result)
    }

    /// This array with `num_obs` empty observations spliced in before `position`.
    ///
    /// Padding the same array by the same amount at the same position twice in one
    /// operation returns the first result.
    ///
    /// # Errors
    /// Returns [`crate::Error::Index`] if `position` is past the end.
    pub fn pad(
        &self,
        position: usize,
        num_obs: usize,
        memo: &mut MutationMemo,
    ) -> Result<ArrayRef> {
        let key = Mutation::Pad {
            target: self.id,
            position,
            num_obs,
        };
        if let Some(done) = memo.get(&key) {
            log::trace!("padding of {} resolved from memo", self.id);
            return Ok(done.clone());
        }

        let empty = self.array.empty_like(num_obs);
        let result = ArrayRef::new(self.array.splice(position, &empty, memo)?);
        memo.insert(key, result.clone());
        Ok(result)
    }

    /// This array restricted to `indices`, in that order.
    ///
    /// If this array was already subset earlier in the same operation, that result is
    /// returned instead.
    ///
    /// # Errors
    /// Returns [`crate::Error::Index`] for an index outside the array.
    pub fn subset(&self, indices: &[usize], memo: &mut MutationMemo) -> Result<ArrayRef> {
        let key = Mutation::Subset(self.id);
        if let Some(done) = memo.get(&key) {
            log::trace!("subset of {} resolved from memo", self.id);
            return Ok(done.clone());
        }

        let result = ArrayRef::new(self.array.take(indices, memo)?);
        memo.insert(key, result.clone());
        Ok(result)
    }

    /// Writes the array into `group`, which must carry a `fieldname` attribute.
    ///
    /// The first write of an array stores its payload; later writes of the same array in
    /// the same operation store a `reference` attribute naming the first group instead.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `group` has no `fieldname`.
    pub fn write(&self, group: &mut Group, memo: &mut WriteMemo) -> Result<()> {
        let fieldname = group.attr_str("fieldname")?.to_string();
        group.set_attr("array_kind", self.kind().to_string());

        if let Some(target) = memo.get(&self.id) {
            log::trace!("{} written as reference to '{}'", fieldname, target);
            group.set_attr("reference", target.clone());
            return Ok(());
        }

        memo.insert(self.id, fieldname);
        self.array.write_data(group, memo)
    }

    /// Reads an array written by [`ArrayRef::write`].
    ///
    /// An array already materialized under this group's `fieldname` is reused, and a
    /// `reference` attribute resolves to the array read from the referenced group.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for missing attributes, an unknown kind, or a
    /// reference to a group that has not been read yet.
    pub fn read(group: &Group, memo: &mut ReadMemo) -> Result<ArrayRef> {
        let fieldname = group.attr_str("fieldname")?.to_string();
        if let Some(done) = memo.get(&fieldname) {
            return Ok(done.clone());
        }

        if let Some(target) = group.attr("reference").and_then(Attr::as_str) {
            let Some(resolved) = memo.get(&target.to_string()).cloned() else {
                return Err(malformed_error!(
                    "Unresolved reference from '{}' to '{}'",
                    fieldname,
                    target
                ));
            };
            memo.insert(fieldname, resolved.clone());
            return Ok(resolved);
        }

        let kind_name = group.attr_str("array_kind")?;
        let kind = ArrayKind::from_str(kind_name)
            .map_err(|_| malformed_error!("Unknown array kind '{}'", kind_name))?;

        let array = ArrayRef::new(TypedArray::read_data(kind, group, memo)?);
        memo.insert(fieldname, array.clone());
        Ok(array)
    }
}

impl PartialEq for ArrayRef {
    fn eq(&self, other: &Self) -> bool {
        self.array == other.array
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayRef")
            .field("id", &self.id)
            .field("array", &self.array)
            .finish()
    }
}

impl<A: ArrayData> From<A> for ArrayRef {
    fn from(array: A) -> Self {
        ArrayRef::new(array)
    }
}

/// Fails with [`crate::Error::Index`] for the first index not below `len`.
pub(crate) fn check_indices(indices: &[usize], len: usize) -> Result<()> {
    match indices.iter().find(|&&index| index >= len) {
        Some(&index) => Err(Error::Index { index, len }),
        None => Ok(()),
    }
}

/// `target` with `source` inserted before `position`.
pub(crate) fn splice_values<T: Clone>(
    target: &[T],
    position: usize,
    source: &[T],
) -> Result<Vec<T>> {
    if position > target.len() {
        return Err(Error::Index {
            index: position,
            len: target.len(),
        });
    }

    let mut values = Vec::with_capacity(target.len() + source.len());
    values.extend_from_slice(&target[..position]);
    values.extend_from_slice(source);
    values.extend_from_slice(&target[position..]);
    Ok(values)
}

/// The entries at `indices`; indices must have been checked.
pub(crate) fn take_values<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&index| values[index].clone()).collect()
}

/// Error for a plot sub-field the array does not provide
pub(crate) fn unknown_sub_field(kind: ArrayKind, sub: &str) -> Error {
    Error::FieldNotFound(format!("{kind}.{sub}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(values: &[f64]) -> ArrayRef {
        ArrayRef::new(FloatArray::new(values.to_vec()))
    }

    #[test]
    fn test_insert_and_subset() {
        let mut memo = MutationMemo::new();
        let target = floats(&[1.0, 2.0, 3.0]);
        let source = floats(&[9.0]);

        let inserted = ArrayRef::insert(&target, 1, &source, &mut memo).unwrap();
        assert_eq!(inserted, floats(&[1.0, 9.0, 2.0, 3.0]));
        assert_eq!(target.len(), 3);
        assert!(!inserted.same_array(&target));

        let mut memo = MutationMemo::new();
        let subset = inserted.subset(&[3, 0, 0], &mut memo).unwrap();
        assert_eq!(subset, floats(&[3.0, 1.0, 1.0]));
    }

    #[test]
    fn test_insert_is_memoized_per_source() {
        let mut memo = MutationMemo::new();
        let shared = floats(&[1.0, 2.0]);
        let alias = shared.clone();
        let source = floats(&[3.0]);

        let first = ArrayRef::insert(&shared, 2, &source, &mut memo).unwrap();
        let second = ArrayRef::insert(&alias, 2, &source, &mut memo).unwrap();
        assert!(first.same_array(&second));
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_insert_distinct_sources_into_shared_target() {
        let mut memo = MutationMemo::new();
        let shared = floats(&[1.0, 2.0]);

        let first = ArrayRef::insert(&shared, 2, &floats(&[3.0]), &mut memo).unwrap();
        let second = ArrayRef::insert(&shared, 2, &floats(&[4.0]), &mut memo).unwrap();
        assert_eq!(first, floats(&[1.0, 2.0, 3.0]));
        assert_eq!(second, floats(&[1.0, 2.0, 4.0]));
        assert!(!first.same_array(&second));
    }

    #[test]
    fn test_pad_is_memoized() {
        let mut memo = MutationMemo::new();
        let shared = floats(&[1.0]);

        let first = shared.pad(0, 2, &mut memo).unwrap();
        let second = shared.clone().pad(0, 2, &mut memo).unwrap();
        assert!(first.same_array(&second));
        assert_eq!(first.len(), 3);

        let appended = shared.pad(1, 2, &mut memo).unwrap();
        assert!(!appended.same_array(&first));
        let values = appended.downcast::<FloatArray>().unwrap().values();
        assert_eq!(values[0], 1.0);
        assert!(values[1..].iter().all(|value| value.is_nan()));
    }

    #[test]
    fn test_subset_is_memoized() {
        let mut memo = MutationMemo::new();
        let shared = floats(&[1.0, 2.0, 3.0]);
        let first = shared.subset(&[2, 1], &mut memo).unwrap();
        let second = shared.clone().subset(&[2, 1], &mut memo).unwrap();
        assert!(first.same_array(&second));
    }

    #[test]
    fn test_insert_position_out_of_range() {
        let mut memo = MutationMemo::new();
        let result = ArrayRef::insert(&floats(&[1.0]), 2, &floats(&[3.0]), &mut memo);
        assert!(matches!(result, Err(Error::Index { index: 2, len: 1 })));
        assert!(memo.is_empty());
    }

    #[test]
    fn test_subset_out_of_range() {
        let mut memo = MutationMemo::new();
        let result = floats(&[1.0, 2.0]).subset(&[0, 5], &mut memo);
        assert!(matches!(result, Err(Error::Index { index: 5, len: 2 })));
    }

    #[test]
    fn test_insert_kind_mismatch() {
        let mut memo = MutationMemo::new();
        let text = ArrayRef::new(TextArray::new(vec!["a".to_string()]));
        let result = ArrayRef::insert(&floats(&[1.0]), 1, &text, &mut memo);
        match result {
            Err(Error::Shape { left, right, .. }) => {
                assert_eq!(left, "float");
                assert_eq!(right, "text");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_insert_rank_mismatch() {
        let mut memo = MutationMemo::new();
        let matrix = ArrayRef::new(FloatArray::matrix(2, vec![1.0, 2.0]).unwrap());
        let result = ArrayRef::insert(&floats(&[1.0]), 1, &matrix, &mut memo);
        match result {
            Err(Error::Shape { left, right, .. }) => {
                assert_eq!(left, "1");
                assert_eq!(right, "2");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_write_read_shared() {
        let shared = floats(&[1.0, 2.0]);
        let mut root = Group::new();
        let mut write_memo = WriteMemo::new();

        for name in ["a", "b"] {
            let group = root.create_group(name);
            group.set_attr("fieldname", name);
            shared.write(group, &mut write_memo).unwrap();
        }
        assert!(root.group("b").unwrap().attr("reference").is_some());

        let mut read_memo = ReadMemo::new();
        let a = ArrayRef::read(root.group("a").unwrap(), &mut read_memo).unwrap();
        let b = ArrayRef::read(root.group("b").unwrap(), &mut read_memo).unwrap();
        assert!(a.same_array(&b));
        assert_eq!(a, shared);
        assert!(!a.same_array(&shared));
    }

    #[test]
    fn test_read_unresolved_reference() {
        let mut group = Group::new();
        group.set_attr("fieldname", "b");
        group.set_attr("reference", "a");
        let mut memo = ReadMemo::new();
        assert!(matches!(
            ArrayRef::read(&group, &mut memo),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_downcast() {
        let array = floats(&[1.0]);
        assert!(array.downcast::<FloatArray>().is_some());
        assert!(array.downcast::<TextArray>().is_none());
        assert_eq!(array.kind(), ArrayKind::Float);
    }
}
