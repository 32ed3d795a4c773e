use crate::{
    array::{
        check_indices, splice_values, take_values, unknown_sub_field, ArrayData, ArrayKind,
        PlotValues, TypedArray,
    },
    memo::{MutationMemo, ReadMemo, WriteMemo},
    store::{Data, Group},
    Result,
};

/// One flag per observation. Empty observations are `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoolArray {
    values: Vec<bool>,
}

impl BoolArray {
    /// Creates an array from flags
    #[must_use]
    pub fn new(values: Vec<bool>) -> Self {
        BoolArray { values }
    }

    /// The flags
    #[must_use]
    pub fn values(&self) -> &[bool] {
        &self.values
    }

    /// Number of flags that are set
    #[must_use]
    pub fn count_set(&self) -> usize {
        self.values.iter().filter(|&&value| value).count()
    }
}

impl From<BoolArray> for TypedArray {
    fn from(array: BoolArray) -> Self {
        TypedArray::Bool(array)
    }
}

impl ArrayData for BoolArray {
    const KIND: ArrayKind = ArrayKind::Bool;

    fn len(&self) -> usize {
        self.values.len()
    }

    fn ndim(&self) -> usize {
        1
    }

    fn empty_like(&self, num_obs: usize) -> Self {
        BoolArray::new(vec![false; num_obs])
    }

    fn splice(&self, position: usize, other: &Self, _memo: &mut MutationMemo) -> Result<Self> {
        Ok(BoolArray::new(splice_values(
            &self.values,
            position,
            &other.values,
        )?))
    }

    fn take(&self, indices: &[usize], _memo: &mut MutationMemo) -> Result<Self> {
        check_indices(indices, self.len())?;
        Ok(BoolArray::new(take_values(&self.values, indices)))
    }

    fn write_data(&self, group: &mut Group, _memo: &mut WriteMemo) -> Result<()> {
        group.set_data("values", Data::Bool(self.values.clone()));
        Ok(())
    }

    fn read_data(group: &Group, _memo: &mut ReadMemo) -> Result<Self> {
        match group.data("values")? {
            Data::Bool(values) => Ok(BoolArray::new(values.clone())),
            other => Err(malformed_error!(
                "Bool array data must be a bool block, found {:?}",
                other
            )),
        }
    }

    fn plot_values(&self, sub: Option<&str>) -> Result<PlotValues> {
        match sub {
            None => Ok(PlotValues::Bools(self.values.clone())),
            Some(other) => Err(unknown_sub_field(Self::KIND, other)),
        }
    }

    fn from_typed(array: &TypedArray) -> Option<&Self> {
        match array {
            TypedArray::Bool(array) => Some(array),
            _ => None,
        }
    }
}
