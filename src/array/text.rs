use crate::{
    array::{
        check_indices, splice_values, take_values, unknown_sub_field, ArrayData, ArrayKind,
        PlotValues, TypedArray,
    },
    memo::{MutationMemo, ReadMemo, WriteMemo},
    store::{Data, Group},
    Result,
};

/// One string per observation. Empty observations are `""`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextArray {
    values: Vec<String>,
}

impl TextArray {
    /// Creates an array from strings
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        TextArray { values }
    }

    /// The strings
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Distinct strings in order of first appearance
    #[must_use]
    pub fn unique(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.values
            .iter()
            .map(String::as_str)
            .filter(|value| seen.insert(*value))
            .collect()
    }
}

impl From<TextArray> for TypedArray {
    fn from(array: TextArray) -> Self {
        TypedArray::Text(array)
    }
}

impl ArrayData for TextArray {
    const KIND: ArrayKind = ArrayKind::Text;

    fn len(&self) -> usize {
        self.values.len()
    }

    fn ndim(&self) -> usize {
        1
    }

    fn empty_like(&self, num_obs: usize) -> Self {
        TextArray::new(vec![String::new(); num_obs])
    }

    fn splice(&self, position: usize, other: &Self, _memo: &mut MutationMemo) -> Result<Self> {
        Ok(TextArray::new(splice_values(
            &self.values,
            position,
            &other.values,
        )?))
    }

    fn take(&self, indices: &[usize], _memo: &mut MutationMemo) -> Result<Self> {
        check_indices(indices, self.len())?;
        Ok(TextArray::new(take_values(&self.values, indices)))
    }

    fn write_data(&self, group: &mut Group, _memo: &mut WriteMemo) -> Result<()> {
        group.set_data("values", Data::Text(self.values.clone()));
        Ok(())
    }

    fn read_data(group: &Group, _memo: &mut ReadMemo) -> Result<Self> {
        match group.data("values")? {
            Data::Text(values) => Ok(TextArray::new(values.clone())),
            other => Err(malformed_error!(
                "Text array data must be a text block, found {:?}",
                other
            )),
        }
    }

    fn plot_values(&self, sub: Option<&str>) -> Result<PlotValues> {
        match sub {
            None => Ok(PlotValues::Text(self.values.clone())),
            Some(other) => Err(unknown_sub_field(Self::KIND, other)),
        }
    }

    fn from_typed(array: &TypedArray) -> Option<&Self> {
        match array {
            TypedArray::Text(array) => Some(array),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> TextArray {
        TextArray::new(values.iter().map(|value| value.to_string()).collect())
    }

    #[test]
    fn test_unique() {
        let stations = text(&["osls", "trds", "osls", "hons"]);
        assert_eq!(stations.unique(), vec!["osls", "trds", "hons"]);
    }

    #[test]
    fn test_prepend_empty() {
        let mut memo = MutationMemo::new();
        let stations = text(&["osls"]);
        let spliced = stations
            .splice(0, &stations.empty_like(2), &mut memo)
            .unwrap();
        assert_eq!(spliced, text(&["", "", "osls"]));
    }

    #[test]
    fn test_write_read() {
        let stations = text(&["osls", "trds"]);
        let mut group = Group::new();
        stations
            .write_data(&mut group, &mut WriteMemo::new())
            .unwrap();
        assert_eq!(
            TextArray::read_data(&group, &mut ReadMemo::new()).unwrap(),
            stations
        );
    }
}
