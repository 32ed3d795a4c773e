use crate::{
    array::{
        check_indices, splice_values, unknown_sub_field, ArrayData, ArrayKind, PlotValues,
        TypedArray,
    },
    memo::{MutationMemo, ReadMemo, WriteMemo},
    store::{Data, Group},
    Error, Result,
};

/// Floats of rank 1 (one value per observation) or rank 2 (a row per observation).
///
/// Values are stored row-major. Empty observations are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatArray {
    values: Vec<f64>,
    /// `None` for rank 1, the row width for rank 2
    columns: Option<usize>,
}

impl FloatArray {
    /// A rank 1 array
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        FloatArray {
            values,
            columns: None,
        }
    }

    /// A rank 2 array of rows with `columns` values each, given row-major.
    ///
    /// # Errors
    /// Returns [`crate::Error::Shape`] if `columns` is zero or does not divide the number
    /// of values.
    pub fn matrix(columns: usize, values: Vec<f64>) -> Result<Self> {
        if columns == 0 || values.len() % columns != 0 {
            return Err(shape_error!(
                values.len(),
                columns,
                "Number of values is not a multiple of the row width"
            ));
        }

        Ok(FloatArray {
            values,
            columns: Some(columns),
        })
    }

    /// A rank 2 array from rows.
    ///
    /// # Errors
    /// Returns [`crate::Error::Shape`] if the rows differ in length or are empty.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().find(|row| row.len() != columns) {
            return Err(shape_error!(
                columns,
                row.len(),
                "All rows must have the same length"
            ));
        }

        Self::matrix(columns, rows.concat())
    }

    /// Row-major values
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Row width, `None` for a rank 1 array
    #[must_use]
    pub fn columns(&self) -> Option<usize> {
        self.columns
    }

    /// Values of one row
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        let width = self.width();
        self.values.get(index * width..(index + 1) * width)
    }

    fn width(&self) -> usize {
        self.columns.unwrap_or(1)
    }
}

impl From<FloatArray> for TypedArray {
    fn from(array: FloatArray) -> Self {
        TypedArray::Float(array)
    }
}

impl ArrayData for FloatArray {
    const KIND: ArrayKind = ArrayKind::Float;

    fn len(&self) -> usize {
        self.values.len() / self.width()
    }

    fn ndim(&self) -> usize {
        if self.columns.is_some() {
            2
        } else {
            1
        }
    }

    fn shape(&self) -> Vec<usize> {
        match self.columns {
            Some(columns) => vec![self.len(), columns],
            None => vec![self.len()],
        }
    }

    fn empty_like(&self, num_obs: usize) -> Self {
        FloatArray {
            values: vec![f64::NAN; num_obs * self.width()],
            columns: self.columns,
        }
    }

    fn splice(&self, position: usize, other: &Self, _memo: &mut MutationMemo) -> Result<Self> {
        if self.ndim() != other.ndim() {
            return Err(shape_error!(
                self.ndim(),
                other.ndim(),
                "Dimensions must be equal"
            ));
        }
        if self.columns != other.columns {
            return Err(shape_error!(
                self.width(),
                other.width(),
                "Row widths must be equal"
            ));
        }
        if position > self.len() {
            return Err(Error::Index {
                index: position,
                len: self.len(),
            });
        }

        let width = self.width();
        Ok(FloatArray {
            values: splice_values(&self.values, position * width, &other.values)?,
            columns: self.columns,
        })
    }

    fn take(&self, indices: &[usize], _memo: &mut MutationMemo) -> Result<Self> {
        check_indices(indices, self.len())?;
        let width = self.width();
        let mut values = Vec::with_capacity(indices.len() * width);
        for &index in indices {
            values.extend_from_slice(&self.values[index * width..(index + 1) * width]);
        }

        Ok(FloatArray {
            values,
            columns: self.columns,
        })
    }

    fn write_data(&self, group: &mut Group, _memo: &mut WriteMemo) -> Result<()> {
        group.set_data(
            "values",
            Data::Float {
                shape: self.shape(),
                values: self.values.clone(),
            },
        );
        Ok(())
    }

    fn read_data(group: &Group, _memo: &mut ReadMemo) -> Result<Self> {
        match group.data("values")? {
            Data::Float { shape, values } => match shape.as_slice() {
                [_] => Ok(Self::new(values.clone())),
                [_, columns] => Self::matrix(*columns, values.clone()),
                _ => Err(malformed_error!(
                    "Float arrays have rank 1 or 2, found {}",
                    shape.len()
                )),
            },
            other => Err(malformed_error!(
                "Float array data must be a float block, found {:?}",
                other
            )),
        }
    }

    fn plot_values(&self, sub: Option<&str>) -> Result<PlotValues> {
        let Some(sub) = sub else {
            return Ok(PlotValues::Floats(self.values.clone()));
        };

        match (sub.parse::<usize>(), self.columns) {
            (Ok(column), Some(columns)) if column < columns => Ok(PlotValues::Floats(
                self.values
                    .iter()
                    .skip(column)
                    .step_by(columns)
                    .copied()
                    .collect(),
            )),
            _ => Err(unknown_sub_field(Self::KIND, sub)),
        }
    }

    fn from_typed(array: &TypedArray) -> Option<&Self> {
        match array {
            TypedArray::Float(array) => Some(array),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let vector = FloatArray::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(vector.len(), 3);
        assert_eq!(vector.ndim(), 1);
        assert_eq!(vector.shape(), vec![3]);

        let matrix = FloatArray::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.ndim(), 2);
        assert_eq!(matrix.shape(), vec![2, 2]);
        assert_eq!(matrix.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(matrix.row(2), None);
    }

    #[test]
    fn test_ragged_rows() {
        let result = FloatArray::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(Error::Shape { .. })));
        assert!(FloatArray::matrix(0, Vec::new()).is_err());
    }

    #[test]
    fn test_splice_rows() {
        let mut memo = MutationMemo::new();
        let target = FloatArray::from_rows(&[vec![1.0, 2.0], vec![5.0, 6.0]]).unwrap();
        let source = FloatArray::from_rows(&[vec![3.0, 4.0]]).unwrap();
        let spliced = target.splice(1, &source, &mut memo).unwrap();
        assert_eq!(spliced.values(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_splice_width_mismatch() {
        let mut memo = MutationMemo::new();
        let target = FloatArray::matrix(2, vec![1.0, 2.0]).unwrap();
        let source = FloatArray::matrix(3, vec![1.0, 2.0, 3.0]).unwrap();
        match target.splice(1, &source, &mut memo) {
            Err(Error::Shape { left, right, .. }) => {
                assert_eq!(left, "2");
                assert_eq!(right, "3");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_take_rows() {
        let mut memo = MutationMemo::new();
        let matrix = FloatArray::matrix(2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let taken = matrix.take(&[2, 0], &mut memo).unwrap();
        assert_eq!(taken.values(), &[5.0, 6.0, 1.0, 2.0]);
        assert!(matrix.take(&[3], &mut memo).is_err());
    }

    #[test]
    fn test_empty_is_nan() {
        let matrix = FloatArray::matrix(3, vec![0.0; 3]).unwrap();
        let empty = matrix.empty_like(2);
        assert_eq!(empty.shape(), vec![2, 3]);
        assert!(empty.values().iter().all(|value| value.is_nan()));
    }

    #[test]
    fn test_plot_columns() {
        let matrix = FloatArray::matrix(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(
            matrix.plot_values(Some("1")).unwrap(),
            PlotValues::Floats(vec![2.0, 4.0])
        );
        assert!(matrix.plot_values(Some("2")).is_err());
        assert!(FloatArray::new(vec![1.0]).plot_values(Some("0")).is_err());
    }

    #[test]
    fn test_write_read_matrix() {
        let matrix = FloatArray::matrix(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut group = Group::new();
        matrix.write_data(&mut group, &mut WriteMemo::new()).unwrap();
        let read = FloatArray::read_data(&group, &mut ReadMemo::new()).unwrap();
        assert_eq!(read, matrix);
    }
}
