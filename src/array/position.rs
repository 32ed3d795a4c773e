//! Positions with an optional nested time array.
//!
//! The nested time is a full [`ArrayRef`], usually the very handle held by the dataset's time
//! field. Splicing and subsetting recurse into it through the memo, so when the dataset
//! mutates both the time field and the position field in one operation, they end up
//! sharing one new time array. Writing follows the same rule: the nested time is written
//! once and referenced from wherever else it appears.

use crate::{
    array::{
        check_indices, splice_values, take_values, unknown_sub_field, ArrayData, ArrayKind,
        ArrayRef, PlotValues, TypedArray,
    },
    memo::{MutationMemo, ReadMemo, WriteMemo},
    store::{Data, Group},
    Error, Result,
};

/// 3D positions in a named reference system, each row optionally tied to a time.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionArray {
    values: Vec<[f64; 3]>,
    system: String,
    time: Option<ArrayRef>,
}

impl PositionArray {
    /// Creates an array of positions in `system`, optionally tied to `time`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Shape`] if `time` has a different number of observations.
    pub fn new(values: Vec<[f64; 3]>, system: &str, time: Option<ArrayRef>) -> Result<Self> {
        if let Some(time) = &time {
            if time.len() != values.len() {
                return Err(shape_error!(
                    values.len(),
                    time.len(),
                    "Position and time must have the same number of observations"
                ));
            }
        }

        Ok(PositionArray {
            values,
            system: system.to_string(),
            time,
        })
    }

    /// The positions
    #[must_use]
    pub fn values(&self) -> &[[f64; 3]] {
        &self.values
    }

    /// Reference system of the positions
    #[must_use]
    pub fn system(&self) -> &str {
        &self.system
    }

    /// The nested time array, if any
    #[must_use]
    pub fn time(&self) -> Option<&ArrayRef> {
        self.time.as_ref()
    }

    /// Euclidean length of every position vector
    #[must_use]
    pub fn length(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|[x, y, z]| (x * x + y * y + z * z).sqrt())
            .collect()
    }

    fn component(&self, axis: usize) -> Vec<f64> {
        self.values.iter().map(|row| row[axis]).collect()
    }
}

impl From<PositionArray> for TypedArray {
    fn from(array: PositionArray) -> Self {
        TypedArray::Position(array)
    }
}

impl ArrayData for PositionArray {
    const KIND: ArrayKind = ArrayKind::Position;

    fn len(&self) -> usize {
        self.values.len()
    }

    fn ndim(&self) -> usize {
        2
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.len(), 3]
    }

    fn empty_like(&self, num_obs: usize) -> Self {
        PositionArray {
            values: vec![[f64::NAN; 3]; num_obs],
            system: self.system.clone(),
            time: None,
        }
    }

    fn splice(&self, position: usize, other: &Self, memo: &mut MutationMemo) -> Result<Self> {
        if self.system != other.system {
            return Err(shape_error!(
                self.system,
                other.system,
                "Positions must be given in the same reference system"
            ));
        }

        let values = splice_values(&self.values, position, &other.values)?;
        let time = match (&self.time, &other.time) {
            (Some(time), Some(other_time)) => {
                Some(ArrayRef::insert(time, position, other_time, memo)?)
            }
            (Some(time), None) => Some(time.pad(position, other.len(), memo)?),
            (None, Some(other_time)) => {
                let filler = other_time.empty_like(self.len());
                Some(ArrayRef::insert(&filler, position, other_time, memo)?)
            }
            (None, None) => None,
        };

        if let Some(time) = &time {
            if time.len() != values.len() {
                return Err(shape_error!(
                    values.len(),
                    time.len(),
                    "Nested time does not match the spliced positions"
                ));
            }
        }

        Ok(PositionArray {
            values,
            system: self.system.clone(),
            time,
        })
    }

    fn take(&self, indices: &[usize], memo: &mut MutationMemo) -> Result<Self> {
        check_indices(indices, self.len())?;
        let time = match &self.time {
            Some(time) => Some(time.subset(indices, memo)?),
            None => None,
        };

        Ok(PositionArray {
            values: take_values(&self.values, indices),
            system: self.system.clone(),
            time,
        })
    }

    fn write_data(&self, group: &mut Group, memo: &mut WriteMemo) -> Result<()> {
        let fieldname = group.attr_str("fieldname")?.to_string();
        group.set_attr("system", self.system.clone());
        group.set_data(
            "values",
            Data::Float {
                shape: vec![self.len(), 3],
                values: self.values.iter().flatten().copied().collect(),
            },
        );

        if let Some(time) = &self.time {
            let child = group.create_group("time");
            child.set_attr("fieldname", format!("{fieldname}.time"));
            time.write(child, memo)?;
        }
        Ok(())
    }

    fn read_data(group: &Group, memo: &mut ReadMemo) -> Result<Self> {
        let system = group.attr_str("system")?;
        let values = match group.data("values")? {
            Data::Float { shape, values } if shape.len() == 2 && shape[1] == 3 => values
                .chunks_exact(3)
                .map(|row| [row[0], row[1], row[2]])
                .collect(),
            other => {
                return Err(malformed_error!(
                    "Position data must be an n x 3 float block, found {:?}",
                    other
                ))
            }
        };

        let time = if group.has_group("time") {
            Some(ArrayRef::read(group.group("time")?, memo)?)
        } else {
            None
        };

        PositionArray::new(values, system, time).map_err(|error| match error {
            Error::Shape { message, .. } => malformed_error!("{}", message),
            other => other,
        })
    }

    fn plot_values(&self, sub: Option<&str>) -> Result<PlotValues> {
        match sub {
            None => Ok(PlotValues::Floats(
                self.values.iter().flatten().copied().collect(),
            )),
            Some("x") => Ok(PlotValues::Floats(self.component(0))),
            Some("y") => Ok(PlotValues::Floats(self.component(1))),
            Some("z") => Ok(PlotValues::Floats(self.component(2))),
            Some("length") => Ok(PlotValues::Floats(self.length())),
            Some("time") => match &self.time {
                Some(time) => time.plot_values(None),
                None => Err(unknown_sub_field(Self::KIND, "time")),
            },
            Some(other) => Err(unknown_sub_field(Self::KIND, other)),
        }
    }

    fn from_typed(array: &TypedArray) -> Option<&Self> {
        match array {
            TypedArray::Position(array) => Some(array),
            _ => None,
        }
    }
}
