//! Durations along the observation axis.
//!
//! Values are kept as signed seconds. The [`TimeFormat`] only describes how raw input values
//! were given and how [`ArrayData::plot_values`] reports them by default; the
//! [`TimeScale`] is carried as metadata. Splicing keeps the scale and format of the target.

use strum::{Display, EnumIter, EnumString};

use crate::{
    array::{
        check_indices, splice_values, take_values, unknown_sub_field, ArrayData, ArrayKind,
        PlotValues, TypedArray,
    },
    memo::{MutationMemo, ReadMemo, WriteMemo},
    store::{Data, Group},
    Result,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Time scale a duration is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum TimeScale {
    /// Coordinated Universal Time
    Utc,
    /// International Atomic Time
    Tai,
    /// Terrestrial Time
    Tt,
    /// GPS time
    Gps,
}

/// Format raw duration values are given in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum TimeFormat {
    /// Plain seconds
    Seconds,
    /// Seconds, the canonical duration format
    Timedelta,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
    /// Days of 86400 seconds
    Day,
}

impl TimeFormat {
    /// Number of seconds in one unit of this format
    #[must_use]
    pub fn seconds_per_unit(self) -> f64 {
        match self {
            TimeFormat::Seconds | TimeFormat::Timedelta => 1.0,
            TimeFormat::Minutes => 60.0,
            TimeFormat::Hours => 3_600.0,
            TimeFormat::Day => SECONDS_PER_DAY,
        }
    }
}

/// Signed durations with a time scale and input format.
///
/// Durations are stored in seconds, so splicing never converts values. The result of a
/// splice keeps the scale and format of the target, whatever the source carries: a `tai`
/// array spliced into a `gps` array yields a `gps` array, and the values are not shifted
/// between the scales. Callers mixing scales must align them before extending.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDeltaArray {
    seconds: Vec<f64>,
    scale: TimeScale,
    fmt: TimeFormat,
}

impl TimeDeltaArray {
    /// Creates an array from raw values given in `fmt`
    #[must_use]
    pub fn new(values: &[f64], scale: TimeScale, fmt: TimeFormat) -> Self {
        let factor = fmt.seconds_per_unit();
        TimeDeltaArray {
            seconds: values.iter().map(|value| value * factor).collect(),
            scale,
            fmt,
        }
    }

    /// Creates an array from values already in seconds
    #[must_use]
    pub fn from_seconds(seconds: Vec<f64>, scale: TimeScale, fmt: TimeFormat) -> Self {
        TimeDeltaArray {
            seconds,
            scale,
            fmt,
        }
    }

    /// `num_obs` zero durations in UTC, `timedelta` format
    #[must_use]
    pub fn zeros(num_obs: usize) -> Self {
        Self::from_seconds(vec![0.0; num_obs], TimeScale::Utc, TimeFormat::Timedelta)
    }

    /// Durations in seconds
    #[must_use]
    pub fn seconds(&self) -> &[f64] {
        &self.seconds
    }

    /// Durations expressed in the array's own format
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        let factor = self.fmt.seconds_per_unit();
        self.seconds.iter().map(|seconds| seconds / factor).collect()
    }

    /// Time scale
    #[must_use]
    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    /// Input format
    #[must_use]
    pub fn fmt(&self) -> TimeFormat {
        self.fmt
    }
}

impl From<TimeDeltaArray> for TypedArray {
    fn from(array: TimeDeltaArray) -> Self {
        TypedArray::TimeDelta(array)
    }
}

impl ArrayData for TimeDeltaArray {
    const KIND: ArrayKind = ArrayKind::TimeDelta;

    fn len(&self) -> usize {
        self.seconds.len()
    }

    fn ndim(&self) -> usize {
        1
    }

    fn empty_like(&self, num_obs: usize) -> Self {
        Self::zeros(num_obs)
    }

    /// Splices `other` in before `position`, keeping the scale and format of `self`.
    fn splice(&self, position: usize, other: &Self, _memo: &mut MutationMemo) -> Result<Self> {
        Ok(TimeDeltaArray {
            seconds: splice_values(&self.seconds, position, &other.seconds)?,
            scale: self.scale,
            fmt: self.fmt,
        })
    }

    fn take(&self, indices: &[usize], _memo: &mut MutationMemo) -> Result<Self> {
        check_indices(indices, self.len())?;
        Ok(TimeDeltaArray {
            seconds: take_values(&self.seconds, indices),
            scale: self.scale,
            fmt: self.fmt,
        })
    }

    fn write_data(&self, group: &mut Group, _memo: &mut WriteMemo) -> Result<()> {
        group.set_attr("scale", self.scale.to_string());
        group.set_attr("fmt", self.fmt.to_string());
        group.set_data(
            "seconds",
            Data::Float {
                shape: vec![self.seconds.len()],
                values: self.seconds.clone(),
            },
        );
        Ok(())
    }

    fn read_data(group: &Group, _memo: &mut ReadMemo) -> Result<Self> {
        let scale_name = group.attr_str("scale")?;
        let scale: TimeScale = scale_name
            .parse()
            .map_err(|_| malformed_error!("Unknown time scale '{}'", scale_name))?;
        let fmt_name = group.attr_str("fmt")?;
        let fmt: TimeFormat = fmt_name
            .parse()
            .map_err(|_| malformed_error!("Unknown time format '{}'", fmt_name))?;

        match group.data("seconds")? {
            Data::Float { shape, values } if shape.len() == 1 => {
                Ok(Self::from_seconds(values.clone(), scale, fmt))
            }
            other => Err(malformed_error!(
                "Time delta data must be a rank 1 float block, found {:?}",
                other
            )),
        }
    }

    fn plot_values(&self, sub: Option<&str>) -> Result<PlotValues> {
        let factor = match sub {
            None => return Ok(PlotValues::Floats(self.values())),
            Some("seconds") => 1.0,
            Some("minutes") => 60.0,
            Some("hours") => 3_600.0,
            Some("days") => SECONDS_PER_DAY,
            Some(other) => return Err(unknown_sub_field(Self::KIND, other)),
        };
        Ok(PlotValues::Floats(
            self.seconds.iter().map(|seconds| seconds / factor).collect(),
        ))
    }

    fn from_typed(array: &TypedArray) -> Option<&Self> {
        match array {
            TypedArray::TimeDelta(array) => Some(array),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_convert_to_seconds() {
        let array = TimeDeltaArray::new(&[1.0, 0.5], TimeScale::Gps, TimeFormat::Hours);
        assert_eq!(array.seconds(), &[3600.0, 1800.0]);
        assert_eq!(array.values(), vec![1.0, 0.5]);
        assert_eq!(array.scale(), TimeScale::Gps);
    }

    #[test]
    fn test_scale_and_format_names() {
        assert_eq!("tai".parse::<TimeScale>().unwrap(), TimeScale::Tai);
        assert_eq!(TimeFormat::Timedelta.to_string(), "timedelta");
        assert!("julian".parse::<TimeFormat>().is_err());
    }

    #[test]
    fn test_empty_is_zero_utc() {
        let array = TimeDeltaArray::new(&[5.0], TimeScale::Tt, TimeFormat::Minutes);
        let empty = array.empty_like(2);
        assert_eq!(empty.seconds(), &[0.0, 0.0]);
        assert_eq!(empty.scale(), TimeScale::Utc);
        assert_eq!(empty.fmt(), TimeFormat::Timedelta);
    }

    #[test]
    fn test_splice_keeps_target_scale() {
        let mut memo = MutationMemo::new();
        let target = TimeDeltaArray::new(&[10.0, 20.0], TimeScale::Gps, TimeFormat::Seconds);
        let spliced = target
            .splice(0, &TimeDeltaArray::zeros(1), &mut memo)
            .unwrap();
        assert_eq!(spliced.seconds(), &[0.0, 10.0, 20.0]);
        assert_eq!(spliced.scale(), TimeScale::Gps);

        let tai = TimeDeltaArray::new(&[0.5], TimeScale::Tai, TimeFormat::Minutes);
        let mixed = target.splice(2, &tai, &mut memo).unwrap();
        assert_eq!(mixed.seconds(), &[10.0, 20.0, 30.0]);
        assert_eq!(mixed.scale(), TimeScale::Gps);
        assert_eq!(mixed.fmt(), TimeFormat::Seconds);
    }

    #[test]
    fn test_plot_values() {
        let array = TimeDeltaArray::new(&[2.0], TimeScale::Utc, TimeFormat::Day);
        assert_eq!(array.plot_values(None).unwrap(), PlotValues::Floats(vec![2.0]));
        assert_eq!(
            array.plot_values(Some("hours")).unwrap(),
            PlotValues::Floats(vec![48.0])
        );
        assert!(array.plot_values(Some("fortnights")).is_err());
    }

    #[test]
    fn test_write_read() {
        let array = TimeDeltaArray::new(&[1.5, -2.0], TimeScale::Tai, TimeFormat::Minutes);
        let mut group = Group::new();
        array.write_data(&mut group, &mut WriteMemo::new()).unwrap();
        assert_eq!(group.attr_str("scale").unwrap(), "tai");

        let read = TimeDeltaArray::read_data(&group, &mut ReadMemo::new()).unwrap();
        assert_eq!(read, array);
    }
}
