//! Field construction arguments and dataset configuration
//!
//! [`FieldConfig`] carries the keyword-style arguments a field type may need at construction
//! time. Which of them are required, and which are rejected, is decided by the concrete
//! field type; a missing required argument is reported as
//! [`crate::Error::Initialization`] naming the argument.
//!
//! [`DatasetConfig`] controls the behaviour of the owning [`crate::Dataset`].

use strum::{Display, EnumIter, EnumString};

use crate::array::ArrayRef;

/// Importance of a field, used to filter fields when writing a dataset.
///
/// Levels are ordered: `Detail < Analysis < Operational`. Writing a dataset with a given
/// level writes every field at that level or above.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum WriteLevel {
    /// Intermediate values, only written on request
    Detail,
    /// Values needed to analyse a result
    Analysis,
    /// Values every consumer needs
    #[default]
    Operational,
}

/// Construction arguments for a field.
///
/// All arguments are optional at the type level; field types validate what they need.
///
/// # Examples
///
/// ```rust
/// use obsdata::{FieldConfig, WriteLevel};
///
/// let config = FieldConfig::new()
///     .with_scale("gps")
///     .with_fmt("seconds")
///     .with_write_level(WriteLevel::Analysis);
/// assert_eq!(config.scale.as_deref(), Some("gps"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldConfig {
    /// Display unit of the values
    pub unit: Option<String>,
    /// Time scale of time-like values (`utc`, `tai`, `tt`, `gps`)
    pub scale: Option<String>,
    /// Format the raw time-like values are given in (`seconds`, `timedelta`, `minutes`, ...)
    pub fmt: Option<String>,
    /// Reference system of positions (free text, e.g. `trs`)
    pub system: Option<String>,
    /// Time array to nest inside a position array, usually the dataset's time field
    pub time: Option<ArrayRef>,
    /// Importance of the field when writing
    pub write_level: WriteLevel,
    /// Free-text description
    pub description: Option<String>,
}

impl FieldConfig {
    /// Creates an empty configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display unit
    #[must_use]
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// Sets the time scale
    #[must_use]
    pub fn with_scale(mut self, scale: &str) -> Self {
        self.scale = Some(scale.to_string());
        self
    }

    /// Sets the time format
    #[must_use]
    pub fn with_fmt(mut self, fmt: &str) -> Self {
        self.fmt = Some(fmt.to_string());
        self
    }

    /// Sets the reference system
    #[must_use]
    pub fn with_system(mut self, system: &str) -> Self {
        self.system = Some(system.to_string());
        self
    }

    /// Nests `time` inside the constructed array
    #[must_use]
    pub fn with_time(mut self, time: ArrayRef) -> Self {
        self.time = Some(time);
        self
    }

    /// Sets the write level
    #[must_use]
    pub fn with_write_level(mut self, write_level: WriteLevel) -> Self {
        self.write_level = write_level;
        self
    }

    /// Sets the description
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Behaviour of a [`crate::Dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetConfig {
    /// Lowest [`WriteLevel`] written by [`crate::Dataset::write`]
    pub write_level: WriteLevel,

    /// When extending, fields present on only one side are padded with empty observations.
    /// When disabled, both datasets must have the same field names.
    pub fill_missing_on_extend: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            write_level: WriteLevel::Detail,
            fill_missing_on_extend: true,
        }
    }
}

impl DatasetConfig {
    /// Writes only operational fields and requires identical fields when extending
    #[must_use]
    pub fn strict() -> Self {
        Self {
            write_level: WriteLevel::Operational,
            fill_missing_on_extend: false,
        }
    }
}
