//! The owning dataset that drives field mutation and persistence.
//!
//! A [`Dataset`] is an ordered collection of fields of equal length. Every structural
//! operation creates one fresh [`MutationMemo`], threads it through all fields and drops it
//! afterwards, so arrays shared between fields (or nested inside other arrays) are
//! transformed once and stay shared. Operations run on a copy of the field list, which is
//! only swapped in when every field succeeded.
//!
//! Persistence works the same way with a [`WriteMemo`] and a [`ReadMemo`]. The root group
//! records the number of observations and the field order in the `num_obs` and `fields`
//! attributes; fields are read back in that order, so a `reference` always follows the
//! group holding the physical copy.
//!
//! # Examples
//!
//! ```rust
//! use obsdata::{Dataset, FieldConfig, FieldValue};
//!
//! let mut dataset = Dataset::new(3);
//! dataset.add(
//!     "time_delta",
//!     "epoch",
//!     FieldValue::Floats(vec![0.0, 10.0, 20.0]),
//!     FieldConfig::new().with_scale("gps").with_fmt("seconds"),
//! )?;
//! dataset.prepend_empty(1)?;
//! assert_eq!(dataset.num_obs(), 4);
//! # Ok::<(), obsdata::Error>(())
//! ```

use std::path::Path;

use crate::{
    array::{check_indices, PlotValues},
    config::{DatasetConfig, FieldConfig, WriteLevel},
    field::{FieldRegistry, FieldType, FieldValue},
    memo::{MutationMemo, ReadMemo, WriteMemo},
    store::{self, Attr, Group},
    Error, Result,
};

/// An ordered set of named fields sharing one observation axis.
#[derive(Debug, Clone)]
pub struct Dataset {
    num_obs: usize,
    fields: Vec<Box<dyn FieldType>>,
    config: DatasetConfig,
}

impl Dataset {
    /// Creates an empty dataset of `num_obs` observations
    #[must_use]
    pub fn new(num_obs: usize) -> Self {
        Self::with_config(num_obs, DatasetConfig::default())
    }

    /// Creates an empty dataset of `num_obs` observations with a custom configuration
    #[must_use]
    pub fn with_config(num_obs: usize, config: DatasetConfig) -> Self {
        Dataset {
            num_obs,
            fields: Vec::new(),
            config,
        }
    }

    /// Number of observations
    #[must_use]
    pub fn num_obs(&self) -> usize {
        self.num_obs
    }

    /// The configuration
    #[must_use]
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the dataset has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in insertion order
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name()).collect()
    }

    /// Iterates over the fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = &dyn FieldType> {
        self.fields.iter().map(|field| &**field as &dyn FieldType)
    }

    /// Returns `true` if a field named `name` exists
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Looks up a field by name.
    ///
    /// # Errors
    /// Returns [`Error::FieldNotFound`] if there is no such field.
    pub fn field(&self, name: &str) -> Result<&dyn FieldType> {
        self.position(name)
            .map(|index| &*self.fields[index])
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))
    }

    /// Adds a field constructed by the field type registered under `tag`.
    ///
    /// # Errors
    /// Returns [`Error::Initialization`] for an invalid name, [`Error::DuplicateField`] if
    /// the name is taken, and any construction error of the field type.
    pub fn add(
        &mut self,
        tag: &str,
        name: &str,
        value: FieldValue,
        config: FieldConfig,
    ) -> Result<()> {
        self.check_new_name(name)?;
        let field = FieldRegistry::global().construct(tag, self.num_obs, name, value, config)?;
        log::debug!("added {} field '{}'", tag, name);
        self.fields.push(field);
        Ok(())
    }

    /// Adds a field `name` sharing the array of the existing field `other`.
    ///
    /// Both fields hold the same handle afterwards, and keep sharing it through every
    /// mutation and a write/read cycle.
    ///
    /// # Errors
    /// Returns [`Error::FieldNotFound`] if `other` does not exist, and the errors of
    /// [`Dataset::add`].
    pub fn add_shared(&mut self, name: &str, other: &str) -> Result<()> {
        let source = self.field(other)?;
        let tag = source.tag();
        let value = FieldValue::Array(source.data().clone());
        let config = source.core().config();
        self.add(tag, name, value, config)
    }

    /// Removes a field and returns it.
    ///
    /// # Errors
    /// Returns [`Error::FieldNotFound`] if there is no such field.
    pub fn remove(&mut self, name: &str) -> Result<Box<dyn FieldType>> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))?;
        Ok(self.fields.remove(index))
    }

    /// Keeps the observations at `indices`, in that order.
    ///
    /// # Errors
    /// Returns [`Error::Index`] for an index outside the dataset. The dataset is unchanged
    /// on error.
    pub fn subset(&mut self, indices: &[usize]) -> Result<()> {
        check_indices(indices, self.num_obs)?;
        self.mutate(indices.len(), |field, memo| field.subset(indices, memo))
    }

    /// Adds `num_obs` empty observations before the first one.
    ///
    /// # Errors
    /// Propagates field errors; the dataset is unchanged on error.
    pub fn prepend_empty(&mut self, num_obs: usize) -> Result<()> {
        self.mutate(self.num_obs + num_obs, |field, memo| {
            field.prepend_empty(num_obs, memo)
        })
    }

    /// Adds `num_obs` empty observations after the last one.
    ///
    /// # Errors
    /// Propagates field errors; the dataset is unchanged on error.
    pub fn append_empty(&mut self, num_obs: usize) -> Result<()> {
        self.mutate(self.num_obs + num_obs, |field, memo| {
            field.append_empty(num_obs, memo)
        })
    }

    /// Appends the observations of `other` after this dataset's.
    ///
    /// Fields present on only one side are padded with empty observations when
    /// [`DatasetConfig::fill_missing_on_extend`] is set, and are an error otherwise. Fields
    /// only in `other` are added after this dataset's fields.
    ///
    /// # Errors
    /// Returns [`Error::FieldNotFound`] for a missing field when padding is disabled, and
    /// [`Error::Shape`] if two fields of the same name are incompatible. The dataset is
    /// unchanged on error.
    pub fn extend(&mut self, other: &Dataset) -> Result<()> {
        if !self.config.fill_missing_on_extend {
            let missing = self
                .field_names()
                .into_iter()
                .find(|name| !other.has_field(name))
                .or_else(|| {
                    other
                        .field_names()
                        .into_iter()
                        .find(|name| !self.has_field(name))
                });
            if let Some(name) = missing {
                return Err(Error::FieldNotFound(name.to_string()));
            }
        }

        let mut memo = MutationMemo::new();
        let mut fields = self.fields.clone();
        for field in &mut fields {
            match other.position(field.name()) {
                Some(index) => field.extend(other.fields[index].as_ref(), &mut memo)?,
                None => field.append_empty(other.num_obs, &mut memo)?,
            }
        }

        for field in &other.fields {
            if self.has_field(field.name()) {
                continue;
            }
            log::debug!("padding field '{}' missing before extend", field.name());
            let mut field = field.clone();
            field.prepend_empty(self.num_obs, &mut memo)?;
            fields.push(field);
        }

        log::debug!(
            "extended {} observations by {} using {} memoized results",
            self.num_obs,
            other.num_obs,
            memo.len()
        );
        self.fields = fields;
        self.num_obs += other.num_obs;
        Ok(())
    }

    /// Values for plotting of a field, or of a sub-field given as `field.sub`.
    ///
    /// # Errors
    /// Returns [`Error::FieldNotFound`] for an unknown field or sub-field.
    pub fn plot_values(&self, key: &str) -> Result<PlotValues> {
        let (name, sub) = match key.split_once('.') {
            Some((name, sub)) => (name, Some(sub)),
            None => (key, None),
        };
        self.field(name)?.plot_values(sub)
    }

    /// Writes every field at `level` or above into `root`.
    ///
    /// Each field goes into a child group of its own name. An array shared by several fields
    /// is written once; the other fields store a reference to it.
    ///
    /// # Errors
    /// Propagates errors from the field writers.
    pub fn write(&self, root: &mut Group, level: WriteLevel) -> Result<()> {
        let mut memo = WriteMemo::new();
        let mut written = Vec::new();

        for field in self.fields.iter().filter(|field| field.core().write_level() >= level) {
            field.write(root.create_group(field.name()), &mut memo)?;
            written.push(field.name().to_string());
        }

        log::debug!(
            "wrote {} of {} fields, {} arrays stored physically",
            written.len(),
            self.fields.len(),
            memo.len()
        );
        root.set_attr(
            "num_obs",
            i64::try_from(self.num_obs).map_err(|_| Error::OutOfBounds)?,
        );
        root.set_attr("fields", written);
        Ok(())
    }

    /// Reads a dataset written by [`Dataset::write`].
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the root attributes are missing or a field does not
    /// match the number of observations, and any error of the field readers.
    pub fn read(root: &Group) -> Result<Dataset> {
        let num_obs = usize::try_from(root.attr_int("num_obs")?)
            .map_err(|_| malformed_error!("Negative number of observations"))?;
        let Some(names) = root.attr("fields").and_then(Attr::as_str_list) else {
            return Err(malformed_error!("Dataset has no field list"));
        };

        let registry = FieldRegistry::global();
        let mut memo = ReadMemo::new();
        let mut dataset = Dataset::new(num_obs);

        for name in names {
            let field = registry.read(root.group(name)?, &mut memo)?;
            if field.num_obs() != num_obs {
                return Err(malformed_error!(
                    "Field '{}' has {} observations, dataset has {}",
                    name,
                    field.num_obs(),
                    num_obs
                ));
            }
            if dataset.has_field(field.name()) {
                return Err(Error::DuplicateField(field.name().to_string()));
            }
            dataset.fields.push(field);
        }

        log::debug!("read {} fields of {} observations", dataset.len(), num_obs);
        Ok(dataset)
    }

    /// Writes the dataset to a store file, using the configured write level.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be written.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut root = Group::new();
        self.write(&mut root, self.config.write_level)?;
        store::write_file(path, &root)
    }

    /// Reads a dataset from a store file.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be opened, and
    /// [`Error::Malformed`] for damaged content.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Dataset> {
        Self::read(&store::read_file(path)?)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name() == name)
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        if name.is_empty() || name.contains('.') {
            return Err(initialization_error!(
                "name",
                "Field names must be non-empty and free of '.', got '{}'",
                name
            ));
        }
        if self.has_field(name) {
            return Err(Error::DuplicateField(name.to_string()));
        }
        Ok(())
    }

    /// Applies `operation` to copies of all fields with one memo, then swaps them in.
    fn mutate<F>(&mut self, num_obs: usize, mut operation: F) -> Result<()>
    where
        F: FnMut(&mut Box<dyn FieldType>, &mut MutationMemo) -> Result<()>,
    {
        let mut memo = MutationMemo::new();
        let mut fields = self.fields.clone();
        for field in &mut fields {
            operation(field, &mut memo)?;
        }

        log::debug!(
            "{} -> {} observations, {} arrays replaced",
            self.num_obs,
            num_obs,
            memo.len()
        );
        self.fields = fields;
        self.num_obs = num_obs;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{FloatArray, TimeDeltaArray};

    fn epochs(seconds: Vec<f64>) -> Dataset {
        let mut dataset = Dataset::new(seconds.len());
        dataset
            .add(
                "time_delta",
                "epoch",
                FieldValue::Floats(seconds),
                FieldConfig::new().with_scale("gps").with_fmt("seconds"),
            )
            .unwrap();
        dataset
    }

    fn seconds(dataset: &Dataset, name: &str) -> Vec<f64> {
        dataset
            .field(name)
            .unwrap()
            .data()
            .downcast::<TimeDeltaArray>()
            .unwrap()
            .seconds()
            .to_vec()
    }

    #[test]
    fn test_add_rejects_bad_names() {
        let mut dataset = epochs(vec![0.0]);
        let duplicate = dataset.add(
            "float",
            "epoch",
            FieldValue::Floats(vec![1.0]),
            FieldConfig::new(),
        );
        assert!(matches!(duplicate, Err(Error::DuplicateField(name)) if name == "epoch"));

        let dotted = dataset.add(
            "float",
            "site.x",
            FieldValue::Floats(vec![1.0]),
            FieldConfig::new(),
        );
        assert!(matches!(
            dotted,
            Err(Error::Initialization { parameter, .. }) if parameter == "name"
        ));
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_add_length_mismatch() {
        let mut dataset = epochs(vec![0.0, 1.0]);
        let result = dataset.add(
            "float",
            "residual",
            FieldValue::Floats(vec![1.0]),
            FieldConfig::new(),
        );
        assert!(matches!(result, Err(Error::Shape { .. })));
        assert!(!dataset.has_field("residual"));
    }

    #[test]
    fn test_prepend_epoch() {
        let mut dataset = epochs(vec![0.0, 10.0, 20.0]);
        dataset.prepend_empty(1).unwrap();
        assert_eq!(dataset.num_obs(), 4);
        assert_eq!(seconds(&dataset, "epoch"), vec![0.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_shared_field_survives_mutation() {
        let mut dataset = epochs(vec![0.0, 10.0, 20.0]);
        dataset.add_shared("time", "epoch").unwrap();

        dataset.subset(&[2, 1]).unwrap();
        dataset.append_empty(1).unwrap();

        let epoch = dataset.field("epoch").unwrap().data();
        let time = dataset.field("time").unwrap().data();
        assert!(epoch.same_array(time));
        assert_eq!(seconds(&dataset, "time"), vec![20.0, 10.0, 0.0]);
    }

    #[test]
    fn test_failed_subset_leaves_dataset() {
        let mut dataset = epochs(vec![0.0, 10.0]);
        let before = dataset.field("epoch").unwrap().data().clone();
        assert!(matches!(
            dataset.subset(&[0, 7]),
            Err(Error::Index { index: 7, .. })
        ));
        assert_eq!(dataset.num_obs(), 2);
        assert!(dataset.field("epoch").unwrap().data().same_array(&before));
    }

    #[test]
    fn test_extend_pads_missing_fields() {
        let mut left = epochs(vec![0.0, 1.0]);
        let mut right = epochs(vec![2.0]);
        right
            .add(
                "float",
                "residual",
                FieldValue::Floats(vec![0.5]),
                FieldConfig::new(),
            )
            .unwrap();

        left.extend(&right).unwrap();
        assert_eq!(left.num_obs(), 3);
        assert_eq!(left.field_names(), vec!["epoch", "residual"]);
        assert_eq!(seconds(&left, "epoch"), vec![0.0, 1.0, 2.0]);

        let residual = left.field("residual").unwrap().data();
        let values = residual.downcast::<FloatArray>().unwrap().values();
        assert!(values[0].is_nan() && values[1].is_nan());
        assert_eq!(values[2], 0.5);
    }

    #[test]
    fn test_extend_strict_requires_same_fields() {
        let mut left = Dataset::with_config(0, DatasetConfig::strict());
        let mut right = epochs(vec![2.0]);
        right.config = DatasetConfig::strict();

        assert!(matches!(
            left.extend(&right),
            Err(Error::FieldNotFound(name)) if name == "epoch"
        ));
        assert_eq!(left.num_obs(), 0);
    }

    #[test]
    fn test_extend_kind_mismatch_leaves_dataset() {
        let mut left = epochs(vec![0.0]);
        left.add(
            "float",
            "value",
            FieldValue::Floats(vec![1.0]),
            FieldConfig::new(),
        )
        .unwrap();
        let mut right = epochs(vec![5.0]);
        right
            .add(
                "text",
                "value",
                FieldValue::Text(vec!["x".to_string()]),
                FieldConfig::new(),
            )
            .unwrap();

        assert!(matches!(left.extend(&right), Err(Error::Shape { .. })));
        assert_eq!(left.num_obs(), 1);
        assert_eq!(seconds(&left, "epoch"), vec![0.0]);
    }

    #[test]
    fn test_write_level_filter() {
        let mut dataset = epochs(vec![0.0]);
        dataset
            .add(
                "float",
                "partial",
                FieldValue::Floats(vec![1.0]),
                FieldConfig::new().with_write_level(WriteLevel::Detail),
            )
            .unwrap();

        let mut root = Group::new();
        dataset.write(&mut root, WriteLevel::Analysis).unwrap();
        assert!(root.has_group("epoch"));
        assert!(!root.has_group("partial"));

        let read = Dataset::read(&root).unwrap();
        assert_eq!(read.field_names(), vec!["epoch"]);
    }

    #[test]
    fn test_read_without_field_list() {
        let mut root = Group::new();
        root.set_attr("num_obs", 0_i64);
        assert!(matches!(
            Dataset::read(&root),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_plot_values() {
        let dataset = epochs(vec![0.0, 86_400.0]);
        assert_eq!(
            dataset.plot_values("epoch.days").unwrap(),
            PlotValues::Floats(vec![0.0, 1.0])
        );
        assert!(matches!(
            dataset.plot_values("altitude"),
            Err(Error::FieldNotFound(_))
        ));
    }
}
