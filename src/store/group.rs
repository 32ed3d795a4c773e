use std::collections::BTreeMap;

use crate::Result;

/// A scalar or list attribute attached to a [`Group`].
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    /// UTF-8 string
    Str(String),
    /// Signed 64 bit integer
    Int(i64),
    /// 64 bit float
    Float(f64),
    /// Ordered list of strings
    StrList(Vec<String>),
}

impl Attr {
    /// Returns the string value, if this is a string attribute
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attr::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer attribute
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attr::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the list value, if this is a list attribute
    #[must_use]
    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Attr::StrList(values) => Some(values),
            _ => None,
        }
    }
}

impl From<&str> for Attr {
    fn from(value: &str) -> Self {
        Attr::Str(value.to_string())
    }
}

impl From<String> for Attr {
    fn from(value: String) -> Self {
        Attr::Str(value)
    }
}

impl From<i64> for Attr {
    fn from(value: i64) -> Self {
        Attr::Int(value)
    }
}

impl From<f64> for Attr {
    fn from(value: f64) -> Self {
        Attr::Float(value)
    }
}

impl From<Vec<String>> for Attr {
    fn from(values: Vec<String>) -> Self {
        Attr::StrList(values)
    }
}

/// A typed n-dimensional data block stored inside a [`Group`].
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// Row-major floats with an explicit shape
    Float {
        /// Extent of every dimension, the first one is the observation axis
        shape: Vec<usize>,
        /// `shape.iter().product()` values
        values: Vec<f64>,
    },
    /// One boolean per observation
    Bool(Vec<bool>),
    /// One string per observation
    Text(Vec<String>),
}

impl Data {
    /// Number of entries along the first axis
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Data::Float { shape, .. } => shape.first().copied().unwrap_or(0),
            Data::Bool(values) => values.len(),
            Data::Text(values) => values.len(),
        }
    }

    /// Returns `true` if the block holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A node of the hierarchical store.
///
/// A group holds named attributes, named data blocks and named child groups. Every field of
/// a dataset is written to its own group, and arrays with nested sub-arrays write those into
/// child groups. Names are kept sorted, so encoding a group is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    attrs: BTreeMap<String, Attr>,
    data: BTreeMap<String, Data>,
    groups: BTreeMap<String, Group>,
}

impl Group {
    /// Creates an empty group
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) an attribute
    pub fn set_attr(&mut self, name: &str, value: impl Into<Attr>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    /// Returns an attribute, if present
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.get(name)
    }

    /// Returns a string attribute.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the attribute is missing or not a string.
    pub fn attr_str(&self, name: &str) -> Result<&str> {
        self.attr(name)
            .and_then(Attr::as_str)
            .ok_or_else(|| malformed_error!("Missing string attribute '{}'", name))
    }

    /// Returns an integer attribute.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the attribute is missing or not an integer.
    pub fn attr_int(&self, name: &str) -> Result<i64> {
        self.attr(name)
            .and_then(Attr::as_int)
            .ok_or_else(|| malformed_error!("Missing integer attribute '{}'", name))
    }

    /// Iterates over all attributes in name order
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Attr)> {
        self.attrs.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    /// Stores (or replaces) a data block
    pub fn set_data(&mut self, name: &str, data: Data) {
        self.data.insert(name.to_string(), data);
    }

    /// Returns a data block.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if there is no block with this name.
    pub fn data(&self, name: &str) -> Result<&Data> {
        self.data
            .get(name)
            .ok_or_else(|| malformed_error!("Missing data block '{}'", name))
    }

    /// Iterates over all data blocks in name order
    pub fn data_blocks(&self) -> impl Iterator<Item = (&str, &Data)> {
        self.data.iter().map(|(name, data)| (name.as_str(), data))
    }

    /// Returns the child group with this name, creating an empty one if needed
    pub fn create_group(&mut self, name: &str) -> &mut Group {
        self.groups.entry(name.to_string()).or_default()
    }

    /// Inserts (or replaces) a child group
    pub fn insert_group(&mut self, name: &str, group: Group) {
        self.groups.insert(name.to_string(), group);
    }

    /// Returns a child group.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if there is no child with this name.
    pub fn group(&self, name: &str) -> Result<&Group> {
        self.groups
            .get(name)
            .ok_or_else(|| malformed_error!("Missing group '{}'", name))
    }

    /// Returns `true` if a child group with this name exists
    #[must_use]
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Iterates over all child groups in name order
    pub fn groups(&self) -> impl Iterator<Item = (&str, &Group)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }
}
