//! # obsdata Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the obsdata library. Import this module to get quick access to datasets, fields
//! and arrays.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all obsdata operations
pub use crate::Error;

/// The result type used throughout obsdata
pub use crate::Result;

/// Construction arguments, write levels and dataset presets
pub use crate::{DatasetConfig, FieldConfig, WriteLevel};

// ================================================================================================
// Datasets and Fields
// ================================================================================================

/// The owning dataset
pub use crate::Dataset;

/// Field protocol, raw values and the registry
pub use crate::field::{FieldDescriptor, FieldFactory, FieldRegistry, FieldType, FieldValue};

// ================================================================================================
// Arrays
// ================================================================================================

/// The shared handle, capability contract and concrete arrays
pub use crate::array::{
    ArrayData, ArrayKind, ArrayRef, BoolArray, FloatArray, PlotValues, PositionArray, TextArray,
    TimeDeltaArray, TimeFormat, TimeScale, TypedArray,
};

/// Operation-scoped memo tables
pub use crate::memo::{ArrayId, Mutation, MutationMemo, ReadMemo, WriteMemo};

// ================================================================================================
// Persistence
// ================================================================================================

/// Store groups and their content
pub use crate::store::{Attr, Data, Group};
