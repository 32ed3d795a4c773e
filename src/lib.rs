// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'store/mod.rs' uses mmap to map a store file into memory

//! # obsdata
//!
//! The field and typed-array core of a columnar container for observational time series,
//! such as geodetic measurements. A [`Dataset`] holds named fields of equal length; every
//! field owns one typed array and knows how to grow, shrink, merge and persist it.
//!
//! ## Features
//!
//! - **Pluggable field types** - fields are created by tag through a [`field::FieldRegistry`]
//! - **Structural sharing** - arrays are immutable and shared through handles; aliasing
//!   between fields, and between a field and an array nested in another field, survives
//!   every mutation
//! - **Self-describing persistence** - a hierarchical binary store with integrity check,
//!   writing each shared array once
//!
//! ## Quick Start
//!
//! ```rust
//! use obsdata::prelude::*;
//!
//! let mut dataset = Dataset::new(3);
//! dataset.add(
//!     "time_delta",
//!     "epoch",
//!     FieldValue::Floats(vec![0.0, 10.0, 20.0]),
//!     FieldConfig::new().with_scale("gps").with_fmt("seconds"),
//! )?;
//!
//! // Nest the very same time array inside the positions
//! let time = dataset.field("epoch")?.data().clone();
//! dataset.add(
//!     "position",
//!     "site_pos",
//!     FieldValue::Positions(vec![[1.0, 2.0, 3.0]; 3]),
//!     FieldConfig::new().with_system("trs").with_time(time),
//! )?;
//!
//! dataset.subset(&[2, 0])?;
//! dataset.prepend_empty(1)?;
//!
//! let epoch = dataset.field("epoch")?.data().clone();
//! let positions = dataset.field("site_pos")?.data().clone();
//! let nested = positions.downcast::<PositionArray>().and_then(PositionArray::time);
//! assert!(nested.is_some_and(|time| time.same_array(&epoch)));
//! # Ok::<(), obsdata::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`array`] - the typed arrays, the shared [`array::ArrayRef`] handle and the capability
//!   contract [`array::ArrayData`]
//! - [`memo`] - array identities and the operation-scoped memo tables
//! - [`field`] - field types, the [`field::FieldType`] mutation protocol and the registry
//! - [`store`] - groups, attributes, data blocks and their binary encoding
//! - [`Dataset`] - the owning driver of mutation and persistence
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. A failed mutation leaves the field and the dataset
//! as they were.
#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use obsdata::prelude::*;
///
/// let dataset = Dataset::new(0);
/// assert!(dataset.is_empty());
/// ```
pub mod prelude;

/// Typed arrays and the shared array handle.
pub mod array;

/// Field construction arguments and dataset configuration.
pub mod config;

/// The owning dataset.
pub mod dataset;

/// Field types and the field registry.
pub mod field;

/// Array identities and memo tables.
pub mod memo;

/// Hierarchical binary store.
pub mod store;

/// `obsdata` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `obsdata` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust
/// use obsdata::{Dataset, Error};
///
/// let mut dataset = Dataset::new(2);
/// match dataset.subset(&[0, 5]) {
///     Err(Error::Index { index, len }) => assert_eq!((index, len), (5, 2)),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
pub use error::Error;

pub use config::{DatasetConfig, FieldConfig, WriteLevel};
pub use dataset::Dataset;
pub use field::{FieldType, FieldValue};
