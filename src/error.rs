use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! initialization_error {
    ($parameter:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::Initialization {
            parameter: $parameter.to_string(),
            message: format!($fmt $(, $arg)*),
        }
    };
}

macro_rules! shape_error {
    ($left:expr, $right:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::Shape {
            message: format!($fmt $(, $arg)*),
            left: $left.to_string(),
            right: $right.to_string(),
        }
    };
}

/// The generic Error type, which covers every failure this library can report.
///
/// Mutation and construction errors are raised synchronously at the point of violation
/// and are never retried. A failed mutation leaves the field (and the owning
/// [`crate::Dataset`]) exactly as it was before the call.
///
/// # Error Categories
///
/// ## Field Errors
/// - [`Error::Initialization`] - Missing or conflicting construction argument
/// - [`Error::Shape`] - Length, rank, kind or column mismatch between two operands
/// - [`Error::Index`] - Subset index or insert position outside the array
///
/// ## Registry and Dataset Errors
/// - [`Error::UnknownFieldType`] / [`Error::DuplicateFieldType`]
/// - [`Error::FieldNotFound`] / [`Error::DuplicateField`]
///
/// ## Store Errors
/// - [`Error::Malformed`] - Corrupted or inconsistent store content
/// - [`Error::OutOfBounds`] - Read past the end of a store buffer
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// # Examples
///
/// ```rust
/// use obsdata::{Error, FieldConfig, FieldValue, field::FieldRegistry};
///
/// let registry = FieldRegistry::global();
/// let result = registry.construct(
///     "time_delta",
///     2,
///     "epoch",
///     FieldValue::Floats(vec![0.0, 10.0]),
///     FieldConfig::new(),
/// );
///
/// match result {
///     Err(Error::Initialization { parameter, .. }) => assert_eq!(parameter, "scale"),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A required construction argument is missing or conflicts with the field type.
    ///
    /// # Fields
    ///
    /// * `parameter` - Name of the missing or offending argument
    /// * `message` - Human readable description
    #[error("Initialization of '{parameter}' failed: {message}")]
    Initialization {
        /// The argument which caused the failure
        parameter: String,
        /// Description of the failure
        message: String,
    },

    /// Two operands do not agree in length, rank, kind or column count.
    ///
    /// Both operand shapes are carried so the caller can report them.
    #[error("{message} ({left} != {right})")]
    Shape {
        /// Description of the mismatch
        message: String,
        /// Shape of the left hand operand (usually the field being mutated)
        left: String,
        /// Shape of the right hand operand
        right: String,
    },

    /// An index or insert position lies outside the array.
    #[error("Index {index} is out of range for {len} observations")]
    Index {
        /// The offending index
        index: usize,
        /// Number of observations in the array
        len: usize,
    },

    /// No field type is registered under this tag.
    #[error("Unknown field type '{0}'")]
    UnknownFieldType(String),

    /// A field type with this tag is already registered.
    #[error("Field type '{0}' is already registered")]
    DuplicateFieldType(String),

    /// The dataset has no field with this name.
    #[error("Field '{0}' not found")]
    FieldNotFound(String),

    /// The dataset already has a field with this name.
    #[error("Field '{0}' already exists")]
    DuplicateField(String),

    /// The store content is damaged or inconsistent.
    ///
    /// The error includes the source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while decoding a store buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
