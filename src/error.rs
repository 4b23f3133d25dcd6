use std::{error, fmt};

/// Errors raised while configuring or feeding statistics structures.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsError {
    /// A field set was created from an empty list of fields.
    EmptyFieldSet,

    /// Two fields in one schema share a name but disagree on their type.
    DuplicateField(String),

    /// A range list was created without any ranges.
    EmptyRangeList,

    /// A range was created with its beginning past its end.
    InvalidRange { begin: f64, end: f64 },

    /// A field or attribute name was empty.
    InvalidFieldName,

    /// A data set builder was used after `build` was called on it.
    AlreadyBuilt,

    /// A stored value could not be read back as the requested type.
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A data recorder failed internally.
    Recorder(String),
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StatsError::EmptyFieldSet => write!(f, "field set requires at least one field"),
            StatsError::DuplicateField(name) => write!(f, "field '{}' declared twice with different types", name),
            StatsError::EmptyRangeList => write!(f, "range list requires at least one range"),
            StatsError::InvalidRange { begin, end } => write!(f, "range begin {} is greater than end {}", begin, end),
            StatsError::InvalidFieldName => write!(f, "field name must not be empty"),
            StatsError::AlreadyBuilt => write!(f, "data set builder has already been built"),
            StatsError::TypeMismatch { name, expected, actual } => {
                write!(f, "field '{}' holds {} but {} was requested", name, actual, expected)
            },
            StatsError::Recorder(reason) => write!(f, "data recorder failure: {}", reason),
        }
    }
}

impl error::Error for StatsError {}
