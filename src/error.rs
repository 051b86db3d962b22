use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DensityTreeError {
    #[error("Dataset has no points or no dimensions")]
    EmptyDataset,
    #[error("Row {row} has {found} values, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value at row {row}, column {col}")]
    NonFiniteValue { row: usize, col: usize },
    #[error("Failed to read CSV input: {0}")]
    Csv(String),
    #[error("Cannot parse {value:?} at row {row}, column {col} as a number")]
    ParseValue {
        row: usize,
        col: usize,
        value: String,
    },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Subset of {points} points is too small, at least {required} required")]
    InsufficientData { points: usize, required: usize },
    #[error("Column {col} is constant, no Gaussian can be fitted to the dataset")]
    ConstantColumn { col: usize },
    #[error("Covariance matrix is singular or numerically degenerate")]
    DegenerateCovariance,
    #[error("No candidate split leaves both sides with a valid Gaussian fit")]
    NoInformativeSplit,
}

impl DensityTreeError {
    /// Failures that only truncate growth on one branch.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            DensityTreeError::InsufficientData { .. }
                | DensityTreeError::DegenerateCovariance
                | DensityTreeError::NoInformativeSplit
        )
    }
}

impl From<csv::Error> for DensityTreeError {
    fn from(e: csv::Error) -> Self {
        DensityTreeError::Csv(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DensityTreeError>;
