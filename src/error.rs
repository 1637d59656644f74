use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixParseError {
    MissingHeader,
    BadHeader,
    MissingRow(usize),
    BadValue { row: usize, col: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixError {
    DimensionMismatch { left_cols: usize, right_rows: usize },
    NotSquare { rows: usize, cols: usize },
    SingularMatrix,
    AllocationFailure { rows: usize, cols: usize },
    TooSmall { rows: usize, cols: usize },
    IndexOutOfRange { row: usize, col: usize },
    LengthMismatch { expected: usize, actual: usize },
    Parse(MatrixParseError),
}

impl From<MatrixParseError> for MatrixError {
    fn from(value: MatrixParseError) -> Self {
        Self::Parse(value)
    }
}

impl fmt::Display for MatrixParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => f.write_str("missing `Matrix R:<rows> C:<cols>` header"),
            Self::BadHeader => f.write_str("malformed matrix header"),
            Self::MissingRow(row) => write!(f, "missing matrix row {row}"),
            Self::BadValue { row, col } => write!(f, "bad matrix value at row {row} col {col}"),
        }
    }
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch {
                left_cols,
                right_rows,
            } => write!(
                f,
                "matrix dimension mismatch: left cols({left_cols}) != right rows({right_rows})"
            ),
            Self::NotSquare { rows, cols } => {
                write!(f, "matrix must be square, got {rows}x{cols}")
            }
            Self::SingularMatrix => f.write_str("matrix is singular"),
            Self::AllocationFailure { rows, cols } => {
                write!(f, "cannot allocate {rows}x{cols} matrix")
            }
            Self::TooSmall { rows, cols } => {
                write!(f, "matrix {rows}x{cols} too small to delete a row and column")
            }
            Self::IndexOutOfRange { row, col } => {
                write!(f, "matrix index out of range row={row} col={col}")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} matrix values, got {actual}")
            }
            Self::Parse(err) => write!(f, "matrix parse error: {err}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchError {
    /// No run in the sample burst reached the minimum length.
    InsufficientSamples,
    /// Debounced event dropped because the queue was full.
    QueueFull,
    /// Mapping was attempted before a calibration was stored.
    Uncalibrated,
    Matrix(MatrixError),
}

impl From<MatrixError> for TouchError {
    fn from(value: MatrixError) -> Self {
        Self::Matrix(value)
    }
}

impl fmt::Display for TouchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientSamples => f.write_str("not enough stable samples"),
            Self::QueueFull => f.write_str("touch event queue full"),
            Self::Uncalibrated => f.write_str("touch screen is not calibrated"),
            Self::Matrix(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationError {
    Matrix(MatrixError),
    Cancelled { captured: usize },
    Complete,
}

impl From<MatrixError> for CalibrationError {
    fn from(value: MatrixError) -> Self {
        Self::Matrix(value)
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matrix(err) => write!(f, "calibration solve failed: {err}"),
            Self::Cancelled { captured } => {
                write!(f, "calibration cancelled after {captured} point(s)")
            }
            Self::Complete => f.write_str("calibration session already complete"),
        }
    }
}
