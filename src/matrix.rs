//! Small dense matrix library used by the touch calibration solver.
//!
//! Storage is a fixed-capacity row-major buffer, so a matrix never touches
//! the heap and is released when it goes out of scope. Determinants use
//! recursive cofactor expansion, which is exponential in the matrix size;
//! the calibration solver only ever feeds it 3x3 normal matrices.

use core::{
    fmt,
    ops::{Index, IndexMut},
};

use heapless::Vec;

use crate::error::{MatrixError, MatrixParseError};

/// Upper bound on `rows * cols` for any matrix.
pub const MATRIX_MAX_CELLS: usize = 64;

const MATRIX_HEADER_PREFIX: &str = "Matrix R:";
const MATRIX_HEADER_COLS: &str = "C:";

#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64, MATRIX_MAX_CELLS>,
}

impl Matrix {
    /// Zero-filled `rows x cols` matrix. Zero dimensions are clamped to 1.
    pub fn alloc(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        let rows = rows.max(1);
        let cols = cols.max(1);
        let cells = rows
            .checked_mul(cols)
            .filter(|cells| *cells <= MATRIX_MAX_CELLS)
            .ok_or(MatrixError::AllocationFailure { rows, cols })?;
        let mut data = Vec::new();
        data.resize(cells, 0.0)
            .map_err(|_| MatrixError::AllocationFailure { rows, cols })?;
        Ok(Self { rows, cols, data })
    }

    pub fn alloc_square(size: usize) -> Result<Self, MatrixError> {
        Self::alloc(size, size)
    }

    pub fn identity(size: usize) -> Result<Self, MatrixError> {
        let mut out = Self::alloc_square(size)?;
        for i in 0..out.rows {
            out[(i, i)] = 1.0;
        }
        Ok(out)
    }

    /// Builds a matrix from row-major `values`.
    pub fn load(rows: usize, cols: usize, values: &[f64]) -> Result<Self, MatrixError> {
        let mut out = Self::alloc(rows, cols)?;
        if values.len() != out.data.len() {
            return Err(MatrixError::LengthMismatch {
                expected: out.data.len(),
                actual: values.len(),
            });
        }
        out.data.copy_from_slice(values);
        Ok(out)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Edge length for square matrices.
    pub fn size(&self) -> Option<usize> {
        self.is_square().then_some(self.rows)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        self.data.get(start..start + self.cols)
    }

    fn check_index(&self, row: usize, col: usize) -> Result<(), MatrixError> {
        if row >= self.rows || col >= self.cols {
            return Err(MatrixError::IndexOutOfRange { row, col });
        }
        Ok(())
    }

    pub fn transpose(&self) -> Self {
        let mut out = self.clone();
        out.rows = self.cols;
        out.cols = self.rows;
        for r in 0..self.rows {
            for c in 0..self.cols {
                out[(c, r)] = self[(r, c)];
            }
        }
        out
    }

    /// `self * rhs`; the result is `self.rows() x rhs.cols()`.
    pub fn multiply(&self, rhs: &Matrix) -> Result<Self, MatrixError> {
        if self.cols != rhs.rows {
            return Err(MatrixError::DimensionMismatch {
                left_cols: self.cols,
                right_rows: rhs.rows,
            });
        }
        let mut out = Self::alloc(self.rows, rhs.cols)?;
        for r in 0..self.rows {
            for c in 0..rhs.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self[(r, k)] * rhs[(k, c)];
                }
                out[(r, c)] = sum;
            }
        }
        Ok(out)
    }

    /// Submatrix with `row` and `col` removed.
    pub fn delete_row_col(&self, row: usize, col: usize) -> Result<Self, MatrixError> {
        self.check_index(row, col)?;
        if self.rows < 2 || self.cols < 2 {
            return Err(MatrixError::TooSmall {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let mut out = Self::alloc(self.rows - 1, self.cols - 1)?;
        let mut out_r = 0;
        for r in (0..self.rows).filter(|r| *r != row) {
            let mut out_c = 0;
            for c in (0..self.cols).filter(|c| *c != col) {
                out[(out_r, out_c)] = self[(r, c)];
                out_c += 1;
            }
            out_r += 1;
        }
        Ok(out)
    }

    pub fn minor(&self, row: usize, col: usize) -> Result<f64, MatrixError> {
        self.delete_row_col(row, col)?.determinant()
    }

    /// `(-1)^(row + col) * minor(row, col)`.
    pub fn cofactor(&self, row: usize, col: usize) -> Result<f64, MatrixError> {
        let minor = self.minor(row, col)?;
        Ok(if (row + col) & 1 == 1 { -minor } else { minor })
    }

    pub fn determinant(&self) -> Result<f64, MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        match self.rows {
            1 => Ok(self[(0, 0)]),
            2 => Ok(self[(0, 0)] * self[(1, 1)] - self[(1, 0)] * self[(0, 1)]),
            n => {
                let mut det = 0.0;
                for col in 0..n {
                    det += self[(0, col)] * self.cofactor(0, col)?;
                }
                Ok(det)
            }
        }
    }

    /// Transpose of the cofactor matrix. A 1x1 matrix has adjugate `[1]`.
    pub fn adjugate(&self) -> Result<Self, MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.rows == 1 {
            return Self::identity(1);
        }
        let mut out = Self::alloc(self.cols, self.rows)?;
        for r in 0..self.rows {
            for c in 0..self.cols {
                out[(c, r)] = self.cofactor(r, c)?;
            }
        }
        Ok(out)
    }

    /// `adjugate / determinant`.
    pub fn invert(&self) -> Result<Self, MatrixError> {
        let det = self.determinant()?;
        if det == 0.0 {
            return Err(MatrixError::SingularMatrix);
        }
        let mut out = self.adjugate()?;
        for value in out.data.iter_mut() {
            *value /= det;
        }
        Ok(out)
    }

    /// Left pseudo-inverse `(At * A)^-1 * At`, the least-squares solver for
    /// overdetermined systems.
    pub fn pseudo_invert(&self) -> Result<Self, MatrixError> {
        let transposed = self.transpose();
        let normal = transposed.multiply(self)?;
        normal.invert()?.multiply(&transposed)
    }

    /// Reads the text form produced by `Display`.
    pub fn parse(text: &str) -> Result<Self, MatrixError> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header = lines.next().ok_or(MatrixParseError::MissingHeader)?;
        let (rows, cols) = parse_header(header)?;
        let mut out = Self::alloc(rows, cols)?;
        for r in 0..rows {
            let line = lines.next().ok_or(MatrixParseError::MissingRow(r))?;
            let mut values = line.split_whitespace();
            for c in 0..cols {
                out[(r, c)] = values
                    .next()
                    .and_then(|value| value.parse::<f64>().ok())
                    .ok_or(MatrixParseError::BadValue { row: r, col: c })?;
            }
        }
        Ok(out)
    }
}

fn parse_header(line: &str) -> Result<(usize, usize), MatrixParseError> {
    let rest = line
        .trim()
        .strip_prefix(MATRIX_HEADER_PREFIX)
        .ok_or(MatrixParseError::MissingHeader)?;
    let (rows, cols) = rest
        .split_once(MATRIX_HEADER_COLS)
        .ok_or(MatrixParseError::BadHeader)?;
    let rows = rows
        .trim()
        .parse::<usize>()
        .map_err(|_| MatrixParseError::BadHeader)?;
    let cols = cols
        .trim()
        .parse::<usize>()
        .map_err(|_| MatrixParseError::BadHeader)?;
    if rows == 0 || cols == 0 {
        return Err(MatrixParseError::BadHeader);
    }
    Ok((rows, cols))
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.data[row * self.cols + col]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{MATRIX_HEADER_PREFIX}{} {MATRIX_HEADER_COLS}{}",
            self.rows, self.cols
        )?;
        for row in self.data.chunks(self.cols) {
            for (c, value) in row.iter().enumerate() {
                if c > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{value:e}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
