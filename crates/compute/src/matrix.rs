use scatter_core::ScatterError;

/// Dense row-major feature matrix stacked from valid feature vectors.
///
/// Construction validates shape and values, so every downstream consumer can
/// assume a non-empty, rectangular, finite matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl FeatureMatrix {
    /// Stack rows into a matrix.
    ///
    /// # Errors
    /// * [`ScatterError::EmptyFeatureMatrix`]: no rows, or zero-width rows
    /// * [`ScatterError::RaggedFeatureMatrix`]: a row width differs from the first
    /// * [`ScatterError::NonFiniteFeature`]: a NaN or infinite entry
    pub fn from_rows<'a, I>(rows: I) -> Result<Self, ScatterError>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut data = Vec::new();
        let mut n_cols = 0;
        let mut n_rows = 0;

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row_idx == 0 {
                n_cols = row.len();
            } else if row.len() != n_cols {
                return Err(ScatterError::RaggedFeatureMatrix {
                    row: row_idx,
                    expected: n_cols,
                    found: row.len(),
                });
            }
            if let Some(column) = row.iter().position(|v| !v.is_finite()) {
                return Err(ScatterError::NonFiniteFeature {
                    row: row_idx,
                    column,
                });
            }
            data.extend_from_slice(row);
            n_rows += 1;
        }

        if n_rows == 0 || n_cols == 0 {
            return Err(ScatterError::EmptyFeatureMatrix);
        }

        Ok(Self {
            data,
            n_rows,
            n_cols,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.n_cols)
    }
}
