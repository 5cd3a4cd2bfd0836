use ndarray::{Array2, ArrayView1};

/// A table of observations: rows are units, columns are variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Samples {
    values: Array2<f64>,
    columns: Vec<String>,
}

impl Samples {
    pub fn new(values: Array2<f64>, columns: Vec<String>) -> Self {
        debug_assert_eq!(values.ncols(), columns.len());
        Self { values, columns }
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// Column by variable name.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values.column(i))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}
