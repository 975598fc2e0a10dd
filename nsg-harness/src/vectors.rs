use std::{ops::Index, path::Path};

use crate::{
    error::Result,
    records::{read_records, Records},
};

/// A fixed-dimension set of `f32` vectors, immutable once loaded.
#[derive(Debug, Clone)]
pub struct VectorSet {
    records: Records<f32>,
}

impl VectorSet {
    pub fn new(data: Vec<f32>, dim: usize) -> Self {
        Self {
            records: Records::new(data, dim),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let records = read_records(path)?;
        eprintln!("vector data loaded...");
        Ok(Self { records })
    }

    pub fn num_vecs(&self) -> usize {
        self.records.count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.count() == 0
    }

    pub fn dim(&self) -> usize {
        self.records.width()
    }

    pub fn data(&self) -> &[f32] {
        self.records.data()
    }

    pub fn get(&self, index: usize) -> Option<&[f32]> {
        (index < self.num_vecs()).then(|| self.records.row(index))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        self.records.rows()
    }
}

impl Index<usize> for VectorSet {
    type Output = [f32];

    fn index(&self, index: usize) -> &Self::Output {
        self.records.row(index)
    }
}
