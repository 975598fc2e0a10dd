use std::{collections::HashSet, path::Path};

use crate::{
    error::Result,
    records::{read_records, Records},
};

/// Expected neighbor ids per query. Membership only, the order in which
/// the file lists them is dropped.
#[derive(Debug, Clone)]
pub struct GroundTruthSet {
    sets: Vec<HashSet<u32>>,
    top_k: usize,
}

impl GroundTruthSet {
    pub fn from_records(records: &Records<u32>) -> Self {
        let sets = records
            .rows()
            .map(|row| row.iter().copied().collect())
            .collect();
        Self {
            sets,
            top_k: records.width(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let records: Records<u32> = read_records(path)?;
        Ok(Self::from_records(&records))
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn neighbors(&self, query: usize) -> &HashSet<u32> {
        &self.sets[query]
    }

    pub fn contains(&self, query: usize, id: u32) -> bool {
        self.sets[query].contains(&id)
    }
}
