//! Exact inner-product similarity index
//!
//! A flat index over unit-normalized vectors: inner product equals cosine
//! similarity, and search is an exact scan. Entry positions are row ids;
//! the engine maps them back to document text and metadata.
//!
//! Binary file format:
//! - 4 bytes: entry count N (u32 LE)
//! - 4 bytes: vector dimension D (u32 LE)
//! - N * D * 4 bytes: f32 LE values in row-major order

use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

const HEADER_SIZE: usize = 8;

/// Row id returned for padded (no-match) slots
pub const NO_MATCH: i64 = -1;

#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed vectors
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a vector; its row id is the insertion position
    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::Index(format!(
                "Vector dimension mismatch: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Exact top-k search by inner product.
    ///
    /// Always returns exactly `k` entries; slots beyond the number of
    /// indexed vectors are padded with `(f32::NEG_INFINITY, NO_MATCH)`,
    /// which callers filter out by row id.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(f32, i64)>> {
        if query.len() != self.dimension {
            return Err(Error::Index(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }

        let mut scored: Vec<(f32, i64)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, vector)| {
                let score: f32 = vector.iter().zip(query.iter()).map(|(a, b)| a * b).sum();
                (score, row as i64)
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        while scored.len() < k {
            scored.push((f32::NEG_INFINITY, NO_MATCH));
        }

        Ok(scored)
    }

    /// Write the index to a binary file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut bytes = Vec::with_capacity(HEADER_SIZE + std::mem::size_of_val(&self.data[..]));
        bytes.extend_from_slice(&(self.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        bytes.extend_from_slice(bytemuck::cast_slice(&self.data));

        std::fs::write(path, bytes)?;
        debug!("Saved {} vectors to {:?}", self.len(), path);
        Ok(())
    }

    /// Read an index from a binary file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        if bytes.len() < HEADER_SIZE {
            return Err(Error::Index(format!(
                "Index file {} is truncated",
                path.display()
            )));
        }

        let count = u32::from_le_bytes(bytes[0..4].try_into().expect("sized slice")) as usize;
        let dimension = u32::from_le_bytes(bytes[4..8].try_into().expect("sized slice")) as usize;

        let expected = HEADER_SIZE + count * dimension * 4;
        if bytes.len() != expected {
            return Err(Error::Index(format!(
                "Index file {} has {} bytes, expected {}",
                path.display(),
                bytes.len(),
                expected
            )));
        }

        // pod_collect_to_vec copies, so the byte buffer's alignment is irrelevant
        let data: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes[HEADER_SIZE..]);

        debug!("Loaded {} vectors from {:?}", count, path);
        Ok(Self { dimension, data })
    }
}
