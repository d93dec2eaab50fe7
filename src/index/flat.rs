// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exact nearest-neighbor index over an in-memory vector set.
//!
//! Vectors are stored row-major in one flat buffer; a vector's position is
//! its insertion order. Search is a linear scan by squared Euclidean
//! distance.
//!
//! File layout (all little-endian):
//! ```text
//! magic "DQFI" | version u32 | dimension u32 | count u64 | count * dimension f32
//! ```

use std::cmp::Ordering;
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::errors::{RetrievalError, Result};

const MAGIC: &[u8; 4] = b"DQFI";
const FORMAT_VERSION: u32 = 1;

/// One search result: distance to the query and position in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Squared Euclidean distance (lower is closer)
    pub distance: f32,
    /// Insertion position of the stored vector
    pub position: usize,
}

/// Flat (brute-force) L2 vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Creates an empty index; the dimension is fixed for its lifetime.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
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

    /// Returns the stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Appends vectors in order.
    ///
    /// Every vector is checked before any is stored, so a mismatch leaves the
    /// index unchanged.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Keeps only the first `len` vectors.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len.saturating_mul(self.dimension));
    }

    /// Returns up to `k` nearest vectors, closest first.
    ///
    /// Ties are broken by the lower position. An empty index yields an empty
    /// result.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| Neighbor {
                distance: squared_l2(query, stored),
                position,
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }

    /// Serializes the index to a writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(&(self.dimension as u32).to_le_bytes())?;
        writer.write_all(&(self.len() as u64).to_le_bytes())?;
        for value in &self.data {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    /// Restores an index previously written by [`FlatIndex::write_to`].
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0_u8; 4];
        read_exact(reader, &mut magic, "magic")?;
        if &magic != MAGIC {
            return Err(RetrievalError::IndexFormat("bad magic".to_string()));
        }

        let version = u32::from_le_bytes(read_array(reader, "version")?);
        if version != FORMAT_VERSION {
            return Err(RetrievalError::IndexFormat(format!(
                "unsupported version {}",
                version
            )));
        }

        let dimension = u32::from_le_bytes(read_array(reader, "dimension")?) as usize;
        let count = u64::from_le_bytes(read_array(reader, "count")?);
        let expected = usize::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(dimension))
            .and_then(|values| values.checked_mul(4))
            .ok_or_else(|| RetrievalError::IndexFormat("vector count overflow".to_string()))?;

        // Read at most one byte past the declared payload so a bogus count
        // cannot drive allocation.
        let mut bytes = Vec::new();
        reader
            .take((expected as u64).saturating_add(1))
            .read_to_end(&mut bytes)?;
        if bytes.len() != expected {
            return Err(RetrievalError::IndexFormat(format!(
                "expected {} vector bytes, found {}",
                expected,
                bytes.len()
            )));
        }

        let data = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self { dimension, data })
    }

    /// Writes the index to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads an index from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        Self::read_from(&mut BufReader::new(file))
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], field: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            RetrievalError::IndexFormat(format!("truncated {}", field))
        }
        _ => RetrievalError::Io(e),
    })
}

fn read_array<R: Read, const N: usize>(reader: &mut R, field: &str) -> Result<[u8; N]> {
    let mut buf = [0_u8; N];
    read_exact(reader, &mut buf, field)?;
    Ok(buf)
}
