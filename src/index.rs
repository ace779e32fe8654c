//! Flat vector index over L2-normalized embeddings
//!
//! An exhaustive cosine scan over the stored vectors, no index structure.
//! Row ids line up with catalog row positions. Vectors are normalized on
//! insert, so the inner product of a normalized query against a stored
//! vector is the cosine similarity.

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::errors::ProdragError;
use crate::errors::Result;

/// Serialized index layout
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// Exhaustive-scan similarity index
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Load an index from its JSON serialization
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading vector index from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let file: IndexFile = serde_json::from_str(&content)?;
        for (row, vector) in file.vectors.iter().enumerate() {
            if vector.len() != file.dimension {
                return Err(ProdragError::Index(format!(
                    "vector at row {row} has dimension {}, expected {}",
                    vector.len(),
                    file.dimension
                )));
            }
        }

        info!("Loaded {} vectors of dimension {}", file.vectors.len(), file.dimension);
        Ok(Self {
            dimension: file.dimension,
            vectors: file.vectors,
        })
    }

    /// Write the index to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = IndexFile {
            dimension: self.dimension,
            vectors: self.vectors.clone(),
        };
        let content = serde_json::to_string(&file)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Append a vector; it is L2-normalized in place
    pub fn add(&mut self, mut vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(ProdragError::Index(format!(
                "cannot add vector of dimension {}, index expects {}",
                vector.len(),
                self.dimension
            )));
        }
        normalize_l2(&mut vector);
        self.vectors.push(vector);
        Ok(())
    }

    /// Nearest neighbors of a normalized query vector
    ///
    /// Returns up to `top_k` (row id, similarity) pairs by descending
    /// similarity.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<(Vec<usize>, Vec<f32>)> {
        if query.len() != self.dimension {
            return Err(ProdragError::Index(format!(
                "query has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(row, vector)| (row, dot(query, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let ids = scored.iter().map(|(row, _)| *row).collect();
        let scores = scored.iter().map(|(_, score)| *score).collect();
        Ok((ids, scores))
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index holds no vectors
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Scale a vector to unit L2 norm; zero vectors are left untouched
pub fn normalize_l2(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> FlatIndex {
        let mut index = FlatIndex::new(2);
        index.add(vec![1.0, 0.0]).unwrap();
        index.add(vec![0.0, 1.0]).unwrap();
        index.add(vec![1.0, 1.0]).unwrap();
        index
    }

    #[test]
    fn test_search_returns_descending_similarity() {
        let index = sample_index();
        let mut query = vec![1.0, 0.1];
        normalize_l2(&mut query);

        let (ids, scores) = index.search(&query, 3).unwrap();
        assert_eq!(ids[0], 0);
        assert_eq!(ids.len(), 3);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_search_truncates_to_top_k() {
        let index = sample_index();
        let (ids, scores) = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let index = sample_index();
        assert!(index.search(&[1.0, 0.0, 0.0], 2).is_err());

        let mut index = FlatIndex::new(2);
        assert!(index.add(vec![1.0]).is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = sample_index();
        index.save(&path).unwrap();

        let loaded = FlatIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.dimension(), 2);
    }

    #[test]
    fn test_normalize_l2_unit_norm() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize_l2(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }
}
