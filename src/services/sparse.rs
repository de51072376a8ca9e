/// A sparse vector with strictly increasing indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Builds a vector from `(index, value)` pairs in any order.
    /// Zero values are dropped; duplicate indices are summed.
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.sort_by_key(|&(i, _)| i);
        let mut indices: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f32> = Vec::with_capacity(pairs.len());
        for (i, v) in pairs {
            match indices.last() {
                Some(&last) if last == i => {
                    if let Some(slot) = values.last_mut() {
                        *slot += v;
                    }
                }
                _ => {
                    indices.push(i);
                    values.push(v);
                }
            }
        }
        let mut vector = Self { indices, values };
        vector.retain_nonzero();
        vector
    }

    fn retain_nonzero(&mut self) {
        let (indices, values): (Vec<u32>, Vec<f32>) = self
            .indices
            .iter()
            .zip(&self.values)
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, v)| (*i, *v))
            .unzip();
        self.indices = indices;
        self.values = values;
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        self.values
            .iter()
            .map(|&v| (v as f64) * (v as f64))
            .sum::<f64>()
            .sqrt()
    }

    /// Returns a copy scaled to unit norm; zero vectors stay zero
    pub fn l2_normalized(&self) -> Self {
        let norm = self.magnitude();
        if norm == 0.0 {
            return self.clone();
        }
        Self {
            indices: self.indices.clone(),
            values: self.values.iter().map(|&v| (v as f64 / norm) as f32).collect(),
        }
    }

    /// Appends `other * weight` with its indices shifted by `offset`.
    /// `offset` must be past every index already stored.
    pub fn extend_shifted(&mut self, other: &SparseVector, offset: u32, weight: f32) {
        debug_assert!(self.indices.last().map_or(true, |&last| last < offset));
        for (i, v) in other.iter() {
            let scaled = v * weight;
            if scaled != 0.0 {
                self.indices.push(i + offset);
                self.values.push(scaled);
            }
        }
    }

    /// Dot product by merging the two index lists
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut a, mut b) = (0, 0);
        let mut dot = 0.0f64;
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    dot += (self.values[a] as f64) * (other.values[b] as f64);
                    a += 1;
                    b += 1;
                }
            }
        }
        dot
    }
}

/// Cosine similarity using pre-computed magnitudes.
/// Returns 0.0 when either magnitude is zero; result clamped to [-1.0, 1.0].
pub fn cosine_similarity_with_magnitude(
    a: &SparseVector,
    b: &SparseVector,
    mag_a: f64,
    mag_b: f64,
) -> f64 {
    let denom = mag_a * mag_b;
    if denom == 0.0 {
        return 0.0;
    }

    let result = a.dot(b) / denom;
    if !result.is_finite() {
        return 0.0;
    }
    result.clamp(-1.0, 1.0)
}

/// Cosine similarity between two sparse vectors.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    cosine_similarity_with_magnitude(a, b, a.magnitude(), b.magnitude())
}
