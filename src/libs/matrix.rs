//! Evidence and distance matrices for block phylogenies.
//!
//! A `ScoreMatrix` accumulates pairwise evidence over the segments of one
//! block: entries above the diagonal count similarities, entries below the
//! diagonal count differences. `to_distance()` collapses the two triangles
//! into a symmetric `DistMatrix` suitable for neighbor-joining.

/// Square evidence matrix over segment enumeration indices.
///
/// Convention: `(i, j)` with `i < j` holds similarity counts, `(j, i)` holds
/// difference counts. The diagonal stays zero.
#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    n: usize,
    data: Vec<f64>,
}

impl ScoreMatrix {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] = value;
    }

    /// Add `value` to entry `(i, j)`.
    pub fn bump(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] += value;
    }

    /// Record one similarity observation for the pair `(i, j)`.
    pub fn record_similarity(&mut self, i: usize, j: usize) {
        let (lo, hi) = (i.min(j), i.max(j));
        self.bump(lo, hi, 1.0);
    }

    /// Record one difference observation for the pair `(i, j)`.
    pub fn record_difference(&mut self, i: usize, j: usize) {
        let (lo, hi) = (i.min(j), i.max(j));
        self.bump(hi, lo, 1.0);
    }

    /// Multiply every entry by `weight`.
    pub fn scale(&mut self, weight: f64) {
        for v in self.data.iter_mut() {
            *v *= weight;
        }
    }

    /// Element-wise sum of two matrices of identical dimension.
    ///
    /// Mismatched dimensions signal a bug in the caller's enumeration
    /// bookkeeping, not bad input, so this panics.
    pub fn add(a: &ScoreMatrix, b: &ScoreMatrix) -> ScoreMatrix {
        assert_eq!(
            a.n, b.n,
            "evidence matrix dimensions differ: {} vs {}",
            a.n, b.n
        );
        let mut out = ScoreMatrix::new(a.n);
        for (o, (x, y)) in out.data.iter_mut().zip(a.data.iter().zip(b.data.iter())) {
            *o = x + y;
        }
        out
    }

    /// Weighted sum of substitution and breakpoint evidence.
    pub fn combine(sub: &ScoreMatrix, bp: &ScoreMatrix, w_sub: f64, w_bp: f64) -> ScoreMatrix {
        let mut a = sub.clone();
        a.scale(w_sub);
        let mut b = bp.clone();
        b.scale(w_bp);
        ScoreMatrix::add(&a, &b)
    }

    /// Convert the evidence triangles into a symmetric distance matrix.
    ///
    /// For each pair the distance is the difference fraction
    /// `diff / (sim + diff)`; a pair with no evidence at all gets 0.0.
    pub fn to_distance(&self) -> DistMatrix {
        let mut dist = DistMatrix::new(self.n);
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let sim = self.get(i, j);
                let diff = self.get(j, i);
                let total = sim + diff;
                let d = if total > 0.0 { diff / total } else { 0.0 };
                dist.set(i, j, d);
            }
        }
        dist
    }
}

/// Symmetric distance matrix with zero diagonal.
#[derive(Debug, Clone)]
pub struct DistMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistMatrix {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Build from a row-major square slice. Symmetrized by averaging in case
    /// the source (e.g. a hand-written PHYLIP file) is slightly asymmetric.
    pub fn from_rows(n: usize, rows: &[f64]) -> Self {
        assert_eq!(rows.len(), n * n, "distance matrix is not {0}x{0}", n);
        let mut dist = DistMatrix::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let d = (rows[i * n + j] + rows[j * n + i]) / 2.0;
                dist.set(i, j, d);
            }
        }
        dist
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Set both `(i, j)` and `(j, i)`. The diagonal is pinned to zero.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        if i == j {
            return;
        }
        self.data[i * self.n + j] = value;
        self.data[j * self.n + i] = value;
    }
}
