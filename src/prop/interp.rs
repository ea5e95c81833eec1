/// Sentinel returned by the raw interpolation layer for queries outside
/// the tested envelope. Typed queries map it to `PropError::OutOfEnvelope`.
pub const OUT_OF_ENVELOPE: f64 = -99.0;

const AXIS_EPS: f64 = 1e-6;

/// Bilinear interpolator over a rectangular (x, y) grid.
///
/// Built from scattered samples whose coordinates fall on a rectangular
/// lattice. Grid cells with a missing corner sample, and queries outside
/// the axis ranges, are out of envelope.
#[derive(Debug, Clone)]
pub struct GridInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    // Row-major: values[xi * ys.len() + yi]
    values: Vec<Option<f64>>,
}

impl GridInterpolator {
    /// Build from (x, y, value) samples. Returns `None` when fewer than a
    /// 2×2 lattice is present.
    pub fn from_points(points: &[(f64, f64, f64)]) -> Option<Self> {
        if points.len() < 4 {
            return None;
        }

        let xs = unique_sorted(points.iter().map(|p| p.0));
        let ys = unique_sorted(points.iter().map(|p| p.1));
        if xs.len() < 2 || ys.len() < 2 {
            return None;
        }

        let mut values = vec![None; xs.len() * ys.len()];
        for &(x, y, v) in points {
            let xi = axis_index(&xs, x)?;
            let yi = axis_index(&ys, y)?;
            values[xi * ys.len() + yi] = Some(v);
        }

        Some(Self { xs, ys, values })
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.ys[0], self.ys[self.ys.len() - 1])
    }

    /// Bilinear lookup; `None` outside the envelope.
    pub fn query(&self, x: f64, y: f64) -> Option<f64> {
        let xi = cell_index(&self.xs, x)?;
        let yi = cell_index(&self.ys, y)?;

        let ny = self.ys.len();
        let v00 = self.values[xi * ny + yi]?;
        let v01 = self.values[xi * ny + yi + 1]?;
        let v10 = self.values[(xi + 1) * ny + yi]?;
        let v11 = self.values[(xi + 1) * ny + yi + 1]?;

        let tx = fraction(self.xs[xi], self.xs[xi + 1], x);
        let ty = fraction(self.ys[yi], self.ys[yi + 1], y);

        let v0 = v00 + (v01 - v00) * ty;
        let v1 = v10 + (v11 - v10) * ty;
        Some(v0 + (v1 - v0) * tx)
    }

    /// Like `query`, but mapping out-of-envelope to the numeric sentinel.
    pub fn query_or_sentinel(&self, x: f64, y: f64) -> f64 {
        self.query(x, y).unwrap_or(OUT_OF_ENVELOPE)
    }
}

fn unique_sorted(iter: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut vals: Vec<f64> = iter.collect();
    vals.sort_by(|a, b| a.total_cmp(b));
    vals.dedup_by(|a, b| (*a - *b).abs() <= AXIS_EPS);
    vals
}

fn axis_index(axis: &[f64], value: f64) -> Option<usize> {
    axis.iter().position(|&a| (a - value).abs() <= AXIS_EPS)
}

/// Index of the cell containing `value`, i.e. i with axis[i] <= value <= axis[i+1].
fn cell_index(axis: &[f64], value: f64) -> Option<usize> {
    if value < axis[0] || value > axis[axis.len() - 1] {
        return None;
    }
    let i = axis.partition_point(|&a| a <= value);
    Some(i.saturating_sub(1).min(axis.len() - 2))
}

fn fraction(lo: f64, hi: f64, v: f64) -> f64 {
    if hi > lo {
        (v - lo) / (hi - lo)
    } else {
        0.0
    }
}
