use crate::audio::asset::AudioAsset;

/// Pearson correlation coefficient of two equal-length vectors.
///
/// Zero variance in either input gives NaN (0 / 0); callers get that value
/// back unchanged.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let r = cov / (var_x * var_y).sqrt();
    // Rounding can push |r| a hair past 1; NaN passes through clamp untouched
    r.clamp(-1.0, 1.0)
}

/// Score `query` against `target` aligned at `offset` target frames.
///
/// Returns `None` when the query window does not fit inside the target.
pub fn score_at(query: &AudioAsset, target: &AudioAsset, offset: isize) -> Option<f64> {
    score_frames(
        query.features().frame_major(),
        target.features().frame_major(),
        offset,
    )
}

/// Mean per-frame Pearson correlation between `query` and the slice of
/// `target` starting at `offset`. Both inputs are frame-major.
fn score_frames(query: &[Vec<f64>], target: &[Vec<f64>], offset: isize) -> Option<f64> {
    if offset < 0 {
        return None;
    }
    let offset = offset as usize;
    if query.len() > target.len() || offset > target.len() - query.len() {
        return None;
    }

    let window = &target[offset..offset + query.len()];
    let total: f64 = query
        .iter()
        .zip(window)
        .map(|(q, t)| pearson(q, t))
        .sum();
    Some(total / query.len() as f64)
}
