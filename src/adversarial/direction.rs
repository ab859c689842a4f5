/// Returns the euclidean norm of `x`.
pub fn l2_norm(x: &[f32]) -> f32 {
    x.iter().map(|v| v * v).sum::<f32>().sqrt()
}

/// Returns the sign of `x`, being `0` for both zeros.
pub fn sign(x: f32) -> f32 {
    if x > 0. {
        1.
    } else if x < 0. {
        -1.
    } else {
        0.
    }
}

/// Adds `step * g / ||g||` onto `value`.
///
/// # Returns
/// Whether `value` was displaced, which doesn't happen for a zero or non finite norm.
pub fn ascend(value: &mut [f32], grad: &[f32], step: f32) -> bool {
    let norm = l2_norm(grad);
    if norm == 0. || !norm.is_finite() {
        return false;
    }

    let scale = step / norm;
    value
        .iter_mut()
        .zip(grad)
        .for_each(|(v, &g)| *v += scale * g);

    true
}

/// Pulls `value` back onto the `epsilon` ball around `center` when it lies outside of it.
pub fn project(value: &mut [f32], center: &[f32], epsilon: f32) {
    let dist = value
        .iter()
        .zip(center)
        .map(|(v, c)| (v - c) * (v - c))
        .sum::<f32>()
        .sqrt();

    if dist <= epsilon {
        return;
    }

    let scale = epsilon / dist;
    value
        .iter_mut()
        .zip(center)
        .for_each(|(v, &c)| *v = c + scale * (*v - c));
}
