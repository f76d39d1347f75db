use ndarray::{Array1, ArrayView1};

pub(crate) fn softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp = logits.mapv(|x| (x - max_logit).exp());
    let sum: f32 = exp.sum();
    if sum > 1e-10 {
        exp / sum
    } else {
        Array1::from_elem(logits.len(), 1.0 / logits.len().max(1) as f32)
    }
}

/// Index and value of the largest entry; ties go to the lowest index.
pub(crate) fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values.iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}
