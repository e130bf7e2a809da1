use crate::Imbalance;
use crate::Measure;
use crate::SMD_THRESHOLD;

fn mean(xs: &[Measure]) -> Measure {
    xs.iter().sum::<Measure>() / xs.len() as Measure
}

/// sample variance with Bessel's correction; zero below two elements
fn variance(xs: &[Measure]) -> Measure {
    match xs.len() {
        0 | 1 => 0.,
        n => {
            let mu = mean(xs);
            xs.iter().map(|x| (x - mu) * (x - mu)).sum::<Measure>() / (n - 1) as Measure
        }
    }
}

/// Standardized mean difference `(mean(a) - mean(b)) / sqrt((var(a) + var(b)) / 2)`.
///
/// Zero when the pooled standard deviation is below [`SMD_THRESHOLD`].
/// Infinite when either group is empty, marking the balance as undefined.
pub fn calculate_smd(a: &[Measure], b: &[Measure]) -> Imbalance {
    if a.is_empty() || b.is_empty() {
        return Imbalance::INFINITY;
    }
    let pooled = ((variance(a) + variance(b)) / 2.).sqrt();
    if pooled < SMD_THRESHOLD {
        0.
    } else {
        (mean(a) - mean(b)) / pooled
    }
}
