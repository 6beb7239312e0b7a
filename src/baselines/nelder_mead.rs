//! Gradient-free simplex minimization, small enough to hand-roll for the
//! Huang composite's four-dimensional weight search rather than pulling in
//! an optimizer crate nothing else in the dependency stack needs.

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;
const INITIAL_STEP: f64 = 0.1;

/// Minimize `objective` starting from `initial`, returning the best point
/// found after `max_iterations` simplex steps.
pub fn minimize(initial: &[f64], max_iterations: usize, objective: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = initial.len();
    if n == 0 {
        return Vec::new();
    }
    let mut simplex: Vec<Vec<f64>> = vec![initial.to_vec()];
    for i in 0..n {
        let mut point = initial.to_vec();
        point[i] += if point[i].abs() > 1e-8 { point[i] * INITIAL_STEP } else { INITIAL_STEP };
        simplex.push(point);
    }
    let mut values: Vec<f64> = simplex.iter().map(|p| objective(p)).collect();

    for _ in 0..max_iterations {
        let mut order: Vec<usize> = (0..simplex.len()).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let best = values[0];
        let worst = *values.last().unwrap();
        if (worst - best).abs() < 1e-10 {
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|p| p[j]).sum::<f64>() / n as f64)
            .collect();

        let worst_point = simplex.last().unwrap().clone();
        let reflected: Vec<f64> = centroid.iter().zip(&worst_point).map(|(c, w)| c + REFLECT * (c - w)).collect();
        let reflected_value = objective(&reflected);

        if reflected_value < values[0] {
            let expanded: Vec<f64> = centroid.iter().zip(&reflected).map(|(c, r)| c + EXPAND * (r - c)).collect();
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                *simplex.last_mut().unwrap() = expanded;
                *values.last_mut().unwrap() = expanded_value;
            } else {
                *simplex.last_mut().unwrap() = reflected;
                *values.last_mut().unwrap() = reflected_value;
            }
            continue;
        }

        if reflected_value < values[n - 1] {
            *simplex.last_mut().unwrap() = reflected;
            *values.last_mut().unwrap() = reflected_value;
            continue;
        }

        let contracted: Vec<f64> = centroid.iter().zip(&worst_point).map(|(c, w)| c + CONTRACT * (w - c)).collect();
        let contracted_value = objective(&contracted);
        if contracted_value < worst {
            *simplex.last_mut().unwrap() = contracted;
            *values.last_mut().unwrap() = contracted_value;
            continue;
        }

        let best_point = simplex[0].clone();
        for i in 1..simplex.len() {
            for j in 0..n {
                simplex[i][j] = best_point[j] + SHRINK * (simplex[i][j] - best_point[j]);
            }
            values[i] = objective(&simplex[i]);
        }
    }

    let best_idx = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);
    simplex[best_idx].clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_a_simple_quadratic_bowl() {
        let result = minimize(&[5.0, -3.0], 200, |p| (p[0] - 1.0).powi(2) + (p[1] + 2.0).powi(2));
        assert!((result[0] - 1.0).abs() < 0.01);
        assert!((result[1] + 2.0).abs() < 0.01);
    }
}
