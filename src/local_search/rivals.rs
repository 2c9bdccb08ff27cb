//! Critical-vehicle selection and the "third competitor" bound.

use crate::evaluation::EPSILON;

/// The two most loaded vehicles other than a given one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestTwo {
    /// Index of the largest completion time (first index on ties).
    pub first: Option<usize>,
    /// Index of the runner-up (first index on ties).
    pub second: Option<usize>,
}

impl BestTwo {
    /// Largest completion time among vehicles other than `m1` and `m2`.
    ///
    /// Returns 0 when no such vehicle exists.
    pub fn competitor(&self, cm: &[f64], m2: usize) -> f64 {
        let pick = if self.first == Some(m2) {
            self.second
        } else {
            self.first
        };
        pick.map_or(0.0, |m| cm[m])
    }
}

/// Returns the two largest entries of `cm` excluding vehicle `m1`.
///
/// Equal values resolve to the lowest index.
///
/// # Examples
///
/// ```
/// use u_charging::local_search::best_two_excluding;
///
/// let cm = [9.0, 4.0, 7.0, 7.0];
/// let top = best_two_excluding(&cm, 0);
/// assert_eq!(top.first, Some(2));
/// assert_eq!(top.second, Some(3));
/// // Moving load from 0 to 2 competes against vehicle 3.
/// assert_eq!(top.competitor(&cm, 2), 7.0);
/// assert_eq!(top.competitor(&cm, 1), 7.0);
/// ```
pub fn best_two_excluding(cm: &[f64], m1: usize) -> BestTwo {
    let first = argmax_excluding(cm, &[m1]);
    let second = first.and_then(|f| argmax_excluding(cm, &[m1, f]));
    BestTwo { first, second }
}

fn argmax_excluding(cm: &[f64], skip: &[usize]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (m, &value) in cm.iter().enumerate() {
        if skip.contains(&m) {
            continue;
        }
        if best.map_or(true, |b| value > cm[b]) {
            best = Some(m);
        }
    }
    best
}

/// Vehicles whose completion time equals the maximum, ascending.
pub fn critical_machines(cm: &[f64]) -> Vec<usize> {
    let max = cm.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (0..cm.len()).filter(|&m| cm[m] >= max - EPSILON).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ties_resolve_to_first_index() {
        let cm = [5.0, 8.0, 8.0, 8.0];
        let top = best_two_excluding(&cm, 0);
        assert_eq!(top.first, Some(1));
        assert_eq!(top.second, Some(2));
    }

    #[test]
    fn test_two_machines_have_no_third_competitor() {
        let cm = [6.0, 4.0];
        let top = best_two_excluding(&cm, 0);
        assert_eq!(top.first, Some(1));
        assert_eq!(top.second, None);
        assert_eq!(top.competitor(&cm, 1), 0.0);
    }

    #[test]
    fn test_single_machine() {
        let top = best_two_excluding(&[3.0], 0);
        assert_eq!(top, BestTwo { first: None, second: None });
    }

    #[test]
    fn test_critical_machines_with_ties() {
        assert_eq!(critical_machines(&[3.0, 7.0, 2.0, 7.0]), vec![1, 3]);
        assert_eq!(critical_machines(&[1.0]), vec![0]);
    }
}
