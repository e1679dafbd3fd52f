use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Non-fixed-size float vector indexed by action id. Used both for expected
/// payoffs and for weights of a random choice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(Vec<f64>);

impl Weights {
    #[inline]
    pub fn from(values: Vec<f64>) -> Self {
        Weights(values)
    }

    pub fn zeros(size: usize) -> Self {
        Weights(vec![0.0; size])
    }

    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.0[index]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn normalize(&self) -> Self {
        debug_assert!(self.is_finite());
        let sum = self.sum();
        if sum <= 0.0 {
            return self.clone();
        }
        Weights(self.0.iter().map(|x| x / sum).collect())
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Weights usable for [`Weights::sample_index`]: finite, non-negative and
    /// with a positive sum.
    pub fn is_distribution(&self) -> bool {
        self.is_finite() && self.0.iter().all(|v| *v >= 0.0) && self.sum() > 0.0
    }

    /// All indices holding the maximal value. Ties are exact float equality.
    pub fn argmax_all(&self) -> Vec<usize> {
        let mut best: Vec<usize> = Vec::new();
        for (idx, val) in self.0.iter().enumerate() {
            match best.first() {
                None => best.push(idx),
                Some(&b) if *val == self.0[b] => best.push(idx),
                Some(&b) if *val > self.0[b] => {
                    best.clear();
                    best.push(idx);
                }
                Some(_) => {}
            }
        }
        best
    }

    pub fn sample_index(&self, rng: &mut impl Rng) -> usize {
        debug_assert!(self.is_finite());
        let size = self.0.len();
        let sum = self.sum();
        if sum <= 0.0 {
            return rng.gen_range(0..size);
        }
        let mut value: f64 = rng.gen_range(0.0..sum);
        for i in 0..size - 1 {
            if value < self.0[i] {
                return i;
            }
            value -= self.0[i];
        }
        size - 1
    }
}

impl Display for Weights {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Weights;
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn sample_check(weights: Vec<f64>) {
        let mut counts = vec![0.0; weights.len()];
        let mut rng = SmallRng::seed_from_u64(0b101010001100011101010110001111);
        let w = Weights::from(weights);
        const COUNT: usize = 10000;
        for _i in 0..COUNT {
            counts[w.sample_index(&mut rng)] += 1.0;
        }
        counts.iter_mut().for_each(|x| *x /= COUNT as f64);

        let n = w.normalize();
        for (x, y) in n.as_slice().iter().zip(counts) {
            assert_abs_diff_eq!(*x, y, epsilon = 0.02);
        }
    }

    #[test]
    fn test_weights_sample() {
        sample_check(vec![100.0, 100.0, 100.0]);
        sample_check(vec![10.0, 0.0, 1.0]);
        sample_check(vec![1.0, 2.0, 3.0]);
        sample_check(vec![0.45, 0.45, 0.1]);
    }

    #[test]
    fn test_sample_never_picks_zero_weight() {
        let mut rng = SmallRng::seed_from_u64(7);
        let w = Weights::from(vec![1.0, 0.0]);
        for _ in 0..1000 {
            assert_eq!(w.sample_index(&mut rng), 0);
        }
    }

    #[test]
    fn test_argmax_all_keeps_ties() {
        assert_eq!(
            Weights::from(vec![1.0, 3.0, -2.0, 3.0]).argmax_all(),
            vec![1, 3]
        );
        assert_eq!(Weights::from(vec![5.0]).argmax_all(), vec![0]);
        assert_eq!(
            Weights::from(vec![0.1 + 0.2, 0.3]).argmax_all(),
            vec![0]
        );
    }

    #[test]
    fn test_is_distribution() {
        assert!(Weights::from(vec![1.0, 0.0]).is_distribution());
        assert!(!Weights::from(vec![0.0, 0.0]).is_distribution());
        assert!(!Weights::from(vec![2.0, -1.0]).is_distribution());
        assert!(!Weights::from(vec![f64::NAN, 1.0]).is_distribution());
    }
}
