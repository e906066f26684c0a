//! Injectable random choice
//!
//! Every random pick in the pipeline goes through [`Chooser`], so a run is
//! reproducible under a seeded generator.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Uniform choice of an index in `0..len`
pub trait Chooser {
    /// `len` is always > 0
    fn choose_index(&mut self, len: usize) -> usize;
}

impl<R: RngCore> Chooser for R {
    fn choose_index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

/// Seeded generator when `seed` is given, OS entropy otherwise
pub fn seeded_or_entropy(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let mut a = seeded_or_entropy(Some(42));
        let mut b = seeded_or_entropy(Some(42));
        let picks_a: Vec<usize> = (0..20).map(|_| a.choose_index(7)).collect();
        let picks_b: Vec<usize> = (0..20).map(|_| b.choose_index(7)).collect();
        assert_eq!(picks_a, picks_b);
        assert!(picks_a.iter().all(|&i| i < 7));
    }

    #[test]
    fn test_choices_stay_in_range() {
        let mut rng = seeded_or_entropy(None);
        assert!((0..100).all(|_| rng.choose_index(1) == 0));
    }
}
