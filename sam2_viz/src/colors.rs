//! Per-region color assignment.
//!
//! Each channel is drawn independently from the full `0..=255` range, so two
//! regions can in principle share a color. That is accepted: the chance of an
//! exact repeat is 1 in 2^24 per pair.

use image::Rgb;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seedable source of region colors. One allocator belongs to one run.
pub struct ColorAllocator {
    rng: StdRng,
}

impl ColorAllocator {
    /// `None` seeds from operating system entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn next_color(&mut self) -> Rgb<u8> {
        let r: u8 = self.rng.random();
        let g: u8 = self.rng.random();
        let b: u8 = self.rng.random();
        Rgb([r, g, b])
    }

    pub fn allocate(&mut self, n: usize) -> Vec<Rgb<u8>> {
        (0..n).map(|_| self.next_color()).collect()
    }
}

/// Draws `n` colors from a fresh allocator.
pub fn allocate(n: usize, seed: Option<u64>) -> Vec<Rgb<u8>> {
    ColorAllocator::new(seed).allocate(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_colors() {
        assert_eq!(allocate(5, Some(42)), allocate(5, Some(42)));
    }

    #[test]
    fn different_seed_different_colors() {
        assert_ne!(allocate(5, Some(42)), allocate(5, Some(43)));
    }

    #[test]
    fn zero_colors() {
        assert!(allocate(0, Some(7)).is_empty());
        assert!(allocate(0, None).is_empty());
    }

    #[test]
    fn allocation_length_matches_request() {
        assert_eq!(allocate(17, None).len(), 17);
    }

    #[test]
    fn allocator_continues_its_sequence() {
        let mut split = ColorAllocator::new(Some(9));
        let mut head = split.allocate(2);
        head.extend(split.allocate(3));
        assert_eq!(head, allocate(5, Some(9)));
    }
}
