//! Fixed-size batching over lazy iterators.

use std::num::NonZeroUsize;

/// Iterator adapter yielding `Vec`s of up to `size` items.
///
/// Created by [`batch_lines`]. Holds at most one batch at a time.
#[derive(Debug, Clone)]
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Batches<I> {
    iter: I,
    size: NonZeroUsize,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<I::Item> = self.iter.by_ref().take(self.size.get()).collect();
        if batch.is_empty() { None } else { Some(batch) }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.iter.size_hint();
        let size = self.size.get();
        (lower.div_ceil(size), upper.map(|n| n.div_ceil(size)))
    }
}

/// Groups `items` into batches of `size`.
///
/// Every batch but the last holds exactly `size` items; the last holds
/// between one and `size`. Empty input yields no batches. Order is kept.
pub fn batch_lines<I>(items: I, size: NonZeroUsize) -> Batches<I::IntoIter>
where
    I: IntoIterator,
{
    Batches {
        iter: items.into_iter(),
        size,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::needless_collect)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn n(size: usize) -> NonZeroUsize {
        NonZeroUsize::new(size).unwrap()
    }

    #[test]
    fn test_exact_batches() {
        let batches: Vec<_> = batch_lines(["a", "b", "c", "d"], n(2)).collect();
        assert_eq!(batches, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_with_remainder() {
        let batches: Vec<_> = batch_lines(["a", "b", "c"], n(2)).collect();
        assert_eq!(batches, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_single_batch() {
        let batches: Vec<_> = batch_lines(["x"], n(10)).collect();
        assert_eq!(batches, vec![vec!["x"]]);
    }

    #[test]
    fn test_empty_iterable() {
        assert_eq!(batch_lines(Vec::<&str>::new(), n(3)).count(), 0);
    }

    #[test]
    fn test_batch_size_one() {
        let batches: Vec<_> = batch_lines(["a", "b", "c"], n(1)).collect();
        assert_eq!(batches, vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_pulls_lazily() {
        let mut pulled = 0;
        let source = (0..100).inspect(|_| pulled += 1);
        let first = batch_lines(source, n(4)).next().unwrap();
        assert_eq!(first, vec![0, 1, 2, 3]);
        assert_eq!(pulled, 4);
    }

    proptest! {
        #[test]
        fn prop_batch_counts(len in 0usize..200, size in 1usize..50) {
            let batches: Vec<Vec<usize>> = batch_lines(0..len, n(size)).collect();

            prop_assert_eq!(batches.len(), len.div_ceil(size));
            if let Some((last, full)) = batches.split_last() {
                prop_assert!(full.iter().all(|b| b.len() == size));
                prop_assert!(!last.is_empty() && last.len() <= size);
            }
            let flat: Vec<usize> = batches.into_iter().flatten().collect();
            prop_assert_eq!(flat, (0..len).collect::<Vec<_>>());
        }
    }
}
