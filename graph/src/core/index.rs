use std::ops::RangeInclusive;

/// Rows covered by one bucket of the index
const BUCKET_ROWS: usize = 64;

/// Bucketed lookup from a row window to the elements whose row span
/// intersects it.
///
/// Every element is registered in each bucket its span touches, so a query
/// only walks the buckets of the window and reports each element once.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    buckets: Vec<Vec<u32>>,
}

impl RowIndex {
    pub fn build<I>(spans: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut buckets: Vec<Vec<u32>> = Vec::new();

        for (idx, (first, last)) in spans.into_iter().enumerate() {
            let (lo, hi) = (first.min(last) / BUCKET_ROWS, first.max(last) / BUCKET_ROWS);
            if buckets.len() <= hi {
                buckets.resize_with(hi + 1, Vec::new);
            }
            for bucket in &mut buckets[lo..=hi] {
                bucket.push(idx as u32);
            }
        }

        Self { buckets }
    }

    /// Visit every element whose span intersects `rows`, in index order
    /// within a bucket. `span_of` must return the span used at build time.
    pub fn visit<S, F>(&self, rows: RangeInclusive<usize>, span_of: S, mut f: F)
    where
        S: Fn(usize) -> (usize, usize),
        F: FnMut(usize),
    {
        let (lo, hi) = (*rows.start(), *rows.end());
        if lo > hi || self.buckets.is_empty() {
            return;
        }

        let first_bucket = lo / BUCKET_ROWS;
        let last_bucket = (hi / BUCKET_ROWS).min(self.buckets.len() - 1);
        if first_bucket > last_bucket {
            return;
        }

        for bucket_idx in first_bucket..=last_bucket {
            for &idx in &self.buckets[bucket_idx] {
                let idx = idx as usize;
                let (first, last) = span_of(idx);
                let (first, last) = (first.min(last), first.max(last));

                // Report from the first bucket of the window it appears in
                if (first / BUCKET_ROWS).max(first_bucket) != bucket_idx {
                    continue;
                }
                if last < lo || first > hi {
                    continue;
                }
                f(idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect(index: &RowIndex, spans: &[(usize, usize)], rows: RangeInclusive<usize>) -> Vec<usize> {
        let mut hits = Vec::new();
        index.visit(rows, |i| spans[i], |i| hits.push(i));
        hits.sort_unstable();
        hits
    }

    #[test]
    fn test_long_spans_reported_once() {
        let spans = vec![(0, 1000), (10, 12), (500, 520), (990, 995)];
        let index = RowIndex::build(spans.iter().copied());

        assert_eq!(collect(&index, &spans, 0..=20), vec![0, 1]);
        assert_eq!(collect(&index, &spans, 505..=700), vec![0, 2]);
        assert_eq!(collect(&index, &spans, 900..=2000), vec![0, 3]);
        assert_eq!(collect(&index, &spans, 2000..=3000), Vec::<usize>::new());
    }

    #[test]
    fn test_reversed_span() {
        let spans = vec![(300, 100)];
        let index = RowIndex::build(spans.iter().copied());

        assert_eq!(collect(&index, &spans, 150..=160), vec![0]);
        assert_eq!(collect(&index, &spans, 301..=400), Vec::<usize>::new());
    }

    #[test]
    fn test_empty_index() {
        let index = RowIndex::build(std::iter::empty());
        assert_eq!(collect(&index, &[], 0..=100), Vec::<usize>::new());
    }
}
