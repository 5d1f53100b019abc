//! Range iteration over a snapshot of the keyspace.

use crate::keyspace::Keyspace;
use crate::types::Datum;
use std::ops::Bound;
use std::vec;

/// Options controlling a range iterator.
///
/// Each side of the range takes one bound; calling a second setter for the
/// same side replaces the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IteratorOptions {
    /// Lower bound of the range.
    pub lower: Bound<Vec<u8>>,
    /// Upper bound of the range.
    pub upper: Bound<Vec<u8>>,
    /// Yield entries in descending key order.
    pub reverse: bool,
    /// Maximum number of entries to yield; `None` is unbounded.
    pub limit: Option<usize>,
    /// Include keys in yielded entries.
    pub keys: bool,
    /// Include values in yielded entries.
    pub values: bool,
    /// Return keys as bytes rather than text.
    pub key_as_buffer: bool,
    /// Return values as bytes rather than text.
    pub value_as_buffer: bool,
}

impl Default for IteratorOptions {
    fn default() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            reverse: false,
            limit: None,
            keys: true,
            values: true,
            key_as_buffer: true,
            value_as_buffer: true,
        }
    }
}

impl IteratorOptions {
    /// Creates options that cover the whole keyspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keys strictly greater than `key`.
    #[must_use]
    pub fn gt(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.lower = Bound::Excluded(key.into());
        self
    }

    /// Only keys greater than or equal to `key`.
    #[must_use]
    pub fn gte(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.lower = Bound::Included(key.into());
        self
    }

    /// Only keys strictly less than `key`.
    #[must_use]
    pub fn lt(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.upper = Bound::Excluded(key.into());
        self
    }

    /// Only keys less than or equal to `key`.
    #[must_use]
    pub fn lte(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.upper = Bound::Included(key.into());
        self
    }

    /// Sets descending order.
    #[must_use]
    pub const fn reverse(mut self, value: bool) -> Self {
        self.reverse = value;
        self
    }

    /// Limits the number of entries.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Limits the number of entries; a negative limit means unbounded.
    #[must_use]
    pub fn limit_signed(mut self, limit: i64) -> Self {
        self.limit = usize::try_from(limit).ok();
        self
    }

    /// Sets whether keys are included.
    #[must_use]
    pub const fn keys(mut self, value: bool) -> Self {
        self.keys = value;
        self
    }

    /// Sets whether values are included.
    #[must_use]
    pub const fn values(mut self, value: bool) -> Self {
        self.values = value;
        self
    }

    /// Sets whether keys are returned as bytes.
    #[must_use]
    pub const fn key_as_buffer(mut self, value: bool) -> Self {
        self.key_as_buffer = value;
        self
    }

    /// Sets whether values are returned as bytes.
    #[must_use]
    pub const fn value_as_buffer(mut self, value: bool) -> Self {
        self.value_as_buffer = value;
        self
    }

    fn lower_bound(&self) -> Bound<&[u8]> {
        self.lower.as_ref().map(Vec::as_slice)
    }

    fn upper_bound(&self) -> Bound<&[u8]> {
        self.upper.as_ref().map(Vec::as_slice)
    }
}

/// One entry yielded by a [`RangeIterator`].
///
/// Fields are `None` when excluded by [`IteratorOptions::keys`] or
/// [`IteratorOptions::values`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterEntry {
    /// The entry key.
    pub key: Option<Datum>,
    /// The entry value.
    pub value: Option<Datum>,
}

/// Iterator over a private copy of a key range.
///
/// The copy is taken when the iterator is created, so later mutations of
/// the store are not observed.
#[derive(Debug)]
pub struct RangeIterator {
    entries: vec::IntoIter<(Vec<u8>, Vec<u8>)>,
    remaining: Option<usize>,
    options: IteratorOptions,
}

impl RangeIterator {
    /// Snapshots the matching entries of `keyspace`.
    #[must_use]
    pub fn new(keyspace: &Keyspace, options: IteratorOptions) -> Self {
        let mut entries = keyspace.snapshot(options.lower_bound(), options.upper_bound());
        if options.reverse {
            entries.reverse();
        }
        Self {
            entries: entries.into_iter(),
            remaining: options.limit,
            options,
        }
    }

    /// Discards the rest of the snapshot.
    pub fn end(&mut self) {
        self.entries = Vec::new().into_iter();
        self.remaining = Some(0);
    }
}

impl Iterator for RangeIterator {
    type Item = IterEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        let (key, value) = self.entries.next()?;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }

        let options = &self.options;
        Some(IterEntry {
            key: options
                .keys
                .then(|| Datum::from_stored(key, options.key_as_buffer)),
            value: options
                .values
                .then(|| Datum::from_stored(value, options.value_as_buffer)),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.entries.len();
        let len = self.remaining.map_or(len, |r| r.min(len));
        (len, Some(len))
    }
}

impl ExactSizeIterator for RangeIterator {}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyspace() -> Keyspace {
        ["a", "b", "c", "d", "e"]
            .iter()
            .map(|k| (k.as_bytes().to_vec(), format!("value-{k}").into_bytes()))
            .collect()
    }

    fn keys(iter: RangeIterator) -> Vec<Vec<u8>> {
        iter.map(|e| e.key.unwrap().into_bytes()).collect()
    }

    #[test]
    fn full_scan() {
        let iter = RangeIterator::new(&keyspace(), IteratorOptions::new());
        assert_eq!(iter.len(), 5);
        assert_eq!(keys(iter), vec![b"a", b"b", b"c", b"d", b"e"]);
    }

    #[test]
    fn bounded_forward_and_reverse() {
        let options = IteratorOptions::new().gte("b").lt("d");
        assert_eq!(
            keys(RangeIterator::new(&keyspace(), options.clone())),
            vec![b"b", b"c"]
        );
        assert_eq!(
            keys(RangeIterator::new(&keyspace(), options.reverse(true))),
            vec![b"c", b"b"]
        );
    }

    #[test]
    fn exclusive_and_inclusive_bounds() {
        let options = IteratorOptions::new().gt("b").lte("d");
        assert_eq!(
            keys(RangeIterator::new(&keyspace(), options)),
            vec![b"c", b"d"]
        );
    }

    #[test]
    fn last_bound_setter_wins() {
        let options = IteratorOptions::new().gt("a").gte("c").lte("b").lt("e");
        assert_eq!(
            keys(RangeIterator::new(&keyspace(), options)),
            vec![b"c", b"d"]
        );
    }

    #[test]
    fn limits() {
        let one = IteratorOptions::new().limit(1);
        assert_eq!(keys(RangeIterator::new(&keyspace(), one)), vec![b"a"]);

        let reversed = IteratorOptions::new().reverse(true).limit(2);
        assert_eq!(
            keys(RangeIterator::new(&keyspace(), reversed)),
            vec![b"e", b"d"]
        );

        let zero = IteratorOptions::new().limit(0);
        assert_eq!(RangeIterator::new(&keyspace(), zero).count(), 0);

        let unbounded = IteratorOptions::new().limit_signed(-1);
        assert_eq!(unbounded.limit, None);
        assert_eq!(RangeIterator::new(&keyspace(), unbounded).count(), 5);
    }

    #[test]
    fn inverted_range_is_empty() {
        let options = IteratorOptions::new().gte("d").lte("b");
        assert_eq!(RangeIterator::new(&keyspace(), options).count(), 0);
    }

    #[test]
    fn key_and_value_selection() {
        let options = IteratorOptions::new().keys(false).value_as_buffer(false).limit(1);
        let entry = RangeIterator::new(&keyspace(), options).next().unwrap();
        assert_eq!(entry.key, None);
        assert_eq!(entry.value, Some(Datum::Text("value-a".to_string())));

        let options = IteratorOptions::new().values(false).key_as_buffer(false).limit(1);
        let entry = RangeIterator::new(&keyspace(), options).next().unwrap();
        assert_eq!(entry.key, Some(Datum::Text("a".to_string())));
        assert_eq!(entry.value, None);
    }

    #[test]
    fn snapshot_isolation() {
        let mut keyspace = keyspace();
        let iter = RangeIterator::new(&keyspace, IteratorOptions::new());
        keyspace.put(b"aa".to_vec(), Vec::new());
        keyspace.delete(b"e");
        assert_eq!(iter.count(), 5);
    }

    #[test]
    fn end_discards_remaining() {
        let mut iter = RangeIterator::new(&keyspace(), IteratorOptions::new());
        assert!(iter.next().is_some());
        iter.end();
        assert!(iter.next().is_none());
        assert_eq!(iter.len(), 0);
    }
}
