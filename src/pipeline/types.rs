//! Pipeline types
//!
//! The lazy iterator over the rates of one decoded document.

use crate::decode::Record;
use crate::error::Result;
use crate::extract::RateExtractor;
use crate::types::{ExtractionMode, RateTuple, SourceId};
use std::iter::FusedIterator;
use tracing::warn;

/// Lazy sequence of rate tuples bound to one decoded document
///
/// Each call to `next` extracts one record. In [`ExtractionMode::FailFast`]
/// the first error is yielded and the iterator ends; in
/// [`ExtractionMode::SkipInvalid`] records with schema-drift errors are
/// logged and skipped.
pub struct RateIter<'a> {
    records: std::vec::IntoIter<Record<'a>>,
    extractor: &'a dyn RateExtractor,
    source: &'a SourceId,
    mode: ExtractionMode,
    position: usize,
    skipped: usize,
    done: bool,
}

impl<'a> RateIter<'a> {
    pub(crate) fn new(
        records: Vec<Record<'a>>,
        extractor: &'a dyn RateExtractor,
        source: &'a SourceId,
        mode: ExtractionMode,
    ) -> Self {
        Self {
            records: records.into_iter(),
            extractor,
            source,
            mode,
            position: 0,
            skipped: 0,
            done: false,
        }
    }

    /// Records not yet visited
    pub fn remaining(&self) -> usize {
        if self.done {
            0
        } else {
            self.records.len()
        }
    }

    /// Records skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for RateIter<'_> {
    type Item = Result<RateTuple>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for record in self.records.by_ref() {
            self.position += 1;
            match self.extractor.extract(&record) {
                Ok(tuple) => return Some(Ok(tuple)),
                Err(e) if self.mode == ExtractionMode::SkipInvalid && e.is_schema_drift() => {
                    self.skipped += 1;
                    warn!(
                        source = %self.source,
                        record = self.position,
                        error = %e,
                        "Skipping invalid record"
                    );
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        self.done = true;
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl FusedIterator for RateIter<'_> {}

impl std::fmt::Debug for RateIter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateIter")
            .field("source", self.source)
            .field("mode", &self.mode)
            .field("position", &self.position)
            .field("remaining", &self.remaining())
            .field("skipped", &self.skipped)
            .finish()
    }
}
