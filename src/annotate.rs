//! Annotation pipeline: extraction, resolution and paraphrase for each statement in turn.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::extractor::{ExtractionError, ReferenceExtractor, ReferenceSet};
use crate::paraphraser::QueryParaphraser;
use crate::records::AnnotatedRecord;
use crate::resolver::resolve;

/// Pause after a malformed extraction reply before the next model call.
pub const DEFAULT_FAILURE_PAUSE: Duration = Duration::from_secs(1);

/// Counters reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationStats {
    /// Records emitted.
    pub records: usize,
    /// Statements whose extraction reply could not be parsed.
    pub extraction_failures: usize,
    /// Statements annotated without any grounding.
    pub ungrounded: usize,
}

/// Drives one statement at a time through extractor, resolver and paraphraser.
pub struct AnnotationPipeline<'a> {
    catalog: &'a Catalog,
    extractor: ReferenceExtractor<'a>,
    paraphraser: QueryParaphraser<'a>,
    failure_pause: Duration,
}

impl<'a> AnnotationPipeline<'a> {
    /// Assembles a pipeline over a loaded catalog.
    pub fn new(
        catalog: &'a Catalog,
        extractor: ReferenceExtractor<'a>,
        paraphraser: QueryParaphraser<'a>,
    ) -> Self {
        Self {
            catalog,
            extractor,
            paraphraser,
            failure_pause: DEFAULT_FAILURE_PAUSE,
        }
    }

    /// Overrides the pause taken after a malformed extraction reply.
    pub fn with_failure_pause(mut self, pause: Duration) -> Self {
        self.failure_pause = pause;
        self
    }

    /// Annotates every statement and returns the records in input order.
    pub fn annotate(&self, queries: &[String]) -> Result<Vec<AnnotatedRecord>> {
        let mut records = Vec::with_capacity(queries.len());
        self.annotate_with(queries, |record| {
            records.push(record);
            Ok(())
        })?;
        Ok(records)
    }

    /// Annotates every statement, handing each record to `sink` as soon as it is ready.
    ///
    /// Exactly one record is produced per statement, in order. Model call failures abort the
    /// run; malformed extraction replies do not.
    pub fn annotate_with<F>(&self, queries: &[String], mut sink: F) -> Result<AnnotationStats>
    where
        F: FnMut(AnnotatedRecord) -> Result<()>,
    {
        let mut stats = AnnotationStats::default();
        for (position, query) in queries.iter().enumerate() {
            let sql = query.trim();
            let references = self.references_for(position, sql, &mut stats)?;
            let grounding = resolve(self.catalog, &references);
            if grounding.is_empty() {
                stats.ungrounded += 1;
            }
            debug!(
                position,
                tables = grounding.table.len(),
                columns = grounding.column.len(),
                "resolved grounding"
            );
            let input = self
                .paraphraser
                .paraphrase(sql, &grounding)
                .with_context(|| format!("failed to paraphrase statement {}", position))?;
            sink(AnnotatedRecord {
                input,
                query: sql.to_string(),
            })?;
            stats.records += 1;
            info!("annotated {} of {} statements...", position + 1, queries.len());
        }
        Ok(stats)
    }

    fn references_for(
        &self,
        position: usize,
        sql: &str,
        stats: &mut AnnotationStats,
    ) -> Result<ReferenceSet> {
        match self.extractor.extract(sql) {
            Ok(references) => {
                if references.is_empty() {
                    debug!(position, "model reported no table or column references");
                }
                Ok(references)
            }
            Err(ExtractionError::Malformed { raw, source }) => {
                warn!(position, %source, "unparseable reference extraction:\n{raw}");
                stats.extraction_failures += 1;
                if !self.failure_pause.is_zero() {
                    thread::sleep(self.failure_pause);
                }
                Ok(ReferenceSet::default())
            }
            Err(ExtractionError::Model(err)) => Err(err.context(format!(
                "reference extraction failed for statement {}",
                position
            ))),
        }
    }
}
