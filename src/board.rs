//! Brand enrichment board
//!
//! Tracks one entry per input website through
//! `NotEnriched -> Enriching -> Enriched | EnrichError` and folds runner
//! outcomes into entries as they arrive. Fields the user edited by hand are
//! left alone unless `apply_to_edited_fields` is set.

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::enrichment::{Competitor, EnrichError, Enricher, EnrichmentResult, PrimaryLocation};
use crate::input::stub_brand_name;
use crate::runner::{BoundedRunner, Outcome, RunnerConfig, RunnerError};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("no board entry with id {0}")]
    UnknownEntry(usize),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    NotEnriched,
    Enriching,
    Enriched,
    EnrichError,
}

impl EnrichmentStatus {
    /// Whether a bulk pass should (re)submit this entry
    pub fn is_eligible(&self) -> bool {
        matches!(self, EnrichmentStatus::NotEnriched | EnrichmentStatus::EnrichError)
    }
}

/// Fields protected from enrichment once the user edits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableField {
    Name,
    AlternativeNames,
    Competitors,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrandEntry {
    pub id: usize,
    pub website: String,
    pub name: String,
    pub alternative_names: Vec<String>,
    pub competitors: Vec<Competitor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_location: Option<PrimaryLocation>,
    pub status: EnrichmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enriched_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    user_edited: HashSet<EditableField>,
}

impl BrandEntry {
    fn new(id: usize, website: String) -> Self {
        Self {
            id,
            name: stub_brand_name(&website),
            website,
            alternative_names: Vec::new(),
            competitors: Vec::new(),
            primary_location: None,
            status: EnrichmentStatus::NotEnriched,
            error: None,
            enriched_at: None,
            user_edited: HashSet::new(),
        }
    }

    pub fn is_user_edited(&self, field: EditableField) -> bool {
        self.user_edited.contains(&field)
    }

    fn should_overwrite(&self, field: EditableField, apply_to_edited: bool) -> bool {
        apply_to_edited || !self.is_user_edited(field)
    }

    fn apply(&mut self, outcome: &Outcome<EnrichmentResult>, apply_to_edited: bool) {
        match outcome {
            Outcome::Failure(failure) => {
                self.status = EnrichmentStatus::EnrichError;
                self.error = Some(failure.message.clone());
            }
            Outcome::Success(result) => {
                self.status = EnrichmentStatus::Enriched;
                self.error = None;
                self.enriched_at = Some(Utc::now());
                self.primary_location = Some(result.primary_location.clone());

                if self.should_overwrite(EditableField::Name, apply_to_edited) {
                    self.name = result.name.clone();
                }
                if self.should_overwrite(EditableField::AlternativeNames, apply_to_edited) {
                    self.alternative_names = result.alternative_names.clone();
                }
                if self.should_overwrite(EditableField::Competitors, apply_to_edited) {
                    self.competitors = result.competitors.clone();
                }
            }
        }
    }
}

/// Partial-success summary of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoardReport {
    pub total: usize,
    pub enriched: usize,
    pub failed: usize,
    pub pending: usize,
}

impl fmt::Display for BoardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} enriched", self.enriched, self.total)?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.pending > 0 {
            write!(f, ", {} pending", self.pending)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BrandBoard {
    entries: Vec<BrandEntry>,
    apply_to_edited_fields: bool,
}

impl Default for BrandBoard {
    fn default() -> Self {
        Self::from_websites(Vec::new())
    }
}

impl BrandBoard {
    pub fn from_websites(websites: impl IntoIterator<Item = String>) -> Self {
        let entries = websites
            .into_iter()
            .enumerate()
            .map(|(id, website)| BrandEntry::new(id, website))
            .collect();

        Self {
            entries,
            apply_to_edited_fields: true,
        }
    }

    /// Whether enrichment overwrites fields the user edited (on by default)
    pub fn with_apply_to_edited_fields(mut self, apply: bool) -> Self {
        self.apply_to_edited_fields = apply;
        self
    }

    pub fn entries(&self) -> &[BrandEntry] {
        &self.entries
    }

    pub fn entry(&self, id: usize) -> Option<&BrandEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    fn entry_mut(&mut self, id: usize) -> Result<&mut BrandEntry, BoardError> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(BoardError::UnknownEntry(id))
    }

    pub fn edit_name(&mut self, id: usize, name: impl Into<String>) -> Result<(), BoardError> {
        let entry = self.entry_mut(id)?;
        entry.name = name.into();
        entry.user_edited.insert(EditableField::Name);
        Ok(())
    }

    pub fn edit_alternative_names(
        &mut self,
        id: usize,
        names: Vec<String>,
    ) -> Result<(), BoardError> {
        let entry = self.entry_mut(id)?;
        entry.alternative_names = names;
        entry.user_edited.insert(EditableField::AlternativeNames);
        Ok(())
    }

    pub fn edit_competitors(
        &mut self,
        id: usize,
        competitors: Vec<Competitor>,
    ) -> Result<(), BoardError> {
        let entry = self.entry_mut(id)?;
        entry.competitors = competitors;
        entry.user_edited.insert(EditableField::Competitors);
        Ok(())
    }

    /// Websites of entries that still need enrichment, in board order
    pub fn pending_websites(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.status.is_eligible())
            .map(|entry| entry.website.clone())
            .collect()
    }

    pub fn mark_enriching(&mut self, websites: &[String]) {
        for entry in &mut self.entries {
            if websites.contains(&entry.website) {
                entry.status = EnrichmentStatus::Enriching;
                entry.error = None;
            }
        }
    }

    /// Fold one outcome into every entry for `website`; returns how many changed
    pub fn apply(&mut self, website: &str, outcome: &Outcome<EnrichmentResult>) -> usize {
        let apply_to_edited = self.apply_to_edited_fields;
        let mut updated = 0;

        for entry in self.entries.iter_mut().filter(|entry| entry.website == website) {
            entry.apply(outcome, apply_to_edited);
            updated += 1;
        }

        if updated == 0 {
            warn!(website, "Outcome for a website not on the board");
        }

        updated
    }

    pub fn report(&self) -> BoardReport {
        let mut report = BoardReport {
            total: self.entries.len(),
            enriched: 0,
            failed: 0,
            pending: 0,
        };

        for entry in &self.entries {
            match entry.status {
                EnrichmentStatus::Enriched => report.enriched += 1,
                EnrichmentStatus::EnrichError => report.failed += 1,
                EnrichmentStatus::NotEnriched | EnrichmentStatus::Enriching => {
                    report.pending += 1
                }
            }
        }

        report
    }

    /// Enrich every eligible entry through `runner`, applying outcomes as they settle
    #[instrument(skip_all, fields(entries = self.entries.len()))]
    pub async fn enrich_pending(
        &mut self,
        enricher: Arc<dyn Enricher>,
        runner: &BoundedRunner,
    ) -> Result<BoardReport, BoardError> {
        let websites = self.pending_websites();

        if websites.is_empty() {
            info!("Nothing to enrich");
            return Ok(self.report());
        }

        self.mark_enriching(&websites);
        info!(
            submitted = websites.len(),
            concurrency = runner.config().concurrency(),
            "Starting enrichment"
        );

        runner
            .run(websites, enrich_operation(enricher), |website, outcome| {
                self.apply(&website, &outcome);
            })
            .await?;

        let report = self.report();
        info!(
            enriched = report.enriched,
            failed = report.failed,
            total = report.total,
            "{}",
            report
        );

        Ok(report)
    }

    /// Re-enrich a single entry; the outcome only touches that entry
    #[instrument(skip(self, enricher))]
    pub async fn retry_entry(
        &mut self,
        id: usize,
        enricher: Arc<dyn Enricher>,
    ) -> Result<EnrichmentStatus, BoardError> {
        let apply_to_edited = self.apply_to_edited_fields;
        let entry = self.entry_mut(id)?;
        entry.status = EnrichmentStatus::Enriching;
        entry.error = None;
        let website = entry.website.clone();

        BoundedRunner::new(RunnerConfig::new(1)?)
            .run(vec![website], enrich_operation(enricher), |_, outcome| {
                entry.apply(&outcome, apply_to_edited);
            })
            .await?;

        Ok(entry.status)
    }
}

type EnrichFuture = BoxFuture<'static, Result<EnrichmentResult, EnrichError>>;

fn enrich_operation(
    enricher: Arc<dyn Enricher>,
) -> impl Fn(String) -> EnrichFuture + Send + Sync + 'static {
    move |website: String| -> EnrichFuture {
        let enricher = Arc::clone(&enricher);
        Box::pin(async move { enricher.enrich(&website).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::Evidence;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned results; websites missing from the map fail
    struct FakeEnricher {
        results: HashMap<String, EnrichmentResult>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeEnricher {
        fn new(websites: &[&str]) -> Self {
            let results = websites
                .iter()
                .map(|w| (w.to_string(), sample_result(w, &format!("{} Inc", w))))
                .collect();
            Self {
                results,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Enricher for FakeEnricher {
        async fn enrich(&self, website: &str) -> Result<EnrichmentResult, EnrichError> {
            self.calls.lock().unwrap().push(website.to_string());
            self.results
                .get(website)
                .cloned()
                .ok_or_else(|| EnrichError::Upstream(format!("no data for {}", website)))
        }
    }

    fn sample_result(website: &str, name: &str) -> EnrichmentResult {
        EnrichmentResult {
            website: website.to_string(),
            name: name.to_string(),
            alternative_names: vec![format!("{} Co", name)],
            primary_location: PrimaryLocation {
                city: "Denver".to_string(),
                region: "CO".to_string(),
                country: "US".to_string(),
                confidence: 0.7,
            },
            competitors: vec![Competitor {
                name: "Rival".to_string(),
                websites: vec!["https://rival.test".to_string()],
                confidence: Some(0.5),
            }],
            evidence: Evidence::default(),
        }
    }

    fn websites(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_new_board_uses_stub_names() {
        let board = BrandBoard::from_websites(websites(&["https://www.acme.com"]));
        let entry = board.entry(0).unwrap();
        assert_eq!(entry.name, "Acme");
        assert_eq!(entry.status, EnrichmentStatus::NotEnriched);
        assert_eq!(board.pending_websites(), vec!["https://www.acme.com"]);
    }

    #[test]
    fn test_failure_then_success_transitions() {
        let mut board = BrandBoard::from_websites(websites(&["a.test"]));
        board.mark_enriching(&websites(&["a.test"]));
        assert!(board.pending_websites().is_empty());

        board.apply(
            "a.test",
            &Outcome::Failure(crate::runner::OperationFailure::new("boom")),
        );
        let entry = board.entry(0).unwrap();
        assert_eq!(entry.status, EnrichmentStatus::EnrichError);
        assert_eq!(entry.error.as_deref(), Some("boom"));
        assert_eq!(board.pending_websites(), vec!["a.test"]);

        board.apply("a.test", &Outcome::Success(sample_result("a.test", "A")));
        let entry = board.entry(0).unwrap();
        assert_eq!(entry.status, EnrichmentStatus::Enriched);
        assert!(entry.error.is_none());
        assert!(entry.enriched_at.is_some());
        assert_eq!(entry.primary_location.as_ref().unwrap().city, "Denver");
    }

    #[test]
    fn test_user_edits_are_protected() {
        let mut board =
            BrandBoard::from_websites(websites(&["a.test"])).with_apply_to_edited_fields(false);
        board.edit_name(0, "My Name").unwrap();

        board.apply("a.test", &Outcome::Success(sample_result("a.test", "Enriched")));

        let entry = board.entry(0).unwrap();
        assert_eq!(entry.name, "My Name");
        assert!(entry.is_user_edited(EditableField::Name));
        assert_eq!(entry.alternative_names, vec!["Enriched Co"]);
        assert_eq!(entry.competitors.len(), 1);
    }

    #[test]
    fn test_apply_to_edited_fields_overrides() {
        let mut board =
            BrandBoard::from_websites(websites(&["a.test"])).with_apply_to_edited_fields(true);
        board.edit_name(0, "My Name").unwrap();

        board.apply("a.test", &Outcome::Success(sample_result("a.test", "Enriched")));

        assert_eq!(board.entry(0).unwrap().name, "Enriched");
    }

    #[test]
    fn test_new_board_overwrites_edits_by_default() {
        let mut board = BrandBoard::from_websites(websites(&["a.test"]));
        board.edit_competitors(0, Vec::new()).unwrap();

        board.apply("a.test", &Outcome::Success(sample_result("a.test", "Enriched")));

        let entry = board.entry(0).unwrap();
        assert_eq!(entry.competitors.len(), 1);
        assert!(entry.is_user_edited(EditableField::Competitors));
    }

    #[test]
    fn test_edit_unknown_entry() {
        let mut board = BrandBoard::from_websites(websites(&["a.test"]));
        assert!(matches!(
            board.edit_name(9, "x"),
            Err(BoardError::UnknownEntry(9))
        ));
    }

    #[test]
    fn test_report_display() {
        let report = BoardReport {
            total: 5,
            enriched: 3,
            failed: 2,
            pending: 0,
        };
        assert_eq!(report.to_string(), "3 of 5 enriched, 2 failed");
    }

    #[tokio::test]
    async fn test_enrich_pending_reports_partial_success() {
        let enricher = Arc::new(FakeEnricher::new(&["a.test", "c.test"]));
        let mut board = BrandBoard::from_websites(websites(&["a.test", "b.test", "c.test"]));
        let runner = BoundedRunner::new(RunnerConfig::new(2).unwrap());

        let report = board
            .enrich_pending(enricher.clone(), &runner)
            .await
            .unwrap();

        assert_eq!(
            report,
            BoardReport {
                total: 3,
                enriched: 2,
                failed: 1,
                pending: 0
            }
        );
        let failed = board.entry(1).unwrap();
        assert_eq!(failed.status, EnrichmentStatus::EnrichError);
        assert_eq!(failed.error.as_deref(), Some("no data for b.test"));

        // Second pass only resubmits the failed entry
        enricher.calls.lock().unwrap().clear();
        board.enrich_pending(enricher.clone(), &runner).await.unwrap();
        assert_eq!(*enricher.calls.lock().unwrap(), vec!["b.test".to_string()]);
    }

    #[tokio::test]
    async fn test_enrich_pending_with_nothing_to_do() {
        let enricher = Arc::new(FakeEnricher::new(&[]));
        let mut board = BrandBoard::default();
        let report = board
            .enrich_pending(enricher.clone(), &BoundedRunner::default())
            .await
            .unwrap();

        assert_eq!(report.total, 0);
        assert!(enricher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_websites_update_every_entry() {
        let enricher = Arc::new(FakeEnricher::new(&["a.test"]));
        let mut board = BrandBoard::from_websites(websites(&["a.test", "a.test"]));

        let report = board
            .enrich_pending(enricher.clone(), &BoundedRunner::default())
            .await
            .unwrap();

        assert_eq!(report.enriched, 2);
        assert_eq!(enricher.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retry_entry_touches_only_that_entry() {
        let enricher = Arc::new(FakeEnricher::new(&["a.test"]));
        let mut board = BrandBoard::from_websites(websites(&["a.test", "a.test"]));

        let status = board.retry_entry(1, enricher).await.unwrap();

        assert_eq!(status, EnrichmentStatus::Enriched);
        assert_eq!(board.entry(0).unwrap().status, EnrichmentStatus::NotEnriched);
        assert_eq!(board.entry(1).unwrap().status, EnrichmentStatus::Enriched);
    }

    #[tokio::test]
    async fn test_retry_unknown_entry() {
        let enricher = Arc::new(FakeEnricher::new(&[]));
        let mut board = BrandBoard::default();
        assert!(matches!(
            board.retry_entry(3, enricher).await,
            Err(BoardError::UnknownEntry(3))
        ));
    }
}
