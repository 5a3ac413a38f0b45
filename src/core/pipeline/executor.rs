//! Pipeline execution implementation.

use crate::core::cache::{CacheStats, FingerprintCache};
use crate::core::dupe::{group_duplicates, DuplicateGroup};
use crate::core::hasher::{AlgorithmConfig, Fingerprint, FingerprintProvider, ImageFingerprinter};
use crate::core::scanner::{CandidateFile, ImageEnumerator, ScanConfig};
use crate::core::search::{search, SearchMatch, SearchOptions};
use crate::core::ImageRecord;
use crate::error::{HashError, ImageSearchError, Result};
use crate::events::{
    Event, EventSender, HashEvent, HashProgress, PipelineEvent, PipelinePhase, PipelineSummary,
    ScanEvent,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// A path left out of the results, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPath {
    pub path: PathBuf,
    /// Named on the command line rather than found in a directory
    pub explicit: bool,
    pub reason: String,
}

/// Every candidate of a run, fingerprinted or skipped
#[derive(Debug, Default)]
pub struct Fingerprinted {
    /// Candidate files enumerated
    pub candidates: usize,
    /// Successfully fingerprinted candidates, in enumeration order
    pub records: Vec<ImageRecord>,
    /// Paths that could not be enumerated or fingerprinted
    pub skipped: Vec<SkippedPath>,
}

/// Result of a search run
#[derive(Debug)]
pub struct SearchResult {
    pub reference: ImageRecord,
    pub matches: Vec<SearchMatch>,
    pub skipped: Vec<SkippedPath>,
    pub summary: PipelineSummary,
    pub cache: CacheStats,
}

/// Result of a dupe run
#[derive(Debug)]
pub struct DupeResult {
    pub groups: Vec<DuplicateGroup>,
    pub skipped: Vec<SkippedPath>,
    pub summary: PipelineSummary,
    pub cache: CacheStats,
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Files and directories to search
    pub paths: Vec<PathBuf>,
    /// Algorithm and parameters applied to every image
    pub algorithm: AlgorithmConfig,
    /// Enumerator configuration
    pub scan_config: ScanConfig,
    /// Worker threads for hashing (None = rayon's default)
    pub jobs: Option<usize>,
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    provider: Option<Box<dyn FingerprintProvider>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            provider: None,
        }
    }

    /// Set the files and directories to search
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    /// Set the algorithm configuration
    pub fn algorithm(mut self, algorithm: AlgorithmConfig) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    /// Set enumerator configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Skip hidden files and directories
    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.config.scan_config.skip_hidden = skip;
        self
    }

    /// Limit the number of hashing threads
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.config.jobs = jobs;
        self
    }

    /// Replace the fingerprint provider
    pub fn provider(mut self, provider: Box<dyn FingerprintProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        self.config.algorithm.validate()?;

        if self.config.jobs == Some(0) {
            return Err(ImageSearchError::Argument(
                "jobs must be at least 1".to_string(),
            ));
        }

        Ok(Pipeline {
            config: self.config,
            provider: self
                .provider
                .unwrap_or_else(|| Box::new(ImageFingerprinter::new())),
            cache: FingerprintCache::new(),
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The search and dupe pipeline
pub struct Pipeline {
    config: PipelineConfig,
    provider: Box<dyn FingerprintProvider>,
    cache: FingerprintCache,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// The configuration this pipeline runs with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Rank every candidate by distance to the image at `reference`.
    ///
    /// Failing to fingerprint the reference is fatal; failing on a
    /// candidate only skips it.
    pub fn search(
        &self,
        reference: &Path,
        options: &SearchOptions,
        events: &EventSender,
    ) -> Result<SearchResult> {
        let start_time = Instant::now();
        events.send(Event::Pipeline(PipelineEvent::Started));

        let outcome = self.run_in_pool(|| {
            let reference_fingerprint = self.fingerprint(reference)?;
            tracing::debug!(
                path = %reference.display(),
                fingerprint = %reference_fingerprint,
                "fingerprinted reference"
            );

            let fingerprinted = self.fingerprint_candidates(events);
            if fingerprinted.candidates == 0 {
                tracing::warn!("no candidate images found");
            }

            events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: PipelinePhase::Searching,
            }));
            let matches = search(&reference_fingerprint, fingerprinted.records.iter().cloned(), options)?;

            Ok((reference_fingerprint, fingerprinted, matches))
        });

        let (reference_fingerprint, fingerprinted, matches) = self.report_fatal(outcome, events)?;

        let summary = self.finish(&fingerprinted, matches.len(), start_time, events);

        Ok(SearchResult {
            reference: ImageRecord {
                path: reference.to_path_buf(),
                fingerprint: reference_fingerprint,
            },
            matches,
            skipped: fingerprinted.skipped,
            summary,
            cache: self.cache.stats(),
        })
    }

    /// Group every candidate with identical fingerprints
    pub fn dupe(&self, events: &EventSender) -> Result<DupeResult> {
        let start_time = Instant::now();
        events.send(Event::Pipeline(PipelineEvent::Started));

        let outcome = self.run_in_pool(|| Ok(self.fingerprint_candidates(events)));
        let fingerprinted = self.report_fatal(outcome, events)?;

        if fingerprinted.candidates == 0 {
            tracing::warn!("no candidate images found");
        }

        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Grouping,
        }));
        let groups = group_duplicates(fingerprinted.records.iter().cloned());

        let summary = self.finish(&fingerprinted, groups.len(), start_time, events);

        Ok(DupeResult {
            groups,
            skipped: fingerprinted.skipped,
            summary,
            cache: self.cache.stats(),
        })
    }

    /// Enumerate the configured paths and fingerprint every candidate in
    /// parallel. Records keep enumeration order.
    pub fn fingerprint_candidates(&self, events: &EventSender) -> Fingerprinted {
        let (candidates, mut skipped) = self.enumerate(events);
        let total = candidates.len();

        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Hashing,
        }));
        events.send(Event::Hash(HashEvent::Started { total_files: total }));

        let completed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        let outcomes: Vec<std::result::Result<ImageRecord, SkippedPath>> = candidates
            .into_par_iter()
            .map(|candidate| {
                let current_path = candidate.path.clone();

                let outcome = match self.fingerprint(&candidate.path) {
                    Ok(fingerprint) => Ok(ImageRecord {
                        path: candidate.path,
                        fingerprint,
                    }),
                    Err(e) => {
                        failed.fetch_add(1, Ordering::SeqCst);
                        Err(self.skip_candidate(candidate, &e, events))
                    }
                };

                events.send(Event::Hash(HashEvent::Progress(HashProgress {
                    completed: completed.fetch_add(1, Ordering::SeqCst) + 1,
                    total,
                    skipped: failed.load(Ordering::SeqCst),
                    current_path,
                })));

                outcome
            })
            .collect();

        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(skip) => skipped.push(skip),
            }
        }

        events.send(Event::Hash(HashEvent::Completed {
            total_hashed: records.len(),
            skipped: failed.load(Ordering::SeqCst),
            cache_hits: self.cache.stats().hits,
        }));

        Fingerprinted {
            candidates: total,
            records,
            skipped,
        }
    }

    fn enumerate(&self, events: &EventSender) -> (Vec<CandidateFile>, Vec<SkippedPath>) {
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));
        events.send(Event::Scan(ScanEvent::Started {
            paths: self.config.paths.clone(),
        }));

        let enumerator = ImageEnumerator::new(self.config.scan_config.clone());
        let mut candidates = Vec::new();
        let mut skipped = Vec::new();

        for result in enumerator.enumerate(&self.config.paths) {
            match result {
                Ok(candidate) => {
                    events.send(Event::Scan(ScanEvent::FileFound {
                        path: candidate.path.clone(),
                    }));
                    candidates.push(candidate);
                }
                Err(e) => {
                    let path = e.path().clone();
                    let explicit = self.config.paths.contains(&path);
                    tracing::warn!(path = %path.display(), error = %e, "skipping path");
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.clone(),
                        message: e.to_string(),
                    }));
                    skipped.push(SkippedPath {
                        path,
                        explicit,
                        reason: e.to_string(),
                    });
                }
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: candidates.len(),
        }));

        (candidates, skipped)
    }

    fn fingerprint(&self, path: &Path) -> std::result::Result<Fingerprint, HashError> {
        self.cache.get_or_try_insert_with(path, || {
            self.provider.compute_file(path, &self.config.algorithm)
        })
    }

    fn skip_candidate(
        &self,
        candidate: CandidateFile,
        error: &HashError,
        events: &EventSender,
    ) -> SkippedPath {
        if candidate.explicit {
            tracing::warn!(path = %candidate.path.display(), error = %error, "skipping file");
        } else {
            tracing::debug!(path = %candidate.path.display(), error = %error, "skipping file");
        }

        events.send(Event::Hash(HashEvent::Skipped {
            path: candidate.path.clone(),
            message: error.to_string(),
        }));

        SkippedPath {
            path: candidate.path,
            explicit: candidate.explicit,
            reason: error.to_string(),
        }
    }

    fn run_in_pool<T, F>(&self, op: F) -> Result<T>
    where
        T: Send,
        F: FnOnce() -> Result<T> + Send,
    {
        match self.config.jobs {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| ImageSearchError::Config(e.to_string()))?
                .install(op),
            None => op(),
        }
    }

    fn report_fatal<T>(&self, outcome: Result<T>, events: &EventSender) -> Result<T> {
        if let Err(ref e) = outcome {
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
        }
        outcome
    }

    fn finish(
        &self,
        fingerprinted: &Fingerprinted,
        results: usize,
        start_time: Instant,
        events: &EventSender,
    ) -> PipelineSummary {
        let summary = PipelineSummary {
            candidates: fingerprinted.candidates,
            hashed: fingerprinted.records.len(),
            skipped: fingerprinted.skipped.len(),
            results,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        tracing::info!(
            candidates = summary.candidates,
            hashed = summary.hashed,
            skipped = summary.skipped,
            results = summary.results,
            duration_ms = summary.duration_ms,
            "run complete"
        );

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: summary.clone(),
        }));

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::Algorithm;
    use crate::events::{null_sender, EventChannel};
    use std::collections::HashMap;
    use std::fs::File;
    use tempfile::TempDir;

    /// Serves fingerprints by file name without decoding anything
    struct FakeProvider {
        by_name: HashMap<String, Fingerprint>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(entries: &[(&str, u32)]) -> Self {
            Self {
                by_name: entries
                    .iter()
                    .map(|(name, distance)| (name.to_string(), fingerprint_at(*distance)))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl FingerprintProvider for FakeProvider {
        fn compute(
            &self,
            _image: &[u8],
            _config: &AlgorithmConfig,
        ) -> std::result::Result<Fingerprint, HashError> {
            Err(HashError::Computation("bytes are not served".to_string()))
        }

        fn compute_file(
            &self,
            path: &Path,
            _config: &AlgorithmConfig,
        ) -> std::result::Result<Fingerprint, HashError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.by_name
                .get(&name)
                .cloned()
                .ok_or_else(|| HashError::Decode {
                    path: path.to_path_buf(),
                    reason: "not an image".to_string(),
                })
        }
    }

    fn fingerprint_at(distance: u32) -> Fingerprint {
        let value: u64 = if distance >= 64 {
            u64::MAX
        } else {
            (1u64 << distance) - 1
        };
        Fingerprint::new(Algorithm::Ahash, value.to_be_bytes().to_vec(), 64)
    }

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        File::create(&path).unwrap();
        path
    }

    /// Files `img0.png`..`img9.png` at the example distances, plus a
    /// reference outside the searched directory
    fn example_setup() -> (TempDir, TempDir, PathBuf, FakeProvider) {
        const DISTANCES: [u32; 10] = [28, 38, 12, 18, 32, 29, 0, 29, 5, 28];

        let search_dir = TempDir::new().unwrap();
        let reference_dir = TempDir::new().unwrap();
        let mut entries: Vec<(String, u32)> = Vec::new();

        for (i, d) in DISTANCES.iter().enumerate() {
            let name = format!("img{}.png", i);
            touch(&search_dir, &name);
            entries.push((name, *d));
        }
        let reference = touch(&reference_dir, "reference.png");
        entries.push(("reference.png".to_string(), 0));

        let borrowed: Vec<(&str, u32)> = entries.iter().map(|(n, d)| (n.as_str(), *d)).collect();
        (search_dir, reference_dir, reference, FakeProvider::new(&borrowed))
    }

    fn pipeline_for(paths: Vec<PathBuf>, provider: FakeProvider) -> Pipeline {
        Pipeline::builder()
            .paths(paths)
            .provider(Box::new(provider))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_rejects_invalid_parameters() {
        let result = Pipeline::builder()
            .algorithm(AlgorithmConfig::Colorhash { binbits: 0 })
            .build();

        assert!(matches!(result, Err(ImageSearchError::Param(_))));
    }

    #[test]
    fn builder_rejects_zero_jobs() {
        let result = Pipeline::builder().jobs(Some(0)).build();
        assert!(matches!(result, Err(ImageSearchError::Argument(_))));
    }

    #[test]
    fn search_sorts_example_distances() {
        let (dir, _ref_dir, reference, provider) = example_setup();
        let pipeline = pipeline_for(vec![dir.path().to_path_buf()], provider);

        let result = pipeline
            .search(&reference, &SearchOptions::default(), &null_sender())
            .unwrap();

        let distances: Vec<u32> = result.matches.iter().map(|m| m.distance).collect();
        assert_eq!(distances, vec![0, 5, 12, 18, 28, 28, 29, 29, 32, 38]);
        assert!(result.matches[4].record.path.ends_with("img0.png"));
        assert!(result.matches[5].record.path.ends_with("img9.png"));
        assert_eq!(result.summary.candidates, 10);
    }

    #[test]
    fn search_with_threshold() {
        let (dir, _ref_dir, reference, provider) = example_setup();
        let pipeline = pipeline_for(vec![dir.path().to_path_buf()], provider);

        let options = SearchOptions {
            threshold: Some(10),
            stop_on_first_match: false,
        };
        let result = pipeline.search(&reference, &options, &null_sender()).unwrap();

        let distances: Vec<u32> = result.matches.iter().map(|m| m.distance).collect();
        assert_eq!(distances, vec![0, 5]);
    }

    #[test]
    fn first_match_follows_enumeration_order_under_parallel_hashing() {
        let (dir, _ref_dir, reference, provider) = example_setup();
        let pipeline = Pipeline::builder()
            .paths(vec![dir.path().to_path_buf()])
            .provider(Box::new(provider))
            .jobs(Some(4))
            .build()
            .unwrap();

        let options = SearchOptions {
            threshold: Some(20),
            stop_on_first_match: true,
        };
        let result = pipeline.search(&reference, &options, &null_sender()).unwrap();

        assert_eq!(result.matches.len(), 1);
        assert!(result.matches[0].record.path.ends_with("img2.png"));
    }

    #[test]
    fn unreadable_reference_is_fatal() {
        let (dir, _ref_dir, _reference, provider) = example_setup();
        let pipeline = pipeline_for(vec![dir.path().to_path_buf()], provider);

        let result = pipeline.search(
            Path::new("/no/such/reference.bmp"),
            &SearchOptions::default(),
            &null_sender(),
        );

        assert!(matches!(result, Err(ImageSearchError::Hash(_))));
    }

    #[test]
    fn non_images_are_skipped_not_fatal() {
        let (dir, _ref_dir, reference, provider) = example_setup();
        touch(&dir, "notes.txt");
        let pipeline = pipeline_for(vec![dir.path().to_path_buf()], provider);

        let result = pipeline
            .search(&reference, &SearchOptions::default(), &null_sender())
            .unwrap();

        assert_eq!(result.matches.len(), 10);
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].path.ends_with("notes.txt"));
        assert!(!result.skipped[0].explicit);
        assert_eq!(result.summary.skipped, 1);
    }

    #[test]
    fn missing_search_path_is_skipped() {
        let (dir, _ref_dir, reference, provider) = example_setup();
        let pipeline = pipeline_for(
            vec![PathBuf::from("/no/such/dir"), dir.path().to_path_buf()],
            provider,
        );

        let result = pipeline
            .search(&reference, &SearchOptions::default(), &null_sender())
            .unwrap();

        assert_eq!(result.matches.len(), 10);
        assert_eq!(result.skipped[0].path, PathBuf::from("/no/such/dir"));
        assert!(result.skipped[0].explicit);
    }

    #[test]
    fn every_path_is_fingerprinted_once() {
        let (dir, _ref_dir, reference, provider) = example_setup();
        let explicit = dir.path().join("img3.png");
        let pipeline = pipeline_for(
            vec![
                explicit.clone(),
                dir.path().to_path_buf(),
                reference.clone(),
                explicit,
            ],
            provider,
        );

        let result = pipeline
            .search(&reference, &SearchOptions::default(), &null_sender())
            .unwrap();

        // ten files plus the reference, which is also a candidate here
        assert_eq!(result.matches.len(), 11);
        assert_eq!(result.cache.entries, 11);
        assert_eq!(result.cache.hits, 1);
    }

    #[test]
    fn empty_directory_gives_empty_result() {
        let dir = TempDir::new().unwrap();
        let (_search_dir, _ref_dir, reference, provider) = example_setup();
        let pipeline = pipeline_for(vec![dir.path().to_path_buf()], provider);

        let result = pipeline
            .search(&reference, &SearchOptions::default(), &null_sender())
            .unwrap();

        assert!(result.matches.is_empty());
        assert_eq!(result.summary.candidates, 0);
    }

    #[test]
    fn dupe_groups_identical_fingerprints() {
        let dir = TempDir::new().unwrap();
        for name in ["A.png", "B.png", "C.png", "D.png", "E.png"] {
            touch(&dir, name);
        }
        let provider = FakeProvider::new(&[
            ("A.png", 7),
            ("B.png", 1),
            ("C.png", 12),
            ("D.png", 7),
            ("E.png", 6),
        ]);
        let pipeline = pipeline_for(vec![dir.path().to_path_buf()], provider);

        let result = pipeline.dupe(&null_sender()).unwrap();

        assert_eq!(result.groups.len(), 1);
        let names: Vec<_> = result.groups[0]
            .paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.png", "D.png"]);
        assert_eq!(result.summary.results, 1);
    }

    #[test]
    fn events_report_progress_and_completion() {
        let (dir, _ref_dir, reference, provider) = example_setup();
        let pipeline = pipeline_for(vec![dir.path().to_path_buf()], provider);
        let (sender, receiver) = EventChannel::new();

        pipeline
            .search(&reference, &SearchOptions::default(), &sender)
            .unwrap();
        drop(sender);

        let events: Vec<Event> = receiver.iter().collect();
        let progress = events
            .iter()
            .filter(|e| matches!(e, Event::Hash(HashEvent::Progress(_))))
            .count();
        assert_eq!(progress, 10);
        assert!(matches!(
            events.last(),
            Some(Event::Pipeline(PipelineEvent::Completed { .. }))
        ));
    }
}
