//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by a search or dupe run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Enumeration phase events
    Scan(ScanEvent),
    /// Fingerprinting phase events
    Hash(HashEvent),
    /// Run-level events
    Pipeline(PipelineEvent),
}

/// Events while enumerating candidate files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Enumeration has started
    Started { paths: Vec<PathBuf> },
    /// A candidate file was found
    FileFound { path: PathBuf },
    /// A path could not be enumerated; the run continues without it
    Error { path: PathBuf, message: String },
    /// Enumeration completed
    Completed { total_files: usize },
}

/// Events while fingerprinting candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// Fingerprinting has started
    Started { total_files: usize },
    /// One more candidate finished, successfully or not
    Progress(HashProgress),
    /// A candidate could not be fingerprinted and was skipped
    Skipped { path: PathBuf, message: String },
    /// Fingerprinting completed
    Completed {
        total_hashed: usize,
        skipped: usize,
        cache_hits: usize,
    },
}

/// Progress information during fingerprinting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashProgress {
    /// Candidates finished so far
    pub completed: usize,
    /// Total candidates
    pub total: usize,
    /// Candidates skipped so far
    pub skipped: usize,
    /// Candidate that just finished
    pub current_path: PathBuf,
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// The run has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// The run completed successfully
    Completed { summary: PipelineSummary },
    /// The run hit a fatal error
    Error { message: String },
}

/// Phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Hashing,
    Searching,
    Grouping,
}

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Candidate files enumerated
    pub candidates: usize,
    /// Candidates fingerprinted successfully
    pub hashed: usize,
    /// Candidates skipped (not images, unreadable)
    pub skipped: usize,
    /// Search matches or duplicate groups reported
    pub results: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Hashing => write!(f, "Hashing"),
            PipelinePhase::Searching => write!(f, "Searching"),
            PipelinePhase::Grouping => write!(f, "Grouping"),
        }
    }
}
