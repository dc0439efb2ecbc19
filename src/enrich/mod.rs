//! Chapter metadata enrichment.
//!
//! Runs out of the read path:
//!
//! ```text
//! submit() → queue → worker task → Enricher → ChapterProbe (≤ N at once)
//!                                      ↓
//!                              Table::put per entry
//! ```

pub mod jobs;
pub mod probe;
pub mod worker;

pub use jobs::{DEFAULT_JOB_HISTORY, EnrichmentJobs, JobError, JobState, JobStatus, JobTicket};
pub use probe::{ChapterProbe, FfprobeProbe};
pub use worker::{EnrichReport, Enricher, EntryStats};
