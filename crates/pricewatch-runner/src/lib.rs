//! Scrape orchestration: drives vendor adapters through the run loop,
//! classifies each vendor's outcome, and hands normalized batches to a sink.

pub mod drift;
pub mod jsonl_sink;
pub mod orchestrator;
pub mod sink;
pub mod status;
pub mod summary;

pub use drift::{parse_expected_start, timing_delay_seconds};
pub use jsonl_sink::JsonlSink;
pub use orchestrator::{Orchestrator, RunRequest, RunSettings};
pub use sink::{SaveOutcome, Sink};
pub use status::{classify_vendor, StatusInputs, VendorStatus};
pub use summary::{RunError, RunErrorKind, Summary, VendorRunResult};
