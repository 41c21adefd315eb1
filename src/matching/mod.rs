//! Matching engine: blocking, field comparison, composite scoring, classification.
//!
//! Flow for one run: the yearly table is normalized and indexed once
//! ([`blocking::BlockingIndex`]); each daily record is normalized, looked up by its
//! block key, scored against every candidate in the bucket
//! ([`scorer::find_best_match`]), and the best candidate is classified
//! ([`classify::classify`]). Nothing here touches I/O or holds state between runs.

pub mod blocking;
pub mod classify;
pub mod compare;
pub mod scorer;

// Shared string similarity helpers
mod helpers;

pub use blocking::{BlockKey, BlockingIndex, block_key, build_index};
pub use classify::{AuditEntry, Classification, PartitionResult, classify};
pub use compare::{FieldComparison, NormalizedField, NormalizedRecord, compare, similarity};
pub use scorer::{
    FieldIndicator, MatchCandidateResult, MatchType, Scoring, find_best_match, score_candidate,
};
