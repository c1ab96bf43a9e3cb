//! Restores fetch-quest predicates on chunks read from storage.

use delve_gameplay::{FetchItemRegistry, RehydrationReport};
use tracing::debug;

use crate::chunk::Chunk;

/// Rehydrates every vendor quest target in the chunk.
///
/// Targets that already carry a predicate are left untouched, so running
/// this twice is the same as running it once.
pub fn rehydrate_chunk(chunk: &mut Chunk, registry: &FetchItemRegistry) -> RehydrationReport {
    let coord = chunk.coord();
    let mut report = RehydrationReport::default();
    for offer in chunk.vendor_offers_mut() {
        report.record(registry.rehydrate(&mut offer.target));
    }
    if report.restored + report.missing > 0 {
        debug!(
            "rehydrated chunk {coord}: restored={} missing={}",
            report.restored, report.missing
        );
    }
    report
}
