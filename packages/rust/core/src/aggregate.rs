//! Merge precedence across sources, cache, and enrichment.
//!
//! When the same address appears more than once in a run, resolution follows
//! a fixed policy: a source-declared hint always wins, a pre-existing cache
//! entry is reused verbatim (no re-lookup), and only addresses with neither
//! go to the rate-limited external lookup — exactly once per address per run.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use ipcatalog_shared::{Address, Candidate, Provenance, Record};

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A source-declared resolution for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredHint {
    pub region: String,
    pub owner: Option<String>,
}

/// Resolve one address against the precedence policy.
///
/// Highest to lowest: declared hint, cached record, external lookup. The
/// lookup future is only awaited when both higher tiers are absent.
pub async fn resolve_record<F, Fut>(
    address: Address,
    declared: Option<&DeclaredHint>,
    cached: Option<&Record>,
    lookup: &F,
) -> Record
where
    F: Fn(Address) -> Fut,
    Fut: Future<Output = Record>,
{
    if let Some(hint) = declared {
        return Record::declared(hint.region.clone(), hint.owner.clone());
    }
    if let Some(record) = cached {
        return record.clone();
    }
    lookup(address).await
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Result of merging all candidates into one resolved mapping.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// Final resolution per unique address.
    pub records: BTreeMap<Address, Record>,
    /// Addresses resolved from a source-declared hint.
    pub declared: usize,
    /// Addresses reused verbatim from the cache.
    pub cache_hits: usize,
    /// External lookups performed.
    pub lookups: usize,
    /// Lookups that ended in the failure sentinel.
    pub lookup_failures: usize,
    /// Duplicate candidates absorbed without effect.
    pub duplicates: usize,
}

/// Merge candidates from all sources with the cache and the lookup function.
///
/// Runs in two phases. First every candidate is collapsed per address —
/// among multiple declared hints for one address, the first seen wins, in
/// configured source order. Then each unique address is resolved exactly
/// once, so duplicates can never trigger a second lookup or overwrite an
/// existing resolution.
#[instrument(skip_all, fields(candidates = candidates.len(), cache = cache.len()))]
pub async fn merge<F, Fut>(
    candidates: &[Candidate],
    cache: &BTreeMap<Address, Record>,
    lookup: F,
) -> MergeOutcome
where
    F: Fn(Address) -> Fut,
    Fut: Future<Output = Record>,
{
    let mut outcome = MergeOutcome::default();

    // Phase 1: collapse candidates per address, keeping the first declared
    // hint for each.
    let mut collapsed: BTreeMap<Address, Option<DeclaredHint>> = BTreeMap::new();
    for candidate in candidates {
        let hint = candidate.region_hint.as_ref().map(|region| DeclaredHint {
            region: region.clone(),
            owner: candidate.owner_hint.clone(),
        });

        match collapsed.entry(candidate.address) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(hint);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                outcome.duplicates += 1;
                if slot.get().is_none() {
                    if let Some(hint) = hint {
                        slot.insert(Some(hint));
                    }
                }
            }
        }
    }

    // Phase 2: resolve each unique address once.
    for (address, hint) in &collapsed {
        let record = resolve_record(*address, hint.as_ref(), cache.get(address), &lookup).await;

        match record.provenance {
            Provenance::SourceDeclared => outcome.declared += 1,
            Provenance::Cache => outcome.cache_hits += 1,
            Provenance::Lookup => outcome.lookups += 1,
            Provenance::LookupFailed => {
                outcome.lookups += 1;
                outcome.lookup_failures += 1;
            }
        }

        debug!(address = %address, provenance = ?record.provenance, region = %record.region, "resolved");
        outcome.records.insert(*address, record);
    }

    outcome
}
