//! Query pipeline shared by scan-based backends
//!
//! Given the candidate records of a fetch, applies the request's predicate,
//! orders the survivors by its sort descriptors (ties broken by resource so
//! results are deterministic), then applies offset and limit.

use std::cmp::Ordering;

use tracing::trace;

use entitystore_core::{FetchRequest, Resource, ValuesObject};

/// Filter, order and slice candidate records
///
/// The request must already have been checked against its entity.
pub fn execute<'a, I>(request: &FetchRequest, candidates: I) -> Vec<Resource>
where
    I: IntoIterator<Item = (&'a Resource, &'a ValuesObject)>,
{
    let mut matched: Vec<(&Resource, &ValuesObject)> = candidates
        .into_iter()
        .filter(|(_, values)| {
            request
                .predicate
                .as_ref()
                .map_or(true, |predicate| predicate.evaluate(values))
        })
        .collect();

    matched.sort_by(|(ra, va), (rb, vb)| order(request, ra, va, rb, vb));
    trace!(
        entity = request.entity.as_str(),
        matched = matched.len(),
        "query filtered"
    );

    request
        .paginate(matched)
        .into_iter()
        .map(|(resource, _)| resource.clone())
        .collect()
}

fn order(
    request: &FetchRequest,
    ra: &Resource,
    va: &ValuesObject,
    rb: &Resource,
    vb: &ValuesObject,
) -> Ordering {
    request.compare(va, vb).then_with(|| ra.cmp(rb))
}
