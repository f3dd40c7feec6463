//! Contact scanner.
//!
//! For every unordered pair of parts, asks the collision collaborator for
//! penetrating contacts, drops contacts shallower than the size-relative
//! noise threshold, and returns the surviving pairs in enumeration order.
//! That order fixes the tie-break order for correction application and must
//! be reproducible for determinism.

use crate::contact::PairContacts;
use crate::error::Result;
use crate::params::SeparateParams;
use crate::part::Part;
use crate::query::CollisionQuery;
use crate::shapes::ShapeCache;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scan every unordered pair `(i, j)`, `i < j`, for penetrating contacts.
///
/// Pairs with no contacts, or whose contacts are all at or below
/// `ignore_depth_percent * (size(i) + size(j))`, contribute nothing. The
/// size heuristic (mean bounding-box extent per part) is computed once per
/// part per scan. In [`ShapeStrategy::DeltaTransform`](crate::ShapeStrategy)
/// mode, moved parts are queried with their delta transform instead of a
/// rebuilt shape.
///
/// # Errors
///
/// Propagates the first collision-query failure.
pub fn scan_pairs<P, Q>(
    parts: &[P],
    cache: &ShapeCache<P::Shape>,
    query: &Q,
    params: &SeparateParams,
) -> Result<Vec<PairContacts>>
where
    P: Part,
    Q: CollisionQuery<Shape = P::Shape>,
{
    let sizes = part_sizes(cache, query);
    let mut pairs = Vec::new();

    for first in 0..parts.len() {
        for second in (first + 1)..parts.len() {
            if let Some(pair) = scan_pair(first, second, parts, cache, query, params, &sizes)? {
                pairs.push(pair);
            }
        }
    }

    Ok(pairs)
}

/// Scan all pairs in parallel, merging results back into enumeration order.
///
/// Each pair's query is independent and read-only, so the scan distributes
/// over rayon's thread pool. The output is identical to [`scan_pairs`]:
/// results are collected in pair enumeration order before being handed to
/// the correction calculator, since dampening and application order depend
/// on it. Falls back to the sequential scan when there are fewer than
/// `min_pairs` pairs, to avoid parallel overhead on small scenes.
///
/// # Errors
///
/// Propagates the first collision-query failure (in enumeration order).
#[cfg(feature = "parallel")]
pub fn scan_pairs_parallel<P, Q>(
    parts: &[P],
    cache: &ShapeCache<P::Shape>,
    query: &Q,
    params: &SeparateParams,
    min_pairs: usize,
) -> Result<Vec<PairContacts>>
where
    P: Part + Sync,
    P::Shape: Sync,
    Q: CollisionQuery<Shape = P::Shape> + Sync,
{
    let part_count = parts.len();
    let pair_count = part_count * part_count.saturating_sub(1) / 2;
    if pair_count < min_pairs {
        return scan_pairs(parts, cache, query, params);
    }

    let sizes = part_sizes(cache, query);
    let indices: Vec<(usize, usize)> = (0..part_count)
        .flat_map(|first| ((first + 1)..part_count).map(move |second| (first, second)))
        .collect();

    let scanned: Vec<Option<PairContacts>> = indices
        .par_iter()
        .map(|&(first, second)| scan_pair(first, second, parts, cache, query, params, &sizes))
        .collect::<Result<_>>()?;

    Ok(scanned.into_iter().flatten().collect())
}

/// Size heuristic per part index, memoized for one scan call.
fn part_sizes<S, Q>(cache: &ShapeCache<S>, query: &Q) -> Vec<f64>
where
    Q: CollisionQuery<Shape = S>,
{
    cache
        .shapes()
        .iter()
        .map(|shape| query.bounding_box(shape).mean_extent())
        .collect()
}

fn scan_pair<P, Q>(
    first: usize,
    second: usize,
    parts: &[P],
    cache: &ShapeCache<P::Shape>,
    query: &Q,
    params: &SeparateParams,
    sizes: &[f64],
) -> Result<Option<PairContacts>>
where
    P: Part,
    Q: CollisionQuery<Shape = P::Shape>,
{
    let delta_first = cache.delta(first, &parts[first].pose());
    let delta_second = cache.delta(second, &parts[second].pose());

    let shapes = cache.shapes();
    let contacts = query.contacts(
        &shapes[first],
        &shapes[second],
        delta_first.as_ref(),
        delta_second.as_ref(),
        params.max_contacts_per_pair,
    )?;
    if contacts.is_empty() {
        return Ok(None);
    }

    let min_depth = params.ignore_depth_percent * (sizes[first] + sizes[second]);
    let contacts: Vec<_> = contacts
        .into_iter()
        .filter(|contact| contact.depth > min_depth)
        .collect();
    if contacts.is_empty() {
        return Ok(None);
    }

    Ok(Some(PairContacts {
        first,
        second,
        size_first: sizes[first],
        size_second: sizes[second],
        contacts,
    }))
}
