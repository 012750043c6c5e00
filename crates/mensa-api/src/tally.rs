use std::collections::BTreeMap;

use mensa_types::models::Review;

/// Vote tally for one meal: count per rating bucket 1-5. Pure and cheap
/// enough to recompute on every read, so the result is never stale.
/// Out-of-range ratings are ignored; the store already refuses them.
pub fn tally(reviews: &[Review]) -> BTreeMap<u8, u32> {
    let mut buckets: BTreeMap<u8, u32> = (1..=5).map(|bucket| (bucket, 0)).collect();

    for review in reviews {
        if let Some(count) = buckets.get_mut(&review.rating) {
            *count += 1;
        }
    }

    buckets
}
