//! Rendition selection policy
//!
//! Maps a [`QualitySelector`] onto the rendition table resolved for a
//! source. "Combined" means the rendition carries video and audio in a
//! single container; the policy prefers combined renditions and only falls
//! back to split streams when no combined rendition exists at all.

use crate::error::JobError;
use crate::types::{QualitySelector, Rendition};

/// Pick the rendition matching a quality selector
///
/// Rules:
/// - `Highest` / `Lowest` — greatest / smallest vertical resolution among
///   combined renditions, falling back to the overall best/worst rendition
///   when no combined rendition exists
/// - `MaxHeight(h)` — best combined rendition not exceeding `h`; when
///   nothing combined fits under `h`, falls back along the `Highest` chain
///   rather than erroring
/// - `Format(id)` — exact match on the format identifier, bypassing the
///   policy entirely
///
/// Returns [`JobError::NoSuitableStream`] when nothing matches. Selection
/// runs inside the worker (metadata is resolved asynchronously), so this
/// error surfaces via polling, never at dispatch time.
pub fn select_rendition<'a>(
    renditions: &'a [Rendition],
    selector: &QualitySelector,
) -> Result<&'a Rendition, JobError> {
    let no_match = || JobError::NoSuitableStream {
        selector: selector.to_string(),
    };

    match selector {
        QualitySelector::Format(id) => renditions
            .iter()
            .find(|r| r.format_id == *id)
            .ok_or_else(no_match),

        QualitySelector::Highest => best_combined(renditions)
            .or_else(|| extreme_by_height(renditions, Extreme::Max))
            .ok_or_else(no_match),

        QualitySelector::Lowest => worst_combined(renditions)
            .or_else(|| extreme_by_height(renditions, Extreme::Min))
            .ok_or_else(no_match),

        QualitySelector::MaxHeight(limit) => renditions
            .iter()
            .filter(|r| r.is_combined())
            .filter(|r| r.height.is_some_and(|h| h <= *limit))
            .max_by_key(|r| r.height)
            .or_else(|| best_combined(renditions))
            .or_else(|| extreme_by_height(renditions, Extreme::Max))
            .ok_or_else(no_match),
    }
}

enum Extreme {
    Max,
    Min,
}

fn best_combined(renditions: &[Rendition]) -> Option<&Rendition> {
    renditions
        .iter()
        .filter(|r| r.is_combined())
        .max_by_key(|r| r.height)
}

fn worst_combined(renditions: &[Rendition]) -> Option<&Rendition> {
    renditions
        .iter()
        .filter(|r| r.is_combined())
        .min_by_key(|r| r.height)
}

/// Overall best/worst rendition ignoring the combined-stream requirement,
/// used only when the table contains no combined rendition at all.
fn extreme_by_height(renditions: &[Rendition], extreme: Extreme) -> Option<&Rendition> {
    match extreme {
        Extreme::Max => renditions.iter().max_by_key(|r| r.height),
        Extreme::Min => renditions.iter().min_by_key(|r| r.height),
    }
}
