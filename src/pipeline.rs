use anyhow::{Result, bail};
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::playlist::{self, ChannelEntry, ParsedPlaylist};
use crate::policy::{FilterRules, PolicyFilter, Rejection};
use crate::quality::{Classification, Classifier, QualityTier};

#[derive(Debug, Clone)]
pub struct Options {
    /// Entries kept per canonical identity (1 = single best).
    pub keep_count: usize,
    /// Keep names with no recognizable quality token at the lowest rank
    /// instead of dropping them before grouping.
    pub keep_unclassified: bool,
    /// Byte budget for the serialized output, header included.
    pub max_output_bytes: usize,
    pub rules: FilterRules,
}

#[derive(Debug)]
pub struct Reduction {
    pub output: String,
    pub summary: Summary,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub parsed: usize,
    pub malformed: usize,
    pub rejected_category: usize,
    pub rejected_name: usize,
    pub rejected_address: usize,
    pub unclassified_dropped: usize,
    pub groups: usize,
    pub kept_after_dedup: usize,
    pub cut_by_budget: usize,
    pub emitted: usize,
    pub output_bytes: usize,
    pub tiers: TierCounts,
}

/// Emitted entries broken down by quality tier.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub uhd: usize,
    pub fhd: usize,
    pub hd: usize,
    pub sd: usize,
    pub unknown: usize,
}

impl TierCounts {
    fn record(&mut self, tier: QualityTier) {
        match tier {
            QualityTier::Uhd => self.uhd += 1,
            QualityTier::FullHd => self.fhd += 1,
            QualityTier::Hd => self.hd += 1,
            QualityTier::Sd => self.sd += 1,
            QualityTier::Unknown => self.unknown += 1,
        }
    }
}

struct Classified {
    entry: ChannelEntry,
    class: Classification,
    /// Position in the source document, the final tie-break.
    index: usize,
}

/// Runs the whole pipeline: parse → filter → classify → dedup → budget →
/// serialize. Pure with respect to its inputs; the summary records every
/// drop decision.
pub fn reduce(input: &str, options: &Options) -> Result<Reduction> {
    if options.keep_count == 0 {
        bail!("keep count must be at least 1");
    }
    if options.max_output_bytes < playlist::header_len() {
        bail!(
            "byte budget of {} cannot fit the {}-byte playlist header",
            options.max_output_bytes,
            playlist::header_len()
        );
    }
    let filter = PolicyFilter::compile(&options.rules)?;

    let ParsedPlaylist { entries, dropped } = playlist::parse(input);
    let mut summary = Summary {
        parsed: entries.len(),
        malformed: dropped,
        ..Summary::default()
    };

    let classifier = Classifier::new();
    let mut survivors: Vec<Classified> = Vec::new();

    for (index, entry) in entries.into_iter().enumerate() {
        match filter.evaluate(&entry.display_name, entry.category.as_deref(), &entry.address) {
            Some(Rejection::Category) => summary.rejected_category += 1,
            Some(Rejection::Name) => summary.rejected_name += 1,
            Some(Rejection::Address) => summary.rejected_address += 1,
            None => {
                let class = classifier.classify(&entry.display_name);
                if !options.keep_unclassified && class.tier == QualityTier::Unknown {
                    summary.unclassified_dropped += 1;
                    continue;
                }
                survivors.push(Classified { entry, class, index });
            }
        }
    }

    let mut groups: HashMap<String, Vec<Classified>> = HashMap::new();
    for item in survivors {
        groups.entry(item.class.identity.clone()).or_default().push(item);
    }
    summary.groups = groups.len();

    let mut kept: Vec<Classified> = Vec::new();
    for (identity, mut members) in groups {
        members.sort_by(rank_order);
        let total = members.len();
        members.truncate(options.keep_count);
        debug!("{identity}: {total} -> {} entries", members.len());
        kept.extend(members);
    }

    // Group iteration order is hash-dependent; this sort restores full
    // determinism and is also the admission order for the byte budget.
    kept.sort_by(rank_order);
    summary.kept_after_dedup = kept.len();

    let mut admitted: Vec<Classified> = Vec::new();
    let mut size = playlist::header_len();
    for item in kept {
        let cost = playlist::entry_len(&item.entry);
        if size + cost > options.max_output_bytes {
            // Contiguous prefix cutoff: the first overflow halts admission,
            // later entries are not reconsidered.
            break;
        }
        size += cost;
        admitted.push(item);
    }

    summary.cut_by_budget = summary.kept_after_dedup - admitted.len();
    summary.emitted = admitted.len();
    for item in &admitted {
        summary.tiers.record(item.class.tier);
    }

    let entries: Vec<ChannelEntry> = admitted.into_iter().map(|c| c.entry).collect();
    let output = playlist::render(&entries);
    summary.output_bytes = output.len();

    Ok(Reduction { output, summary })
}

/// Tier descending, estimated pixels descending, source order ascending.
fn rank_order(a: &Classified, b: &Classified) -> Ordering {
    b.class
        .tier
        .cmp(&a.class.tier)
        .then(b.class.pixels.cmp(&a.class.pixels))
        .then(a.index.cmp(&b.index))
}

#[cfg(test)]
mod tests {
    mod reduce;
}
