//! Random page selection, candidate filtering and bounded sampling.
//!
//! Each cycle fetches one uniformly chosen page per (instance, kind) instead
//! of scanning the whole wanted list, so coverage of a large catalog builds
//! up statistically over many cycles.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use crate::arr::{CandidateItem, MAX_PAGE_SIZE};

/// Paging of a wanted list with a known total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub total: u64,
    /// `min(100, total)`.
    pub page_size: u32,
    /// `ceil(total / page_size)`, at least 1.
    pub total_pages: u32,
}

impl PagePlan {
    /// Plan pages for `total` records; `None` when there is nothing to fetch.
    pub fn for_total(total: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }

        let page_size = total.min(MAX_PAGE_SIZE as u64);
        let total_pages = total.div_ceil(page_size).clamp(1, u32::MAX as u64);

        Some(Self {
            total,
            page_size: page_size as u32,
            total_pages: total_pages as u32,
        })
    }
}

/// Uniformly pick a 1-based page index in `1..=plan.total_pages`.
pub fn choose_page<R: Rng + ?Sized>(plan: &PagePlan, rng: &mut R) -> u32 {
    rng.random_range(1..=plan.total_pages)
}

/// Uniform sample without replacement of `min(limit, candidates.len())` items.
pub fn choose<R: Rng + ?Sized>(
    candidates: Vec<CandidateItem>,
    limit: usize,
    rng: &mut R,
) -> Vec<CandidateItem> {
    let amount = limit.min(candidates.len());
    if amount == 0 {
        return Vec::new();
    }

    let picked = index::sample(rng, candidates.len(), amount);
    let mut slots: Vec<Option<CandidateItem>> = candidates.into_iter().map(Some).collect();
    picked
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

/// Drop items that are unmonitored themselves or belong to an unmonitored series.
pub fn filter_monitored(items: Vec<CandidateItem>) -> Vec<CandidateItem> {
    items.into_iter().filter(|i| i.is_monitored()).collect()
}

/// Drop items dated strictly after `now`. Undated items are kept.
pub fn filter_released(items: Vec<CandidateItem>, now: DateTime<Utc>) -> Vec<CandidateItem> {
    items.into_iter().filter(|i| !i.is_future(now)).collect()
}

/// Drop items the ledger reports as recently searched.
pub fn filter_unsearched<F>(items: Vec<CandidateItem>, mut is_recent: F) -> Vec<CandidateItem>
where
    F: FnMut(&CandidateItem) -> bool,
{
    items.into_iter().filter(|i| !is_recent(i)).collect()
}

/// Random source for page and item selection.
pub struct Sampler {
    rng: StdRng,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    /// Sampler seeded from the operating system, so runs differ.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic sampler (useful for testing).
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn choose_page(&mut self, plan: &PagePlan) -> u32 {
        choose_page(plan, &mut self.rng)
    }

    pub fn choose(&mut self, candidates: Vec<CandidateItem>, limit: usize) -> Vec<CandidateItem> {
        choose(candidates, limit, &mut self.rng)
    }
}
