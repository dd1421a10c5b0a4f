// src/partition.rs
//! Tier filters over the enriched batch. Pure and order-preserving.

use crate::pipeline::EnrichedPost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    All,
    Relevant,
    RatePresent,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::All, Tier::Relevant, Tier::RatePresent];

    /// File stem used for both output formats.
    pub fn file_stem(self) -> &'static str {
        match self {
            Tier::All => "posts",
            Tier::Relevant => "tariff_posts",
            Tier::RatePresent => "official_tariff_posts",
        }
    }

    pub fn admits(self, post: &EnrichedPost) -> bool {
        match self {
            Tier::All => true,
            Tier::Relevant => is_relevant(post),
            Tier::RatePresent => has_rate(post),
        }
    }
}

pub fn is_relevant(post: &EnrichedPost) -> bool {
    post.classification
        .analysis()
        .is_some_and(|a| a.tariffs_related)
}

pub fn has_rate(post: &EnrichedPost) -> bool {
    post.classification
        .analysis()
        .and_then(|a| a.tariff_rate.as_deref())
        .is_some_and(|r| !r.is_empty())
}

/// The three tiers, each borrowing from the same batch.
#[derive(Debug)]
pub struct Tiers<'a> {
    pub all: Vec<&'a EnrichedPost>,
    pub relevant: Vec<&'a EnrichedPost>,
    pub rate_present: Vec<&'a EnrichedPost>,
}

impl<'a> Tiers<'a> {
    pub fn get(&self, tier: Tier) -> &[&'a EnrichedPost] {
        match tier {
            Tier::All => &self.all,
            Tier::Relevant => &self.relevant,
            Tier::RatePresent => &self.rate_present,
        }
    }
}

pub fn filter_tier(posts: &[EnrichedPost], tier: Tier) -> Vec<&EnrichedPost> {
    posts.iter().filter(|p| tier.admits(p)).collect()
}

pub fn partition(posts: &[EnrichedPost]) -> Tiers<'_> {
    Tiers {
        all: filter_tier(posts, Tier::All),
        relevant: filter_tier(posts, Tier::Relevant),
        rate_present: filter_tier(posts, Tier::RatePresent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassificationResult, Stance, TariffAnalysis};
    use crate::source::RawPost;

    fn post(content: &str, c: ClassificationResult) -> EnrichedPost {
        EnrichedPost {
            post: RawPost {
                created_at: "2025-04-01T00:00:00Z".parse().unwrap(),
                content: content.into(),
                media: vec![],
            },
            classification: c,
        }
    }

    fn analysis(related: bool, rate: Option<&str>) -> ClassificationResult {
        ClassificationResult::Analysis(TariffAnalysis {
            tariffs_related: related,
            affected_country: None,
            affected_region: None,
            products: vec![],
            published_time: String::new(),
            tariff_rate: rate.map(str::to_string),
            classification: Stance::Unknown,
            media_analysis: None,
        })
    }

    fn batch() -> Vec<EnrichedPost> {
        vec![
            post("a", analysis(true, Some("25%"))),
            post("b", analysis(false, None)),
            post("c", ClassificationResult::error("boom")),
            post("d", analysis(true, Some(""))),
            post("e", analysis(false, Some("10%"))),
        ]
    }

    fn contents(v: &[&EnrichedPost]) -> Vec<String> {
        v.iter().map(|p| p.post.content.clone()).collect()
    }

    #[test]
    fn tiers_follow_predicates_in_order() {
        let b = batch();
        let t = partition(&b);
        assert_eq!(contents(&t.all), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(contents(&t.relevant), vec!["a", "d"]);
        assert_eq!(contents(&t.rate_present), vec!["a", "e"]);
    }

    #[test]
    fn refiltering_a_tier_is_idempotent() {
        let b = batch();
        let t = partition(&b);
        for tier in Tier::ALL {
            let again: Vec<&EnrichedPost> =
                t.get(tier).iter().copied().filter(|p| tier.admits(p)).collect();
            assert_eq!(again, t.get(tier).to_vec());
        }
    }

    #[test]
    fn error_results_only_land_in_all() {
        let b = vec![post("x", ClassificationResult::error("e"))];
        let t = partition(&b);
        assert_eq!(t.all.len(), 1);
        assert!(t.relevant.is_empty());
        assert!(t.rate_present.is_empty());
    }
}
