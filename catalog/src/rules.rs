//! Scoring rules applied to a (query, catalog entry) pair.
//!
//! Rules are grouped into two stages that are summed:
//!
//! 1. **Name**: the first name rule that fires wins.
//! 2. **SKU**: for each variant in catalog order, the first SKU rule that
//!    fires wins, and only the first variant with any hit contributes.
//!
//! Every hit carries the points it adds and a human readable reason, so a
//! final score is always the sum of the points behind its reasons.

use crate::config::MatchConfig;
use crate::normalize::{core_name, normalize_name, normalize_sku, strip_sku};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleHit {
    pub points: u32,
    pub reason: String,
}

/// A name in the forms the name rules compare.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedName {
    pub normalized: String,
    pub core: String,
}

impl PreparedName {
    pub fn new<S: AsRef<str>>(raw: &str, brands: &[S]) -> Self {
        PreparedName {
            normalized: normalize_name(raw),
            core: core_name(raw, brands),
        }
    }
}

/// A SKU in the forms the SKU rules compare.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedSku {
    pub upper: String,
    pub stripped: String,
}

impl PreparedSku {
    pub fn new(raw: &str) -> Option<Self> {
        let upper = normalize_sku(raw);
        if upper.is_empty() {
            return None;
        }
        let stripped = strip_sku(&upper);
        Some(PreparedSku { upper, stripped })
    }
}

pub trait NameRule: Send + Sync {
    fn apply(&self, query: &PreparedName, title: &PreparedName) -> Option<RuleHit>;
}

pub trait SkuRule: Send + Sync {
    fn apply(&self, query: &PreparedSku, variant: &PreparedSku) -> Option<RuleHit>;
}

pub struct ExactTitle {
    pub points: u32,
}

impl NameRule for ExactTitle {
    fn apply(&self, query: &PreparedName, title: &PreparedName) -> Option<RuleHit> {
        (!query.normalized.is_empty() && query.normalized == title.normalized).then(|| RuleHit {
            points: self.points,
            reason: "exact title match".into(),
        })
    }
}

pub struct CoreName {
    pub points: u32,
}

impl NameRule for CoreName {
    fn apply(&self, query: &PreparedName, title: &PreparedName) -> Option<RuleHit> {
        (!query.core.is_empty() && query.core == title.core).then(|| RuleHit {
            points: self.points,
            reason: format!("core name match ({})", title.core),
        })
    }
}

pub struct TitleContains {
    pub points: u32,
}

impl NameRule for TitleContains {
    fn apply(&self, query: &PreparedName, title: &PreparedName) -> Option<RuleHit> {
        let (q, t) = (&query.normalized, &title.normalized);
        if q.is_empty() || t.is_empty() {
            return None;
        }

        (t.contains(q.as_str()) || q.contains(t.as_str())).then(|| RuleHit {
            points: self.points,
            reason: "partial title match".into(),
        })
    }
}

pub struct ExactSku {
    pub points: u32,
}

impl SkuRule for ExactSku {
    fn apply(&self, query: &PreparedSku, variant: &PreparedSku) -> Option<RuleHit> {
        (query.upper == variant.upper).then(|| RuleHit {
            points: self.points,
            reason: format!("exact SKU match ({})", variant.upper),
        })
    }
}

pub struct StrippedSku {
    pub points: u32,
}

impl SkuRule for StrippedSku {
    fn apply(&self, query: &PreparedSku, variant: &PreparedSku) -> Option<RuleHit> {
        (!query.stripped.is_empty() && query.stripped == variant.stripped).then(|| RuleHit {
            points: self.points,
            reason: format!("normalized SKU match ({})", variant.upper),
        })
    }
}

pub struct SkuPrefix {
    pub points: u32,
}

impl SkuRule for SkuPrefix {
    fn apply(&self, query: &PreparedSku, variant: &PreparedSku) -> Option<RuleHit> {
        let (q, v) = (&query.stripped, &variant.stripped);
        if q.is_empty() || v.is_empty() {
            return None;
        }

        (v.starts_with(q.as_str()) || q.starts_with(v.as_str())).then(|| RuleHit {
            points: self.points,
            reason: format!("SKU prefix match ({})", variant.upper),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub points: u32,
    pub reasons: Vec<String>,
}

impl Score {
    fn add(&mut self, hit: RuleHit) {
        self.points = self.points.saturating_add(hit.points);
        self.reasons.push(hit.reason);
    }
}

/// The ordered rule list used by the matcher.
pub struct ScoringPolicy {
    name_rules: Vec<Box<dyn NameRule>>,
    sku_rules: Vec<Box<dyn SkuRule>>,
}

impl ScoringPolicy {
    pub fn new(name_rules: Vec<Box<dyn NameRule>>, sku_rules: Vec<Box<dyn SkuRule>>) -> Self {
        ScoringPolicy {
            name_rules,
            sku_rules,
        }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        let w = &config.weights;
        ScoringPolicy::new(
            vec![
                Box::new(ExactTitle {
                    points: w.exact_title,
                }),
                Box::new(CoreName {
                    points: w.core_name,
                }),
                Box::new(TitleContains {
                    points: w.partial_title,
                }),
            ],
            vec![
                Box::new(ExactSku { points: w.exact_sku }),
                Box::new(StrippedSku {
                    points: w.normalized_sku,
                }),
                Box::new(SkuPrefix {
                    points: w.sku_prefix,
                }),
            ],
        )
    }

    pub fn score<'a, I>(
        &self,
        query_name: Option<&PreparedName>,
        query_sku: Option<&PreparedSku>,
        title: &PreparedName,
        variant_skus: I,
    ) -> Score
    where
        I: IntoIterator<Item = &'a PreparedSku>,
    {
        let mut score = Score::default();

        if let Some(name) = query_name
            && let Some(hit) = self.name_rules.iter().find_map(|r| r.apply(name, title))
        {
            score.add(hit);
        }

        if let Some(sku) = query_sku {
            let hit = variant_skus
                .into_iter()
                .find_map(|variant| self.sku_rules.iter().find_map(|r| r.apply(sku, variant)));
            if let Some(hit) = hit {
                score.add(hit);
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRANDS: &[&str] = &["LOFT"];

    fn name(raw: &str) -> PreparedName {
        PreparedName::new(raw, BRANDS)
    }

    fn sku(raw: &str) -> PreparedSku {
        PreparedSku::new(raw).unwrap()
    }

    fn no_skus() -> std::iter::Empty<&'static PreparedSku> {
        std::iter::empty()
    }

    fn policy() -> ScoringPolicy {
        ScoringPolicy::from_config(&MatchConfig::default())
    }

    #[test]
    fn test_name_tiers_first_hit_wins() {
        let policy = policy();

        // Exact also satisfies the core and substring rules, only exact counts
        let exact = policy.score(Some(&name("Aurora Dress")), None, &name("aurora  dress"), no_skus());
        assert_eq!(exact.points, 100);
        assert_eq!(exact.reasons, vec!["exact title match"]);

        let core = policy.score(
            Some(&name("Aurora Dress")),
            None,
            &name("LOFT.73 - Aurora Dress"),
            no_skus(),
        );
        assert_eq!(core.points, 70);
        assert_eq!(core.reasons, vec!["core name match (aurora dress)"]);

        let partial = policy.score(Some(&name("Aurora")), None, &name("Aurora Dress"), no_skus());
        assert_eq!(partial.points, 40);
        assert_eq!(partial.reasons, vec!["partial title match"]);

        // Containment works in both directions
        let reverse = policy.score(Some(&name("Aurora Dress Blue")), None, &name("Aurora Dress"), no_skus());
        assert_eq!(reverse.points, 40);

        let none = policy.score(Some(&name("Borealis")), None, &name("Aurora Dress"), no_skus());
        assert_eq!(none, Score::default());
    }

    #[test]
    fn test_sku_tiers() {
        let policy = policy();
        let title = name("Unrelated");

        let exact = policy.score(None, Some(&sku("abc-123")), &title, [&sku("ABC-123")]);
        assert_eq!(exact.points, 100);
        assert_eq!(exact.reasons, vec!["exact SKU match (ABC-123)"]);

        let stripped = policy.score(None, Some(&sku("AB-12")), &title, [&sku("AB12")]);
        assert_eq!(stripped.points, 80);
        assert_eq!(stripped.reasons, vec!["normalized SKU match (AB12)"]);

        let prefix = policy.score(None, Some(&sku("AB-12")), &title, [&sku("AB12-XL")]);
        assert_eq!(prefix.points, 50);
        assert_eq!(prefix.reasons, vec!["SKU prefix match (AB12-XL)"]);

        let none = policy.score(None, Some(&sku("ZZ-1")), &title, [&sku("AB12")]);
        assert_eq!(none.points, 0);
    }

    #[test]
    fn test_first_qualifying_variant_contributes() {
        let policy = policy();
        let variants = [sku("AB12-XL"), sku("AB-12"), sku("AB12")];

        // The first variant only reaches the prefix tier, later exact hits are not considered
        let score = policy.score(None, Some(&sku("AB-12")), &name("x"), &variants);
        assert_eq!(score.points, 50);
        assert_eq!(score.reasons.len(), 1);
    }

    #[test]
    fn test_name_and_sku_are_additive() {
        let policy = policy();
        let score = policy.score(
            Some(&name("Aurora Dress")),
            Some(&sku("AUR001")),
            &name("LOFT.73 - Aurora Dress"),
            [&sku("AUR-001")],
        );
        assert_eq!(score.points, 150);
        assert_eq!(
            score.reasons,
            vec![
                "core name match (aurora dress)".to_string(),
                "normalized SKU match (AUR-001)".to_string(),
            ]
        );
    }

    #[test]
    fn test_blank_sku_is_not_prepared() {
        assert_eq!(PreparedSku::new("   "), None);
    }

    #[test]
    fn test_custom_rule_list() {
        // Only SKU rules configured: names are ignored entirely
        let policy = ScoringPolicy::new(vec![], vec![Box::new(ExactSku { points: 7 })]);
        let score = policy.score(
            Some(&name("Aurora")),
            Some(&sku("A1")),
            &name("Aurora"),
            [&sku("a1")],
        );
        assert_eq!(score.points, 7);
    }

    #[test]
    fn test_score_saturates() {
        let policy = ScoringPolicy::new(
            vec![Box::new(ExactTitle { points: u32::MAX })],
            vec![Box::new(ExactSku { points: u32::MAX })],
        );
        let score = policy.score(
            Some(&name("Aurora Dress")),
            Some(&sku("AUR-1")),
            &name("Aurora Dress"),
            [&sku("AUR-1")],
        );

        assert_eq!(score.points, u32::MAX);
        assert_eq!(score.reasons.len(), 2);
    }
}
