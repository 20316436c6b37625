use crate::config::MatchConfig;
use crate::counter;
use crate::metrics_defs::MATCH_RESULTS;
use crate::rules::{PreparedName, PreparedSku, Score, ScoringPolicy};
use crate::types::{CatalogEntry, MatchResult, QueryRecord};

/// A catalog entry with its title and SKUs normalized once per match run.
struct PreparedEntry<'a> {
    entry: &'a CatalogEntry,
    title: PreparedName,
    skus: Vec<PreparedSku>,
}

/// Reconciles query records against a fully fetched catalog.
///
/// Every query is scored against every entry independently. The entry with
/// the strictly highest score wins, ties go to the entry seen first, and the
/// same entry may be matched by any number of queries.
pub struct Matcher {
    policy: ScoringPolicy,
    brands: Vec<String>,
    min_score: u32,
}

impl Matcher {
    pub fn new(config: &MatchConfig) -> Self {
        Matcher::with_policy(ScoringPolicy::from_config(config), config)
    }

    pub fn with_policy(policy: ScoringPolicy, config: &MatchConfig) -> Self {
        Matcher {
            policy,
            brands: config.brand_prefixes.clone(),
            min_score: config.min_score,
        }
    }

    pub fn match_all(&self, catalog: &[CatalogEntry], queries: &[QueryRecord]) -> Vec<MatchResult> {
        let prepared: Vec<PreparedEntry> = catalog
            .iter()
            .map(|entry| PreparedEntry {
                entry,
                title: PreparedName::new(&entry.title, &self.brands),
                skus: entry
                    .variants
                    .iter()
                    .filter_map(|v| v.sku.as_deref().and_then(PreparedSku::new))
                    .collect(),
            })
            .collect();

        let results: Vec<MatchResult> = queries
            .iter()
            .map(|query| self.best_match(&prepared, query))
            .collect();

        let matched = results.iter().filter(|r| r.matched.is_some()).count();
        counter!(MATCH_RESULTS, "outcome" => "matched").increment(matched as u64);
        counter!(MATCH_RESULTS, "outcome" => "unmatched").increment((results.len() - matched) as u64);
        tracing::debug!(
            queries = results.len(),
            matched,
            catalog_size = catalog.len(),
            "Matched query records"
        );

        results
    }

    pub fn match_one(&self, catalog: &[CatalogEntry], query: &QueryRecord) -> MatchResult {
        self.match_all(catalog, std::slice::from_ref(query))
            .pop()
            .unwrap_or_else(|| MatchResult::unmatched(query.clone()))
    }

    fn best_match(&self, entries: &[PreparedEntry], query: &QueryRecord) -> MatchResult {
        let name = non_blank(query.name.as_deref()).map(|n| PreparedName::new(n, &self.brands));
        let sku = non_blank(query.sku.as_deref()).and_then(PreparedSku::new);

        if name.is_none() && sku.is_none() {
            return MatchResult::unmatched(query.clone());
        }

        let mut best: Option<(&PreparedEntry, Score)> = None;
        for candidate in entries {
            let score = self
                .policy
                .score(name.as_ref(), sku.as_ref(), &candidate.title, &candidate.skus);

            if score.points > best.as_ref().map_or(0, |(_, s)| s.points) {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((candidate, score)) if score.points >= self.min_score => MatchResult {
                query: query.clone(),
                matched: Some(candidate.entry.clone()),
                match_score: score.points,
                match_reasons: score.reasons,
                total_available: candidate.entry.total_available(),
            },
            _ => MatchResult::unmatched(query.clone()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
