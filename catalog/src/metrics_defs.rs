//! Metrics definitions for the catalog fetcher and matcher.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

#[macro_export]
macro_rules! counter {
    ($def:expr $(, $($labels:tt)*)?) => {
        metrics::counter!($def.name $(, $($labels)*)?)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr $(, $($labels:tt)*)?) => {
        metrics::histogram!($def.name $(, $($labels)*)?)
    };
}

pub const FETCH_PAGES: MetricDef = MetricDef {
    name: "catalog.fetch.pages",
    metric_type: MetricType::Counter,
    description: "Number of catalog pages requested from the remote",
};

pub const FETCH_DURATION: MetricDef = MetricDef {
    name: "catalog.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Time to fetch the full catalog in seconds. Tagged with outcome.",
};

pub const FETCH_ENTRIES: MetricDef = MetricDef {
    name: "catalog.fetch.entries",
    metric_type: MetricType::Histogram,
    description: "Number of catalog entries returned by a full fetch",
};

pub const CACHE_HIT: MetricDef = MetricDef {
    name: "catalog.cache.hit",
    metric_type: MetricType::Counter,
    description: "Number of requests served from the cached catalog",
};

pub const CACHE_MISS: MetricDef = MetricDef {
    name: "catalog.cache.miss",
    metric_type: MetricType::Counter,
    description: "Number of requests that had to fetch the catalog",
};

pub const MATCH_RESULTS: MetricDef = MetricDef {
    name: "matcher.results",
    metric_type: MetricType::Counter,
    description: "Number of query records matched. Tagged with outcome.",
};

pub const INVENTORY_LOOKUP_FAILED: MetricDef = MetricDef {
    name: "inventory.lookup.failed",
    metric_type: MetricType::Counter,
    description: "Number of live inventory lookups that fell back to last known quantities",
};

pub const ALL_METRICS: &[MetricDef] = &[
    FETCH_PAGES,
    FETCH_DURATION,
    FETCH_ENTRIES,
    CACHE_HIT,
    CACHE_MISS,
    MATCH_RESULTS,
    INVENTORY_LOOKUP_FAILED,
];

/// Registers descriptions for every metric with the installed recorder.
pub fn describe_all() {
    for def in ALL_METRICS {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}
