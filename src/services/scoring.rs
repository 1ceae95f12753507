/// Similarity scoring and the two-tier filter pipeline
///
/// Everything here is pure: no I/O, no clocks. Scores are in `[0, 100]` and
/// symmetric in their two arguments.
use std::collections::HashSet;

use crate::models::{Candidate, CatalogShow, ExternalId, ScoredShow};

pub const GENRE_WEIGHT: f64 = 0.35;
pub const KEYWORD_WEIGHT: f64 = 0.25;
pub const DEMOGRAPHIC_WEIGHT: f64 = 0.15;
pub const ERA_WEIGHT: f64 = 0.10;
pub const RATING_WEIGHT: f64 = 0.15;

pub const DEFAULT_MIN_SCORE: f64 = 40.0;
/// Looser threshold for "because you watched" lists
pub const BECAUSE_YOU_WATCHED_MIN_SCORE: f64 = 15.0;

/// Fewer strict survivors than this triggers the relaxed pass
pub const RELAXED_TRIGGER: usize = 20;

const NEUTRAL: f64 = 50.0;

const STREAMING_NETWORKS: [&str; 7] = [
    "Netflix",
    "Hulu",
    "Prime Video",
    "Apple TV+",
    "Disney+",
    "HBO Max",
    "Paramount+",
];

const ENGLISH_SPEAKING_COUNTRIES: [&str; 4] = ["us", "gb", "ca", "au"];

const ANIMATED_GENRES: [&str; 2] = ["animation", "anime"];

// ============================================================================
// Scoring
// ============================================================================

/// Weighted similarity of two shows, rounded to two decimals
pub fn score_show_similarity(seed: &Candidate, candidate: &Candidate) -> f64 {
    let total = GENRE_WEIGHT * genre_score(&seed.show.genres, &candidate.show.genres)
        + KEYWORD_WEIGHT * keyword_score(seed.keywords(), candidate.keywords())
        + DEMOGRAPHIC_WEIGHT * demographic_score(&seed.show, &candidate.show)
        + ERA_WEIGHT * era_score(seed.show.year, candidate.show.year)
        + RATING_WEIGHT * rating_score(seed.show.rating, candidate.show.rating);

    (total * 100.0).round() / 100.0
}

pub fn genre_score(a: &[String], b: &[String]) -> f64 {
    jaccard(a, b)
}

pub fn keyword_score(a: &[String], b: &[String]) -> f64 {
    jaccard(a, b)
}

/// Case-insensitive Jaccard index scaled to 100; 0 when either side is empty
fn jaccard(a: &[String], b: &[String]) -> f64 {
    let a = lowercase_set(a);
    let b = lowercase_set(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let shared = a.intersection(&b).count();
    let union = a.union(&b).count();

    shared as f64 / union as f64 * 100.0
}

fn lowercase_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.trim().to_lowercase()).collect()
}

/// Average of network and country agreement, each counted only when both
/// sides carry it
pub fn demographic_score(a: &CatalogShow, b: &CatalogShow) -> f64 {
    let mut total = 0.0;
    let mut factors = 0;

    if let (Some(x), Some(y)) = (a.network.as_deref(), b.network.as_deref()) {
        factors += 1;
        if x.eq_ignore_ascii_case(y) {
            total += 100.0;
        } else if is_streaming_network(x) && is_streaming_network(y) {
            total += 50.0;
        }
    }

    if let (Some(x), Some(y)) = (a.country.as_deref(), b.country.as_deref()) {
        factors += 1;
        if x.eq_ignore_ascii_case(y) {
            total += 100.0;
        }
    }

    if factors == 0 {
        NEUTRAL
    } else {
        total / factors as f64
    }
}

fn is_streaming_network(network: &str) -> bool {
    STREAMING_NETWORKS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(network.trim()))
}

pub fn era_score(a: Option<i32>, b: Option<i32>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return NEUTRAL;
    };

    match (a - b).abs() {
        0 => 100.0,
        1..=2 => 90.0,
        3..=5 => 75.0,
        6..=10 => 50.0,
        11..=20 => 25.0,
        _ => 10.0,
    }
}

/// A rating of 0 is how the catalog marks an unrated show
pub fn rating_score(a: Option<f64>, b: Option<f64>) -> f64 {
    let known = |r: Option<f64>| r.filter(|r| *r > 0.0);
    let (Some(a), Some(b)) = (known(a), known(b)) else {
        return NEUTRAL;
    };

    let diff = (a - b).abs();
    if diff <= 0.5 {
        100.0
    } else if diff <= 1.0 {
        85.0
    } else if diff <= 1.5 {
        65.0
    } else if diff <= 2.0 {
        40.0
    } else {
        20.0
    }
}

/// Scores every candidate against the seed, drops those under `min_score`
/// and sorts the rest by score, highest first. Ties keep input order.
pub fn rank_candidates(seed: &Candidate, candidates: Vec<Candidate>, min_score: f64) -> Vec<ScoredShow> {
    let considered = candidates.len();

    let mut ranked: Vec<ScoredShow> = candidates
        .into_iter()
        .map(|candidate| {
            let score = score_show_similarity(seed, &candidate);
            ScoredShow {
                show: candidate.show,
                enrichment: candidate.enrichment,
                score,
            }
        })
        .filter(|scored| scored.score >= min_score)
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    if ranked.is_empty() && considered > 0 {
        tracing::debug!(
            seed = %seed.show.title,
            considered = considered,
            min_score = min_score,
            "No candidate reached the minimum score"
        );
    }

    ranked
}

// ============================================================================
// Filters
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Thresholds {
    rating_floor: f64,
    max_year_gap: i32,
    strict_genres: bool,
}

const STRICT: Thresholds = Thresholds {
    rating_floor: 6.5,
    max_year_gap: 5,
    strict_genres: true,
};

const RELAXED: Thresholds = Thresholds {
    rating_floor: 5.5,
    max_year_gap: 15,
    strict_genres: false,
};

/// Strict pass over the pool
///
/// Rejects animation/anime mismatches with the seed, non-English languages,
/// countries outside the English-speaking set, known ratings under 6.5, years
/// more than 5 apart, and candidates without a genre overlap signal: they must
/// carry the seed's primary genre, and share at least two genres with a
/// multi-genre seed.
pub fn apply_hard_filters(seed: &CatalogShow, candidates: &[CatalogShow]) -> Vec<CatalogShow> {
    candidates
        .iter()
        .filter(|c| passes(seed, c, STRICT))
        .cloned()
        .collect()
}

/// Extra survivors from the rejected part of the pool
///
/// Keeps the categorical rules of the strict pass but needs only one shared
/// genre, allows 15 years and a 5.5 rating floor, and lets missing genres
/// through. Anything in `already_accepted` and the seed itself are excluded.
pub fn apply_relaxed_filters(
    seed: &CatalogShow,
    candidates: &[CatalogShow],
    already_accepted: &[CatalogShow],
) -> Vec<CatalogShow> {
    let mut excluded: HashSet<ExternalId> =
        already_accepted.iter().map(CatalogShow::external_id).collect();
    excluded.insert(seed.external_id());

    candidates
        .iter()
        .filter(|c| !excluded.contains(&c.external_id()))
        .filter(|c| passes(seed, c, RELAXED))
        .cloned()
        .collect()
}

/// Strict survivors, topped up by the relaxed pass when there are too few
pub fn filter_pool(seed: &CatalogShow, pool: &[CatalogShow]) -> Vec<CatalogShow> {
    let mut survivors = apply_hard_filters(seed, pool);

    if survivors.len() < RELAXED_TRIGGER {
        let extras = apply_relaxed_filters(seed, pool, &survivors);
        tracing::info!(
            external_id = seed.external_id(),
            strict = survivors.len(),
            relaxed = extras.len(),
            "Too few strict survivors, relaxed filters applied"
        );
        survivors.extend(extras);
    }

    survivors
}

fn passes(seed: &CatalogShow, candidate: &CatalogShow, t: Thresholds) -> bool {
    if is_animated(seed) != is_animated(candidate) {
        return false;
    }

    if let Some(language) = candidate.language.as_deref() {
        if !language.eq_ignore_ascii_case("en") {
            return false;
        }
    }

    if let Some(country) = candidate.country.as_deref() {
        let country = country.to_lowercase();
        if !ENGLISH_SPEAKING_COUNTRIES.contains(&country.as_str()) {
            return false;
        }
    }

    if let Some(rating) = candidate.rating.filter(|r| *r > 0.0) {
        if rating < t.rating_floor {
            return false;
        }
    }

    if !seed.genres.is_empty() && !genres_pass(seed, candidate, t) {
        return false;
    }

    if let (Some(a), Some(b)) = (seed.year, candidate.year) {
        if (a - b).abs() > t.max_year_gap {
            return false;
        }
    }

    true
}

fn genres_pass(seed: &CatalogShow, candidate: &CatalogShow, t: Thresholds) -> bool {
    if candidate.genres.is_empty() {
        return !t.strict_genres;
    }

    let seed_genres = lowercase_set(&seed.genres);
    let candidate_genres = lowercase_set(&candidate.genres);
    let shared = seed_genres.intersection(&candidate_genres).count();

    if !t.strict_genres {
        return shared >= 1;
    }

    let primary_match = seed
        .primary_genre()
        .is_some_and(|g| candidate_genres.contains(&g.trim().to_lowercase()));

    primary_match && (seed_genres.len() < 2 || shared >= 2)
}

fn is_animated(show: &CatalogShow) -> bool {
    show.genres
        .iter()
        .any(|g| ANIMATED_GENRES.contains(&g.trim().to_lowercase().as_str()))
}
