use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::market_values::PlayerValueCatalogue;
use crate::normalize::{normalize_name, tokens};

/// Token-overlap winners scoring below this are discarded and the whole
/// scope is re-scored by character similarity.
pub const TOKEN_GATE: f64 = 0.6;
/// Final acceptance floor for whichever metric produced the winner.
pub const ACCEPT_FLOOR: f64 = 0.55;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Ratcliff/Obershelp ratio, `2 * matched / (len_a + len_b)`.
    #[default]
    Gestalt,
    Levenshtein,
}

impl SimilarityMetric {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gestalt" | "ratcliff" | "sequence" => Some(Self::Gestalt),
            "levenshtein" | "edit" => Some(Self::Levenshtein),
            _ => None,
        }
    }

    pub fn score(self, a: &str, b: &str) -> f64 {
        match self {
            Self::Gestalt => gestalt_ratio(a, b),
            Self::Levenshtein => strsim::normalized_levenshtein(a, b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub token_gate: f64,
    pub accept_floor: f64,
    pub similarity: SimilarityMetric,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            token_gate: TOKEN_GATE,
            accept_floor: ACCEPT_FLOOR,
            similarity: SimilarityMetric::Gestalt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPass {
    Exact,
    TokenOverlap,
    CharSimilarity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Unresolved {
    EmptyName,
    EmptyScope,
    /// Best candidate of the deciding pass scored under the floor.
    BelowFloor { pass: MatchPass, best_score: f64 },
}

/// Outcome of one lookup. `value()` keeps the zero convention for callers
/// that only want a number; the variants keep "not found" distinguishable
/// from a player actually valued at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Matched {
        entry: usize,
        pass: MatchPass,
        score: f64,
        value: f64,
    },
    NotFound(Unresolved),
}

impl Resolution {
    pub fn value(&self) -> f64 {
        match self {
            Resolution::Matched { value, .. } => *value,
            Resolution::NotFound(_) => 0.0,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Matched { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IdentityResolver<'a> {
    catalogue: &'a PlayerValueCatalogue,
    config: ResolverConfig,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(catalogue: &'a PlayerValueCatalogue, config: ResolverConfig) -> Self {
        Self { catalogue, config }
    }

    /// Resolves `raw_name` inside the (season, team) scope. `team_norm` must
    /// be normalized with [`normalize_name`].
    ///
    /// Precedence: exact normalized match, then token overlap, then (only if
    /// the token winner is under the gate) character similarity over the
    /// whole scope. Ties go to the earliest catalogue row.
    pub fn resolve(&self, raw_name: &str, season: &str, team_norm: &str) -> Resolution {
        let query = normalize_name(raw_name);
        if query.is_empty() {
            return Resolution::NotFound(Unresolved::EmptyName);
        }

        let scope = self.catalogue.scope(season, team_norm);
        if scope.is_empty() {
            return Resolution::NotFound(Unresolved::EmptyScope);
        }
        let entries = self.catalogue.entries();

        if let Some(&idx) = scope.iter().find(|&&idx| entries[idx].name_norm == query) {
            return Resolution::Matched {
                entry: idx,
                pass: MatchPass::Exact,
                score: 1.0,
                value: entries[idx].market_value,
            };
        }

        let query_tokens: HashSet<&str> = tokens(&query).collect();
        let (mut best_idx, mut best_score) = first_max(scope, |idx| {
            token_overlap_score(&query_tokens, &entries[idx].name_norm)
        });
        let mut pass = MatchPass::TokenOverlap;

        if best_score < self.config.token_gate {
            let metric = self.config.similarity;
            (best_idx, best_score) =
                first_max(scope, |idx| metric.score(&query, &entries[idx].name_norm));
            pass = MatchPass::CharSimilarity;
        }

        if best_score >= self.config.accept_floor {
            Resolution::Matched {
                entry: best_idx,
                pass,
                score: best_score,
                value: entries[best_idx].market_value,
            }
        } else {
            Resolution::NotFound(Unresolved::BelowFloor {
                pass,
                best_score,
            })
        }
    }
}

pub fn resolve(
    raw_name: &str,
    season: &str,
    team_norm: &str,
    catalogue: &PlayerValueCatalogue,
) -> f64 {
    IdentityResolver::new(catalogue, ResolverConfig::default())
        .resolve(raw_name, season, team_norm)
        .value()
}

/// Share of the query's distinct tokens found in the candidate. Relative to
/// the query only; extra candidate tokens cost nothing.
pub fn token_overlap_score(query_tokens: &HashSet<&str>, candidate_norm: &str) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let candidate: HashSet<&str> = tokens(candidate_norm).collect();
    let shared = query_tokens.iter().filter(|t| candidate.contains(*t)).count();
    shared as f64 / query_tokens.len() as f64
}

/// Ratcliff/Obershelp similarity: find the longest common block, recurse on
/// both sides of it, and score `2 * matched / total_len`. Two empty strings
/// are identical.
pub fn gestalt_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matched_chars(&a, &b);
    2.0 * matched as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0usize;
    let mut queue = vec![(0usize, a.len(), 0usize, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_common_block(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest block with `a[i..i+k] == b[j..j+k]` inside the given ranges.
/// Among equally long blocks the one starting earliest in `a`, then in `b`,
/// wins.
fn longest_common_block(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0usize);
    let width = bhi - blo;
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];
    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            if a[i] == b[j] {
                let k = prev[slot - 1] + 1;
                cur[slot] = k;
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            } else {
                cur[slot] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    (best_i, best_j, best_k)
}

fn first_max(scope: &[usize], mut score: impl FnMut(usize) -> f64) -> (usize, f64) {
    let mut best_idx = scope[0];
    let mut best_score = score(best_idx);
    for &idx in &scope[1..] {
        let s = score(idx);
        if s > best_score {
            best_idx = idx;
            best_score = s;
        }
    }
    (best_idx, best_score)
}
