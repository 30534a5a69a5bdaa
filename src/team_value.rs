use serde::Serialize;
use tracing::debug;

use crate::identity::IdentityResolver;

/// Summed market value of one side's lineup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamValue {
    pub total: f64,
    pub resolved: usize,
    pub seen: usize,
}

impl TeamValue {
    /// Share of lineup names that resolved; `None` for an empty lineup.
    pub fn coverage(&self) -> Option<f64> {
        if self.seen == 0 {
            None
        } else {
            Some(self.resolved as f64 / self.seen as f64)
        }
    }
}

/// Resolves every name (repeats included) in the team's season scope and
/// sums the values. Unresolved names add zero.
pub fn team_value<'a, I>(
    resolver: &IdentityResolver<'_>,
    lineup: I,
    team_norm: &str,
    season: &str,
) -> TeamValue
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = TeamValue::default();
    for raw_name in lineup {
        out.seen += 1;
        let resolution = resolver.resolve(raw_name, season, team_norm);
        debug!(player = raw_name, team = team_norm, season, ?resolution, "lineup name");
        if resolution.is_resolved() {
            out.resolved += 1;
        }
        out.total += resolution.value();
    }
    out
}

/// Lineup cell parser. Accepts a JSON array, a Python-style list literal
/// (`['A', "B"]`) or a plain comma-separated list. Blank items are dropped.
pub fn parse_lineup(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if let Some(inner) = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
            return items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(items) = parse_list_literal(inner) {
            return items;
        }
        return split_commas(inner);
    }
    split_commas(trimmed)
}

fn split_commas(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Items of a list literal body: quoted strings (either quote, backslash
/// escapes) or bare tokens, comma separated. `None` on an unterminated quote
/// or junk between an item and the next comma.
fn parse_list_literal(inner: &str) -> Option<Vec<String>> {
    let mut out = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            break;
        };
        let item = if first == '\'' || first == '"' {
            chars.next();
            let mut item = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => item.push(chars.next()?),
                    c if c == first => {
                        closed = true;
                        break;
                    }
                    c => item.push(c),
                }
            }
            if !closed {
                return None;
            }
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            item
        } else {
            let mut item = String::new();
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                item.push(c);
                chars.next();
            }
            item.trim().to_string()
        };
        match chars.next() {
            None | Some(',') => {}
            Some(_) => return None,
        }
        let item = item.trim().to_string();
        if !item.is_empty() {
            out.push(item);
        }
    }
    Some(out)
}
