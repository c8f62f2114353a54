//! Deterministic sibling ordering.
//!
//! Alphabetic modes use a numeric-aware, case- and accent-insensitive
//! collation on the displayed text. Tag modes read bracketed tags such as
//! `[first]`, `[dernier]` or `[12]` from the label and id; nodes carrying a
//! recognised tag always sort before untagged ones, in both directions.

use std::cmp::Ordering;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::ir::Node;

pub const RANK_MIDDLE: i64 = 500;
pub const RANK_LATEST: i64 = 1000;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]]+)\]").unwrap());
static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").unwrap());

static RANK_WORDS: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    let bands: [(i64, &[&str]); 6] = [
        (
            0,
            &[
                "first", "1st", "early", "earliest", "start", "begin", "beginning", "initial",
                "premier", "premiere", "debut", "erste", "erster", "erstes", "fruh", "frueh",
                "anfang", "beginn", "primo", "prima", "inizio", "iniziale",
            ],
        ),
        (
            1,
            &[
                "second", "2nd", "deuxieme", "seconde", "zweite", "zweiter", "zweites", "secondo",
                "seconda",
            ],
        ),
        (
            2,
            &[
                "third", "3rd", "troisieme", "dritte", "dritter", "drittes", "terzo", "terza",
            ],
        ),
        (
            3,
            &[
                "fourth", "4th", "quatrieme", "vierte", "vierter", "viertes", "quarto", "quarta",
            ],
        ),
        (
            RANK_MIDDLE,
            &[
                "middle", "mid", "medium", "milieu", "moyen", "moyenne", "mitte", "mittel",
                "mittlere", "medio", "media", "mezzo",
            ],
        ),
        (
            RANK_LATEST,
            &[
                "latest", "last", "final", "recent", "most_recent", "dernier", "derniere",
                "recente", "letzte", "letzter", "letztes", "neueste", "neuester", "spat", "spaet",
                "ultimo", "ultima", "finale",
            ],
        ),
    ];
    let mut words = HashMap::new();
    for (rank, tokens) in bands {
        for token in tokens {
            words.insert(*token, rank);
        }
    }
    words
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OrderMode {
    #[default]
    AlphaAsc,
    AlphaDesc,
    TagsAsc,
    TagsDesc,
}

impl OrderMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "alpha_asc" => Some(Self::AlphaAsc),
            "alpha_desc" => Some(Self::AlphaDesc),
            "tags_asc" => Some(Self::TagsAsc),
            "tags_desc" => Some(Self::TagsDesc),
            _ => None,
        }
    }
}

/// Lowercases, strips combining marks and joins whitespace/hyphen runs with `_`.
pub fn normalize_token(raw: &str) -> String {
    let folded = fold_text(raw.trim());
    SEPARATOR_RE.replace_all(&folded, "_").into_owned()
}

/// Smallest rank among the recognised bracket tags in `label` and `id`.
pub fn node_rank(node: &Node) -> Option<i64> {
    text_rank(&format!("{} {}", node.label, node.id))
}

pub fn text_rank(text: &str) -> Option<i64> {
    TAG_RE
        .captures_iter(text)
        .filter_map(|caps| tag_rank(&normalize_token(&caps[1])))
        .min()
}

fn tag_rank(tag: &str) -> Option<i64> {
    if let Some(rank) = RANK_WORDS.get(tag) {
        return Some(*rank);
    }
    if !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_digit()) {
        return tag.parse().ok();
    }
    None
}

/// Precomputed comparison key; build once per node when sorting.
#[derive(Debug, Clone)]
pub struct OrderKey<'a> {
    rank: Option<i64>,
    folded: String,
    display: &'a str,
    id: &'a str,
}

impl<'a> OrderKey<'a> {
    pub fn new(node: &'a Node) -> Self {
        let display = node.display_text();
        Self {
            rank: node_rank(node),
            folded: fold_text(display),
            display,
            id: &node.id,
        }
    }
}

pub fn compare_nodes(a: &Node, b: &Node, mode: OrderMode) -> Ordering {
    compare_keys(&OrderKey::new(a), &OrderKey::new(b), mode)
}

pub fn compare_keys(a: &OrderKey<'_>, b: &OrderKey<'_>, mode: OrderMode) -> Ordering {
    match mode {
        OrderMode::AlphaAsc => compare_alpha(a, b),
        OrderMode::AlphaDesc => compare_alpha(b, a),
        OrderMode::TagsAsc | OrderMode::TagsDesc => match (a.rank, b.rank) {
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(ra), Some(rb)) if ra != rb => {
                if mode == OrderMode::TagsAsc {
                    ra.cmp(&rb)
                } else {
                    rb.cmp(&ra)
                }
            }
            _ => compare_alpha(a, b),
        },
    }
}

/// Sorts nodes in place; the sort is stable for nodes that compare equal.
pub fn sort_nodes<'a>(nodes: &mut Vec<&'a Node>, mode: OrderMode) {
    let mut keyed: Vec<(OrderKey<'a>, &'a Node)> = nodes
        .iter()
        .copied()
        .map(|node| (OrderKey::new(node), node))
        .collect();
    keyed.sort_by(|(ka, _), (kb, _)| compare_keys(ka, kb, mode));
    *nodes = keyed.into_iter().map(|(_, node)| node).collect();
}

fn compare_alpha(a: &OrderKey<'_>, b: &OrderKey<'_>) -> Ordering {
    natural_cmp(&a.folded, &b.folded)
        .then_with(|| a.display.cmp(b.display))
        .then_with(|| a.id.cmp(b.id))
}

fn fold_text(text: &str) -> String {
    text.nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compares digit runs by numeric value and everything else by code point.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_a = take_digits(&mut left);
                let run_b = take_digits(&mut right);
                let ord = compare_digit_runs(&run_a, &run_b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(ch) = chars.peek().copied() {
        if !ch.is_ascii_digit() {
            break;
        }
        run.push(ch);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
