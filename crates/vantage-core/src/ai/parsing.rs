//! Section parser for insight responses
//!
//! The model is asked for three Markdown level-2 sections, in order:
//!
//! ```text
//! ## Narrative
//! ## Recommendations
//! ## Trends Analysis
//! ```
//!
//! Text before the first heading is discarded. Recommendations are list
//! items (`-`, `*`, `+`, `1.` or `1)`). Anything else fails closed with
//! [`MalformedSections`]: no partial result is ever returned.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

pub const NARRATIVE: &str = "Narrative";
pub const RECOMMENDATIONS: &str = "Recommendations";
pub const TRENDS_ANALYSIS: &str = "Trends Analysis";

const SECTIONS: [&str; 3] = [NARRATIVE, RECOMMENDATIONS, TRENDS_ANALYSIS];

/// Why a response failed section validation. The generator attaches the
/// digest's period and region before surfacing it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct MalformedSections(pub String);

type Result<T> = std::result::Result<T, MalformedSections>;

/// The three validated fields of an insight response
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInsight {
    pub narrative: String,
    pub recommendations: Vec<String>,
    pub trends_analysis: String,
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^##\s+(.+?)\s*$").expect("valid regex"))
}

fn list_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:[-*+]|\d{1,2}[.)])\s+(.+?)\s*$").expect("valid regex"))
}

fn malformed(reason: impl Into<String>) -> MalformedSections {
    MalformedSections(reason.into())
}

/// Normalise heading text: strip bold markers, trailing `#`s and colons
fn heading_name(raw: &str) -> String {
    raw.trim_end_matches('#')
        .trim()
        .trim_matches('*')
        .trim_end_matches(':')
        .trim()
        .to_string()
}

/// Split a response into its three sections and validate them.
///
/// At most `max_recommendations` list items are kept.
pub fn parse_insight_response(response: &str, max_recommendations: usize) -> Result<ParsedInsight> {
    // (section index, body lines) in the order they appear
    let mut sections: Vec<(usize, Vec<&str>)> = Vec::new();

    for line in response.lines() {
        if let Some(caps) = heading_re().captures(line) {
            let name = heading_name(&caps[1]);
            let idx = SECTIONS
                .iter()
                .position(|s| s.eq_ignore_ascii_case(&name))
                .ok_or_else(|| malformed(format!("unexpected section '{}'", name)))?;

            if sections.iter().any(|(i, _)| *i == idx) {
                return Err(malformed(format!("duplicate section '{}'", SECTIONS[idx])));
            }
            if let Some((last, _)) = sections.last() {
                if idx < *last {
                    return Err(malformed(format!(
                        "section '{}' out of order",
                        SECTIONS[idx]
                    )));
                }
            }
            sections.push((idx, Vec::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            body.push(line);
        }
        // Lines before the first heading are preamble
    }

    let body = |idx: usize| -> Result<&Vec<&str>> {
        sections
            .iter()
            .find(|(i, _)| *i == idx)
            .map(|(_, lines)| lines)
            .ok_or_else(|| malformed(format!("missing section '{}'", SECTIONS[idx])))
    };

    let narrative = prose(body(0)?, NARRATIVE)?;
    let recommendations = list_items(body(1)?, max_recommendations)?;
    let trends_analysis = prose(body(2)?, TRENDS_ANALYSIS)?;

    Ok(ParsedInsight {
        narrative,
        recommendations,
        trends_analysis,
    })
}

fn prose(lines: &[&str], name: &str) -> Result<String> {
    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        return Err(malformed(format!("empty section '{}'", name)));
    }
    Ok(text)
}

/// Collect list items. Non-item lines directly after an item continue it;
/// an introduction before the first item is ignored.
fn list_items(lines: &[&str], max: usize) -> Result<Vec<String>> {
    let mut items: Vec<String> = Vec::new();
    let mut continuing = false;

    for line in lines {
        if let Some(caps) = list_item_re().captures(line) {
            items.push(caps[1].to_string());
            continuing = true;
        } else if line.trim().is_empty() {
            continuing = false;
        } else if continuing {
            if let Some(last) = items.last_mut() {
                last.push(' ');
                last.push_str(line.trim());
            }
        }
    }

    if items.is_empty() {
        return Err(malformed(format!("empty section '{}'", RECOMMENDATIONS)));
    }
    items.truncate(max);
    Ok(items)
}
