use regex::Regex;
use lazy_static::lazy_static;
use std::collections::BTreeSet;

lazy_static! {
    // Example: "Route 5 (Red/Blue)" or "Safari Zone"
    static ref LOCATION_PATTERN: Regex = Regex::new(r"^(.*?)(?:\s*\(([^)]+)\))?$").unwrap();
    // Example: "route 12" or "route12"
    static ref ROUTE_PATTERN: Regex = Regex::new(r"route\s*(\d+)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLocation {
    pub base: String,
    /// Games the encounter is limited to. Empty means every game of the combo.
    pub variants: Vec<String>,
}

impl ParsedLocation {
    pub fn applies_to(&self, game: &str) -> bool {
        self.variants.is_empty() || self.variants.iter().any(|v| v == game)
    }
}

/// Splits a trailing "(GameA/GameB)" qualifier off a location label.
///
/// The qualifier only counts when every token names a known game, so descriptive
/// parentheticals such as "Safari Zone (rare)" stay part of the label.
pub fn parse_location(raw: &str, known_games: &BTreeSet<String>) -> ParsedLocation {
    if let Some(caps) = LOCATION_PATTERN.captures(raw) {
        if let (Some(base), Some(variant_str)) = (caps.get(1), caps.get(2)) {
            let variants: Vec<String> = variant_str
                .as_str()
                .split('/')
                .map(|v| v.trim().to_string())
                .collect();
            if variants.iter().all(|v| known_games.contains(v)) {
                return ParsedLocation {
                    base: base.as_str().trim().to_string(),
                    variants,
                };
            }
        }
    }

    ParsedLocation {
        base: raw.trim().to_string(),
        variants: Vec::new(),
    }
}

/// Route number from a lowercased location label, if it names one.
pub fn route_number(location_lower: &str) -> Option<u32> {
    ROUTE_PATTERN
        .captures(location_lower)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}
