use super::{RecommendationSet, Section};

const BULLET_GLYPHS: [char; 5] = ['-', '*', '•', '→', '▶'];
const HEADING_MARKERS: [&str; 5] = ["###", "##", "#", "section", "category"];
const MIN_PLAIN_ITEM_CHARS: usize = 10;

type HeadingRule = (Section, fn(&str) -> bool);

/// Evaluated top to bottom; the first matching rule wins.
const HEADING_RULES: [HeadingRule; 5] = [
    (Section::DiyIdeas, is_diy_heading),
    (Section::Monetization, is_monetization_heading),
    (Section::Sustainability, is_sustainability_heading),
    (Section::Tutorials, is_tutorials_heading),
    (Section::MarketplaceSuggestions, is_marketplace_heading),
];

fn is_diy_heading(line: &str) -> bool {
    line.contains("diy") && (line.contains("creative") || line.contains("idea"))
}

fn is_monetization_heading(line: &str) -> bool {
    line.contains("monetization")
        || line.contains("monetisation")
        || (line.contains("monet") && line.contains("opportunit"))
}

fn is_sustainability_heading(line: &str) -> bool {
    line.contains("sustainability") || (line.contains("sustain") && line.contains("benefit"))
}

fn is_tutorials_heading(line: &str) -> bool {
    (line.contains("tutorial") || line.contains("helpful"))
        && (line.contains("tutorial") || line.contains("guide"))
}

fn is_marketplace_heading(line: &str) -> bool {
    line.contains("marketplace") || (line.contains("market") && line.contains("suggest"))
}

/// Returns the section a line opens, if it reads as a section heading.
///
/// Matching runs on the lowercased line with markdown `#` markers removed, so
/// `### DIY Creative Ideas`, `**Diy ideas**` and `diy creative ideas:` all match.
pub fn detect_heading(line: &str) -> Option<Section> {
    let normalized = line.to_lowercase().replace('#', "");
    let normalized = normalized.trim();
    HEADING_RULES
        .iter()
        .find(|(_, rule)| rule(normalized))
        .map(|(section, _)| *section)
}

/// Parses free-form model output into the five fixed sections.
///
/// Lines seen before the first recognized heading are dropped. Each section keeps
/// its first six items. An all-empty result means the text was unusable.
pub fn parse_recommendations(text: &str) -> RecommendationSet {
    let mut recommendations = RecommendationSet::empty();
    let mut current: Option<Section> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(section) = detect_heading(line) {
            current = Some(section);
            continue;
        }
        let Some(section) = current else {
            continue;
        };
        if let Some(item) = content_item(line) {
            recommendations.push(section, item);
        }
    }

    recommendations
}

fn content_item(line: &str) -> Option<String> {
    if let Some(rest) = strip_numeric_prefix(line) {
        return non_empty(rest);
    }
    if line.starts_with(BULLET_GLYPHS) {
        let rest = line.trim_start_matches(|ch: char| ch == ' ' || BULLET_GLYPHS.contains(&ch));
        return non_empty(rest);
    }
    let lowered = line.to_lowercase();
    if line.chars().count() > MIN_PLAIN_ITEM_CHARS
        && !HEADING_MARKERS.iter().any(|marker| lowered.contains(marker))
    {
        return Some(line.to_string());
    }
    None
}

/// `1. foo`, `12) foo` -> `foo`. The `.`/`)` must sit within the first three chars.
fn strip_numeric_prefix(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 2 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::recommendations::{Coverage, Section};

    use super::{detect_heading, parse_recommendations};

    #[test]
    fn parses_numbered_and_bulleted_sections() {
        let text = "### DIY Creative Ideas\n1. Turn it into a shelf\n2. Paint it bright colors\n### Monetization Opportunities\n- Sell on eBay\n";
        let parsed = parse_recommendations(text);
        assert_eq!(
            parsed.diy_ideas(),
            ["Turn it into a shelf", "Paint it bright colors"]
        );
        assert_eq!(parsed.monetization(), ["Sell on eBay"]);
        assert!(parsed.sustainability().is_empty());
        assert!(parsed.tutorials().is_empty());
        assert!(parsed.marketplace_suggestions().is_empty());
        assert_eq!(parsed.coverage(), Coverage::Partial);
    }

    #[test]
    fn text_without_headings_yields_empty_set() {
        let text = "This is a lovely wooden chair.\n1. It has four legs\n- It is brown and sturdy\n";
        let parsed = parse_recommendations(text);
        assert!(parsed.is_empty());
        assert_eq!(parsed.coverage(), Coverage::Empty);
    }

    #[test]
    fn sections_keep_only_first_six_items() {
        let mut text = String::from("## Helpful Tutorials\n");
        for idx in 1..=9 {
            text.push_str(&format!("{idx}. Lesson number {idx}\n"));
        }
        let parsed = parse_recommendations(&text);
        assert_eq!(parsed.tutorials().len(), 6);
        assert_eq!(parsed.tutorials()[0], "Lesson number 1");
        assert_eq!(parsed.tutorials()[5], "Lesson number 6");
    }

    #[test]
    fn heading_variants_are_recognized() {
        assert_eq!(detect_heading("**DIY Ideas:**"), Some(Section::DiyIdeas));
        assert_eq!(
            detect_heading("## Monetisation options"),
            Some(Section::Monetization)
        );
        assert_eq!(
            detect_heading("Sustainability Benefits"),
            Some(Section::Sustainability)
        );
        assert_eq!(detect_heading("Helpful guides"), Some(Section::Tutorials));
        assert_eq!(
            detect_heading("### Market suggestions"),
            Some(Section::MarketplaceSuggestions)
        );
        assert_eq!(detect_heading("Turn it into a shelf"), None);
    }

    #[test]
    fn other_bullet_glyphs_and_paren_numbers_are_stripped() {
        let text = "Sustainability Benefits\n• Keeps wood out of landfill\n→ Saves energy\n3) Less shipping\n";
        let parsed = parse_recommendations(text);
        assert_eq!(
            parsed.sustainability(),
            ["Keeps wood out of landfill", "Saves energy", "Less shipping"]
        );
    }

    #[test]
    fn plain_lines_need_length_and_no_heading_marker() {
        let text = "### Helpful Tutorials\nShort one\nHow to sand a tabletop evenly\nSection two follows here\n";
        let parsed = parse_recommendations(text);
        assert_eq!(parsed.tutorials(), ["How to sand a tabletop evenly"]);
    }

    #[test]
    fn item_mentioning_a_heading_keyword_switches_section() {
        let text = "### Helpful Tutorials\n1. Refinishing basics\n2. List it on Facebook Marketplace\n3. Local pickup only\n";
        let parsed = parse_recommendations(text);
        assert_eq!(parsed.tutorials(), ["Refinishing basics"]);
        assert_eq!(parsed.marketplace_suggestions(), ["Local pickup only"]);
    }

    #[test]
    fn empty_numbered_items_are_dropped() {
        let text = "### DIY Creative Ideas\n1.\n2) \n3. Build a bench\n";
        let parsed = parse_recommendations(text);
        assert_eq!(parsed.diy_ideas(), ["Build a bench"]);
    }
}
