use super::{RecommendationSet, Section, MAX_ITEMS_PER_SECTION};

const DIY_SIGNALS: [&str; 3] = ["diy", "creative", "transform"];
const ACTION_VERBS: [&str; 5] = ["transform", "convert", "create", "make", "repurpose"];
const MONETIZATION_SIGNALS: [&str; 3] = ["monetization", "sell", "marketplace"];
const SALE_CHANNELS: [&str; 6] = ["sell", "marketplace", "ebay", "facebook", "etsy", "craigslist"];
const SEATING_TERMS: [&str; 3] = ["chair", "stool", "bench"];
const GLASS_TERMS: [&str; 3] = ["bottle", "glass", "jar"];
const COLLECTIBLE_TERMS: [&str; 3] = ["vintage", "antique", "rare"];
const SUSTAINABILITY_SIGNALS: [&str; 3] = ["reuse", "sustain", "environment"];

const MIN_DIY_LINE_CHARS: usize = 20;
const MIN_SALE_LINE_CHARS: usize = 15;

const SEATING_DIY_IDEAS: [&str; 6] = [
    "Transform into a garden planter by adding soil and plants",
    "Create unique wall art by painting and hanging",
    "Convert into storage seating with hinged seat",
    "Make a pet bed with cushions",
    "Create a coat rack by adding hooks",
    "Transform into a side table",
];

const GLASS_DIY_IDEAS: [&str; 6] = [
    "Transform bottles into decorative vases",
    "Create candle holders from glass containers",
    "Make terrariums from jars",
    "Create storage containers",
    "Transform into hanging planters",
    "Make decorative lamps",
];

const GENERIC_DIY_IDEAS: [&str; 6] = [
    "Transform into a decorative piece",
    "Create a storage solution",
    "Make it into a garden planter",
    "Convert into wall art",
    "Repurpose for pet use",
    "Create a unique display item",
];

const COLLECTOR_MONETIZATION: [&str; 6] = [
    "Sell to antique dealers or collectors",
    "List on specialized vintage marketplaces",
    "Try auction houses for valuable items",
    "Post on Etsy for vintage items",
    "Consider consignment shops",
    "Sell to museums or collectors",
];

const GENERAL_MONETIZATION: [&str; 6] = [
    "Sell on Facebook Marketplace",
    "List on eBay",
    "Post on Craigslist",
    "Try local thrift stores",
    "Consider consignment shops",
    "Rent out for events",
];

const REUSE_SUSTAINABILITY: [&str; 6] = [
    "Reduces waste by reusing existing item",
    "Decreases demand for new manufacturing",
    "Supports circular economy principles",
    "Reduces carbon footprint",
    "Promotes sustainable consumption",
    "Helps conserve natural resources",
];

const DEFAULT_SUSTAINABILITY: [&str; 6] = [
    "Reduces waste in landfills",
    "Decreases manufacturing demand",
    "Supports circular economy",
    "Reduces carbon footprint",
    "Promotes sustainable living",
    "Conserves natural resources",
];

const WOOD_TUTORIALS: [&str; 6] = [
    "Wood sanding and refinishing techniques",
    "Wood staining and finishing methods",
    "Basic wood repair techniques",
    "Wood painting and decoration ideas",
    "Wood assembly basics",
    "Wood safety and tool handling",
];

const METAL_TUTORIALS: [&str; 6] = [
    "Metal cleaning and rust removal",
    "Metal painting and finishing techniques",
    "Basic metal repair methods",
    "Metal cutting and shaping basics",
    "Metal welding techniques",
    "Metal safety and tool handling",
];

const GLASS_TUTORIALS: [&str; 6] = [
    "Glass cleaning and maintenance",
    "Glass cutting and shaping techniques",
    "Glass painting and decoration methods",
    "Glass safety and handling basics",
    "Glass repair and restoration",
    "Glass crafting and DIY projects",
];

const GENERIC_TUTORIALS: [&str; 6] = [
    "Basic cleaning techniques",
    "Safe handling methods",
    "Restoration techniques",
    "Creative painting ideas",
    "Assembly basics",
    "Safety guidelines",
];

const MARKETPLACE_SUGGESTIONS: [&str; 6] = [
    "Facebook Marketplace - Best for local sales",
    "eBay - Wide audience reach",
    "Craigslist - Quick local transactions",
    "Etsy - Creative and handmade items",
    "OfferUp - Mobile-friendly marketplace",
    "Local thrift stores and consignment shops",
];

const DEFAULT_MARKETPLACES: [&str; 6] = [
    "Facebook Marketplace",
    "eBay",
    "Craigslist",
    "Etsy",
    "OfferUp",
    "Local stores",
];

/// Generic set used when there is no analysis text to work from at all.
pub fn default_recommendations() -> RecommendationSet {
    let mut recommendations = RecommendationSet::empty();
    recommendations.set_section(Section::DiyIdeas, GENERIC_DIY_IDEAS);
    recommendations.set_section(Section::Monetization, GENERAL_MONETIZATION);
    recommendations.set_section(Section::Sustainability, DEFAULT_SUSTAINABILITY);
    recommendations.set_section(Section::Tutorials, GENERIC_TUTORIALS);
    recommendations.set_section(Section::MarketplaceSuggestions, DEFAULT_MARKETPLACES);
    recommendations
}

/// Derives recommendations straight from keyword hits in the analysis text.
///
/// Each section is decided on its own. Lines lifted from the analysis win over
/// keyword tables, and keyword tables always have a generic branch, so every
/// section of the output is populated.
pub fn extract_from_analysis(analysis: &str) -> RecommendationSet {
    if analysis.trim().is_empty() {
        return default_recommendations();
    }
    let lowered = analysis.to_lowercase();

    let mut recommendations = RecommendationSet::empty();
    recommendations.set_section(Section::DiyIdeas, diy_ideas(analysis, &lowered));
    recommendations.set_section(Section::Monetization, monetization(analysis, &lowered));
    recommendations.set_section(Section::Sustainability, sustainability(&lowered));
    recommendations.set_section(Section::Tutorials, tutorials(&lowered));
    recommendations.set_section(Section::MarketplaceSuggestions, MARKETPLACE_SUGGESTIONS);
    recommendations
}

fn diy_ideas(analysis: &str, lowered: &str) -> Vec<String> {
    let mut ideas = Vec::new();
    if contains_any(lowered, &DIY_SIGNALS) {
        for line in analysis.lines() {
            if ideas.len() >= MAX_ITEMS_PER_SECTION {
                break;
            }
            let trimmed = line.trim();
            let line_lower = trimmed.to_lowercase();
            if line_lower.chars().count() <= MIN_DIY_LINE_CHARS
                || !contains_any(&line_lower, &ACTION_VERBS)
            {
                continue;
            }
            // `**Label**: text` lines take the list-item path; bold markers are dropped.
            if is_list_item(&line_lower) {
                let cleaned = trimmed
                    .trim_start_matches(|ch: char| {
                        ch.is_ascii_digit() || matches!(ch, '-' | '*' | '•' | '.' | ' ')
                    })
                    .replace("**", "");
                let cleaned = cleaned.trim();
                if !cleaned.is_empty() {
                    ideas.push(cleaned.to_string());
                }
            } else {
                ideas.push(trimmed.to_string());
            }
        }
    }
    if !ideas.is_empty() {
        return ideas;
    }

    let table: &[&str] = if contains_any(lowered, &SEATING_TERMS) {
        &SEATING_DIY_IDEAS
    } else if contains_any(lowered, &GLASS_TERMS) {
        &GLASS_DIY_IDEAS
    } else {
        &GENERIC_DIY_IDEAS
    };
    owned_list(table)
}

fn monetization(analysis: &str, lowered: &str) -> Vec<String> {
    let mut ideas = Vec::new();
    if contains_any(lowered, &MONETIZATION_SIGNALS) {
        for line in analysis.lines() {
            if ideas.len() >= MAX_ITEMS_PER_SECTION {
                break;
            }
            let trimmed = line.trim();
            let line_lower = trimmed.to_lowercase();
            if line_lower.chars().count() > MIN_SALE_LINE_CHARS
                && contains_any(&line_lower, &SALE_CHANNELS)
                && !line_lower.starts_with("**")
                && !line_lower.contains("monetization")
            {
                ideas.push(trimmed.to_string());
            }
        }
    }
    if !ideas.is_empty() {
        return ideas;
    }

    if contains_any(lowered, &COLLECTIBLE_TERMS) {
        owned_list(&COLLECTOR_MONETIZATION)
    } else {
        owned_list(&GENERAL_MONETIZATION)
    }
}

// The two lists only differ in wording; which one is returned still depends on
// whether the analysis talks about reuse.
fn sustainability(lowered: &str) -> Vec<String> {
    if contains_any(lowered, &SUSTAINABILITY_SIGNALS) {
        owned_list(&REUSE_SUSTAINABILITY)
    } else {
        owned_list(&DEFAULT_SUSTAINABILITY)
    }
}

fn tutorials(lowered: &str) -> Vec<String> {
    let table: &[&str] = if lowered.contains("wood") {
        &WOOD_TUTORIALS
    } else if contains_any(lowered, &["metal", "steel"]) {
        &METAL_TUTORIALS
    } else if lowered.contains("glass") {
        &GLASS_TUTORIALS
    } else {
        &GENERIC_TUTORIALS
    };
    owned_list(table)
}

fn is_list_item(line_lower: &str) -> bool {
    line_lower.starts_with(['-', '*', '•'])
        || ["1.", "2.", "3."]
            .iter()
            .any(|prefix| line_lower.starts_with(prefix))
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}
