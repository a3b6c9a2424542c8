mod heuristics;
mod parser;

use serde::{Deserialize, Serialize};

pub use heuristics::{default_recommendations, extract_from_analysis};
pub use parser::{detect_heading, parse_recommendations};

/// Hard cap on the number of items any single section may hold.
pub const MAX_ITEMS_PER_SECTION: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    DiyIdeas,
    Monetization,
    Sustainability,
    Tutorials,
    MarketplaceSuggestions,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::DiyIdeas,
        Section::Monetization,
        Section::Sustainability,
        Section::Tutorials,
        Section::MarketplaceSuggestions,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Section::DiyIdeas => "diy_ideas",
            Section::Monetization => "monetization",
            Section::Sustainability => "sustainability",
            Section::Tutorials => "tutorials",
            Section::MarketplaceSuggestions => "marketplace_suggestions",
        }
    }

    /// Heading the synthesizer prompt asks the model to emit.
    pub fn heading(self) -> &'static str {
        match self {
            Section::DiyIdeas => "DIY Creative Ideas",
            Section::Monetization => "Monetization Opportunities",
            Section::Sustainability => "Sustainability Benefits",
            Section::Tutorials => "Helpful Tutorials",
            Section::MarketplaceSuggestions => "Marketplace Suggestions",
        }
    }
}

/// How much of a [`RecommendationSet`] carries usable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Full,
    Partial,
    Empty,
}

impl Coverage {
    pub fn as_str(self) -> &'static str {
        match self {
            Coverage::Full => "full",
            Coverage::Partial => "partial",
            Coverage::Empty => "empty",
        }
    }
}

/// Five ordered suggestion lists, each holding at most
/// [`MAX_ITEMS_PER_SECTION`] entries. The first entry is the most relevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SectionLists")]
pub struct RecommendationSet {
    diy_ideas: Vec<String>,
    monetization: Vec<String>,
    sustainability: Vec<String>,
    tutorials: Vec<String>,
    marketplace_suggestions: Vec<String>,
}

impl RecommendationSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn section(&self, section: Section) -> &[String] {
        match section {
            Section::DiyIdeas => &self.diy_ideas,
            Section::Monetization => &self.monetization,
            Section::Sustainability => &self.sustainability,
            Section::Tutorials => &self.tutorials,
            Section::MarketplaceSuggestions => &self.marketplace_suggestions,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::DiyIdeas => &mut self.diy_ideas,
            Section::Monetization => &mut self.monetization,
            Section::Sustainability => &mut self.sustainability,
            Section::Tutorials => &mut self.tutorials,
            Section::MarketplaceSuggestions => &mut self.marketplace_suggestions,
        }
    }

    pub fn diy_ideas(&self) -> &[String] {
        &self.diy_ideas
    }

    pub fn monetization(&self) -> &[String] {
        &self.monetization
    }

    pub fn sustainability(&self) -> &[String] {
        &self.sustainability
    }

    pub fn tutorials(&self) -> &[String] {
        &self.tutorials
    }

    pub fn marketplace_suggestions(&self) -> &[String] {
        &self.marketplace_suggestions
    }

    /// Appends `item` unless the section is already full. First come, first kept.
    pub fn push(&mut self, section: Section, item: impl Into<String>) -> bool {
        let items = self.section_mut(section);
        if items.len() >= MAX_ITEMS_PER_SECTION {
            return false;
        }
        items.push(item.into());
        true
    }

    /// Replaces a whole section, keeping only the first six items.
    pub fn set_section<I, S>(&mut self, section: Section, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.section_mut(section) = items
            .into_iter()
            .take(MAX_ITEMS_PER_SECTION)
            .map(Into::into)
            .collect();
    }

    pub fn is_empty(&self) -> bool {
        Section::ALL
            .iter()
            .all(|section| self.section(*section).is_empty())
    }

    pub fn coverage(&self) -> Coverage {
        let filled = Section::ALL
            .iter()
            .filter(|section| !self.section(**section).is_empty())
            .count();
        match filled {
            0 => Coverage::Empty,
            n if n == Section::ALL.len() => Coverage::Full,
            _ => Coverage::Partial,
        }
    }

    pub fn counts(&self) -> Vec<(Section, usize)> {
        Section::ALL
            .iter()
            .map(|section| (*section, self.section(*section).len()))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SectionLists {
    diy_ideas: Vec<String>,
    monetization: Vec<String>,
    sustainability: Vec<String>,
    tutorials: Vec<String>,
    marketplace_suggestions: Vec<String>,
}

impl From<SectionLists> for RecommendationSet {
    fn from(lists: SectionLists) -> Self {
        let mut set = RecommendationSet::empty();
        set.set_section(Section::DiyIdeas, lists.diy_ideas);
        set.set_section(Section::Monetization, lists.monetization);
        set.set_section(Section::Sustainability, lists.sustainability);
        set.set_section(Section::Tutorials, lists.tutorials);
        set.set_section(Section::MarketplaceSuggestions, lists.marketplace_suggestions);
        set
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Coverage, RecommendationSet, Section, MAX_ITEMS_PER_SECTION};

    #[test]
    fn push_stops_at_section_cap() {
        let mut set = RecommendationSet::empty();
        for idx in 0..10 {
            set.push(Section::Tutorials, format!("tutorial {idx}"));
        }
        assert_eq!(set.tutorials().len(), MAX_ITEMS_PER_SECTION);
        assert_eq!(set.tutorials()[0], "tutorial 0");
        assert_eq!(set.tutorials()[5], "tutorial 5");
    }

    #[test]
    fn coverage_reflects_filled_sections() {
        let mut set = RecommendationSet::empty();
        assert_eq!(set.coverage(), Coverage::Empty);
        set.push(Section::Monetization, "Sell on eBay");
        assert_eq!(set.coverage(), Coverage::Partial);
        for section in Section::ALL {
            set.push(section, "something");
        }
        assert_eq!(set.coverage(), Coverage::Full);
    }

    #[test]
    fn deserialize_truncates_oversized_sections_and_fills_missing() -> anyhow::Result<()> {
        let set: RecommendationSet = serde_json::from_value(json!({
            "diy_ideas": ["a", "b", "c", "d", "e", "f", "g", "h"],
        }))?;
        assert_eq!(set.diy_ideas().len(), MAX_ITEMS_PER_SECTION);
        assert!(set.monetization().is_empty());
        assert!(set.marketplace_suggestions().is_empty());

        let value = serde_json::to_value(&set)?;
        assert_eq!(value["marketplace_suggestions"], json!([]));
        assert_eq!(value["diy_ideas"][0], json!("a"));
        Ok(())
    }
}
