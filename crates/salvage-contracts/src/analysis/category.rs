use super::Category;

type CategoryRule = (&'static [&'static str], Category);

/// Checked in order; the first rule with a keyword hit decides. Furniture terms
/// run before material terms, so "wooden chair" stays furniture.
const CATEGORY_RULES: [CategoryRule; 6] = [
    (
        &["chair", "table", "sofa", "furniture", "stool", "bench"],
        Category::Furniture,
    ),
    (
        &["phone", "laptop", "electronic", "computer", "device"],
        Category::Electronics,
    ),
    (
        &["shirt", "dress", "clothing", "fabric", "textile"],
        Category::Clothing,
    ),
    (&["glass", "bottle", "jar", "container"], Category::Kitchen),
    (&["metal", "steel", "iron", "aluminum"], Category::Tools),
    (&["wood", "wooden"], Category::Furniture),
];

pub fn classify(analysis_text: &str) -> Category {
    let lowered = analysis_text.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, category)| *category)
        .unwrap_or(Category::General)
}
