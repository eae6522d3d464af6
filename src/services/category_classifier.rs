use crate::models::analytics::{CategoryTag, Classification, ProductSubtype};

const CATEGORY_PREFIXES: [(&str, CategoryTag); 3] = [
    ("prod", CategoryTag::Prod),
    ("acq", CategoryTag::Acq),
    ("mkt", CategoryTag::Mkt),
];

/// Maps a free-text product label to its category and optional subtype.
///
/// The category comes from the label's prefix (case-insensitive, trimmed);
/// the subtype from the first vocabulary word contained anywhere in it.
pub fn classify(label: Option<&str>) -> Classification {
    let normalized = label.map(|value| value.trim().to_lowercase()).unwrap_or_default();

    Classification {
        category: category_for(&normalized),
        subtype: subtype_for(&normalized),
    }
}

fn category_for(normalized: &str) -> CategoryTag {
    CATEGORY_PREFIXES
        .iter()
        .find(|(prefix, _)| normalized.starts_with(prefix))
        .map(|(_, tag)| *tag)
        .unwrap_or(CategoryTag::Misc)
}

fn subtype_for(normalized: &str) -> Option<ProductSubtype> {
    ProductSubtype::VOCABULARY
        .iter()
        .copied()
        .find(|subtype| normalized.contains(subtype.as_str()))
}
