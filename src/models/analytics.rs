use std::collections::HashMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// High-level classification derived from a free-text product label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryTag {
    Prod,
    Acq,
    Mkt,
    Misc,
}

impl CategoryTag {
    pub const ALL: [CategoryTag; 4] = [
        CategoryTag::Prod,
        CategoryTag::Acq,
        CategoryTag::Mkt,
        CategoryTag::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryTag::Prod => "PROD",
            CategoryTag::Acq => "ACQ",
            CategoryTag::Mkt => "MKT",
            CategoryTag::Misc => "MISC",
        }
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product subtype vocabulary, in match priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProductSubtype {
    Casino,
    Sport,
    Poker,
    Lotto,
}

impl ProductSubtype {
    pub const VOCABULARY: [ProductSubtype; 4] = [
        ProductSubtype::Casino,
        ProductSubtype::Sport,
        ProductSubtype::Poker,
        ProductSubtype::Lotto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductSubtype::Casino => "casino",
            ProductSubtype::Sport => "sport",
            ProductSubtype::Poker => "poker",
            ProductSubtype::Lotto => "lotto",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub category: CategoryTag,
    pub subtype: Option<ProductSubtype>,
}

/// Independent grouping axes reported in a snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Facet {
    Category,
    Product,
    Market,
    Department,
    AiTool,
    Deliverable,
    Contributor,
    Reporter,
}

impl Facet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Category => "category",
            Facet::Product => "product",
            Facet::Market => "market",
            Facet::Department => "department",
            Facet::AiTool => "aiTool",
            Facet::Deliverable => "deliverable",
            Facet::Contributor => "contributor",
            Facet::Reporter => "reporter",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Facet::Category => "Categories",
            Facet::Product => "Products",
            Facet::Market => "Top markets",
            Facet::Department => "Departments",
            Facet::AiTool => "Top AI tools",
            Facet::Deliverable => "Top deliverables",
            Facet::Contributor => "Top contributors",
            Facet::Reporter => "Top reporters",
        }
    }

    pub fn icon(&self) -> EntryIcon {
        match self {
            Facet::Category => EntryIcon::Category,
            Facet::Product => EntryIcon::Product,
            Facet::Market => EntryIcon::Market,
            Facet::Department => EntryIcon::Department,
            Facet::AiTool => EntryIcon::AiTool,
            Facet::Deliverable => EntryIcon::Deliverable,
            Facet::Contributor => EntryIcon::Contributor,
            Facet::Reporter => EntryIcon::Reporter,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub count: u64,
    pub hours: f64,
}

/// Label-keyed map that keeps first-insertion order and serializes as a JSON
/// object in that order.
#[derive(Debug, Clone)]
pub struct LabeledMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

pub type GroupBreakdown = LabeledMap<GroupStats>;
pub type PercentageMap = LabeledMap<f64>;

impl<V> LabeledMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&V> {
        self.index.get(label).map(|&position| &self.entries[position].1)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries
            .iter()
            .map(|(label, value)| (label.as_str(), value))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    /// Replaces the value of an existing label in place, or appends a new one.
    pub fn insert(&mut self, label: impl Into<String>, value: V) {
        let label = label.into();
        match self.index.get(&label) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(label.clone(), self.entries.len());
                self.entries.push((label, value));
            }
        }
    }

    /// Consuming update used by folds: returns the map with `label`'s value
    /// replaced by `update(current)`. Unknown labels are left untouched.
    pub fn with_updated(mut self, label: &str, update: impl FnOnce(&V) -> V) -> Self {
        if let Some(&position) = self.index.get(label) {
            let next = update(&self.entries[position].1);
            self.entries[position].1 = next;
        }
        self
    }

    pub fn map_values<U>(&self, mut f: impl FnMut(&str, &V) -> U) -> LabeledMap<U> {
        self.iter()
            .map(|(label, value)| (label.to_string(), f(label, value)))
            .collect()
    }
}

impl<V> Default for LabeledMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PartialEq> PartialEq for LabeledMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V> FromIterator<(String, V)> for LabeledMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = LabeledMap::new();
        for (label, value) in iter {
            map.insert(label, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for LabeledMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

impl GroupBreakdown {
    pub fn total_count(&self) -> u64 {
        self.iter().map(|(_, stats)| stats.count).sum()
    }

    pub fn total_hours(&self) -> f64 {
        self.iter().map(|(_, stats)| stats.hours).sum()
    }
}

/// Task counts for the four canonical categories. Every category is always
/// present, with zero when no record falls into it.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct CategoryTotals {
    #[serde(rename = "PROD")]
    pub prod: u64,
    #[serde(rename = "ACQ")]
    pub acq: u64,
    #[serde(rename = "MKT")]
    pub mkt: u64,
    #[serde(rename = "MISC")]
    pub misc: u64,
    pub total: u64,
}

impl CategoryTotals {
    pub fn get(&self, tag: CategoryTag) -> u64 {
        match tag {
            CategoryTag::Prod => self.prod,
            CategoryTag::Acq => self.acq,
            CategoryTag::Mkt => self.mkt,
            CategoryTag::Misc => self.misc,
        }
    }

    pub fn incremented(self, tag: CategoryTag) -> Self {
        let mut next = self;
        match tag {
            CategoryTag::Prod => next.prod += 1,
            CategoryTag::Acq => next.acq += 1,
            CategoryTag::Mkt => next.mkt += 1,
            CategoryTag::Misc => next.misc += 1,
        }
        next.total += 1;
        next
    }

    pub fn category_sum(&self) -> u64 {
        CategoryTag::ALL.iter().map(|tag| self.get(*tag)).sum()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EntryIcon {
    Group,
    Category,
    Product,
    Market,
    Department,
    AiTool,
    Deliverable,
    Contributor,
    Reporter,
    Section,
    Empty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TopNEntryKind {
    Item,
    Header,
    NoData,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopNEntry {
    pub icon: EntryIcon,
    pub label: String,
    pub value: String,
    pub sub_value: String,
    pub is_header: bool,
    pub kind: TopNEntryKind,
}

impl TopNEntry {
    pub fn item(
        icon: EntryIcon,
        label: impl Into<String>,
        value: impl Into<String>,
        sub_value: impl Into<String>,
    ) -> Self {
        Self {
            icon,
            label: label.into(),
            value: value.into(),
            sub_value: sub_value.into(),
            is_header: false,
            kind: TopNEntryKind::Item,
        }
    }

    pub fn header(label: impl Into<String>) -> Self {
        Self {
            icon: EntryIcon::Section,
            label: label.into(),
            value: String::new(),
            sub_value: String::new(),
            is_header: true,
            kind: TopNEntryKind::Header,
        }
    }

    pub fn no_data(label: impl Into<String>) -> Self {
        Self {
            icon: EntryIcon::Empty,
            label: label.into(),
            value: String::new(),
            sub_value: String::new(),
            is_header: false,
            kind: TopNEntryKind::NoData,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.kind == TopNEntryKind::NoData
    }
}

/// Optional snapshot filters; every omitted filter is skipped entirely.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsFilters {
    #[serde(default)]
    pub period_id: Option<String>,
    #[serde(default)]
    pub contributor_id: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FacetSnapshot {
    pub breakdown: GroupBreakdown,
    pub percentages: PercentageMap,
    /// Sum of group counts; the percentage base for this facet.
    pub total: u64,
    pub top: Vec<TopNEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySnapshot {
    pub totals: CategoryTotals,
    pub percentages: PercentageMap,
    pub top: Vec<TopNEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeDistribution {
    pub total_hours: f64,
    pub by_category: GroupBreakdown,
    /// Hour share per category against `total_hours`.
    pub category_hour_percentages: PercentageMap,
    pub by_day: GroupBreakdown,
    pub undated: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub total_tasks: u64,
    pub total_hours: f64,
    pub ai_hours: f64,
    pub priority_tasks: u64,
    pub priority_percentage: f64,
    pub reworked_tasks: u64,
    pub reworked_percentage: f64,
    pub contributors: u64,
    pub reporters: u64,
    pub markets: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub period_id: String,
    pub contributor_id: String,
    pub source_id: String,
    pub department: String,
    pub limit: usize,
    /// Entries in the raw payload, before any filter.
    pub input_records: u64,
    /// Entries dropped during normalization (non-objects, missing id). The
    /// whole payload is normalized before filtering, so this also counts
    /// malformed entries that the filters would have excluded.
    pub skipped_records: u64,
    /// Normalized records that passed every filter.
    pub matched_records: u64,
}

/// Fixed-shape aggregation result; every field is present even when empty.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub summary: SnapshotSummary,
    pub categories: CategorySnapshot,
    pub time_distribution: TimeDistribution,
    pub products: FacetSnapshot,
    pub markets: FacetSnapshot,
    pub departments: FacetSnapshot,
    pub ai_tools: FacetSnapshot,
    pub deliverables: FacetSnapshot,
    pub contributors: FacetSnapshot,
    pub reporters: FacetSnapshot,
    pub highlights: Vec<TopNEntry>,
    pub meta: SnapshotMeta,
}
