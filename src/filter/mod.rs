use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::Record;
use crate::utils;

/// The reserved category that searches every field of a record.
pub const WILDCARD_CATEGORY: &str = "*";

/// One accepted value inside a category: either a discrete text match
/// or an inclusive numeric range with optional sides.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Range {
        from: Option<f64>,
        to: Option<f64>,
    },
}

impl FilterValue {
    pub fn range(from: Option<f64>, to: Option<f64>) -> Option<Self> {
        if from.is_none() && to.is_none() {
            return None;
        }
        Some(Self::Range { from, to })
    }

    /// Human-readable form used for tag chips and reports.
    pub fn label(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Range {
                from: Some(from),
                to: Some(to),
            } => format!("{} - {}", trim_float(*from), trim_float(*to)),
            Self::Range {
                from: Some(from),
                to: None,
            } => trim_float(*from),
            Self::Range {
                from: None,
                to: Some(to),
            } => trim_float(*to),
            Self::Range {
                from: None,
                to: None,
            } => String::new(),
        }
    }
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Normalized category -> accepted-values mapping for one apply cycle.
/// An empty value list means the category is unconstrained.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSpec {
    categories: BTreeMap<String, Vec<FilterValue>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_category(&mut self, category: &str) {
        self.categories.entry(category.to_string()).or_default();
    }

    pub fn push(&mut self, category: &str, value: FilterValue) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .push(value);
    }

    pub fn clear_category(&mut self, category: &str) {
        if let Some(values) = self.categories.get_mut(category) {
            values.clear();
        }
    }

    pub fn values(&self, category: &str) -> &[FilterValue] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// True when at least one category holds an accepted value.
    pub fn is_active(&self) -> bool {
        self.categories.values().any(|values| !values.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FilterValue])> {
        self.categories
            .iter()
            .map(|(category, values)| (category.as_str(), values.as_slice()))
    }

    pub fn into_categories(self) -> BTreeMap<String, Vec<FilterValue>> {
        self.categories
    }

    /// AND across categories, OR within a category. A category with no
    /// accepted values never excludes anything.
    pub fn matches(&self, record: &Record) -> bool {
        self.categories
            .iter()
            .all(|(category, values)| category_matches(record, category, values))
    }
}

fn category_matches(record: &Record, category: &str, values: &[FilterValue]) -> bool {
    if values.is_empty() {
        return true;
    }
    if category == WILDCARD_CATEGORY {
        return values.iter().any(|value| wildcard_matches(record, value));
    }
    let facet_text = record.facet(category).unwrap_or_default();
    let attribute = record.attribute(&utils::dataset_key(category));
    values.iter().any(|value| match value {
        FilterValue::Text(needle) => {
            attribute.is_some_and(|attr| utils::contains_ignore_case(attr, needle))
                || utils::contains_ignore_case(facet_text, needle)
        }
        FilterValue::Range { from, to } => attribute
            .and_then(utils::parse_number)
            .is_some_and(|n| within_bounds(n, *from, *to)),
    })
}

fn wildcard_matches(record: &Record, value: &FilterValue) -> bool {
    let FilterValue::Text(needle) = value else {
        // Ranges make no sense on the wildcard category.
        return false;
    };
    utils::contains_ignore_case(&record.text, needle)
        || record
            .attributes
            .values()
            .any(|attr| utils::contains_ignore_case(attr, needle))
}

fn within_bounds(value: f64, from: Option<f64>, to: Option<f64>) -> bool {
    from.is_none_or(|lo| value >= lo) && to.is_none_or(|hi| value <= hi)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn record(attrs: &[(&str, &str)], facets: &[(&str, &str)], text: &str) -> Record {
        Record {
            id: 0,
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            facets: facets
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: text.to_string(),
            html: String::new(),
        }
    }

    #[test]
    fn empty_spec_matches_everything() {
        let mut spec = FilterSpec::new();
        spec.ensure_category("color");
        spec.ensure_category(WILDCARD_CATEGORY);
        let r = record(&[], &[], "whatever");
        assert!(spec.matches(&r));
        assert!(!spec.is_active());
    }

    #[test]
    fn discrete_matches_attribute_or_facet_substring() {
        let r = record(&[("color", "Deep Red")], &[("kind", "Limited Edition")], "");
        let mut by_attr = FilterSpec::new();
        by_attr.push("color", FilterValue::Text("red".to_string()));
        assert!(by_attr.matches(&r));

        let mut by_facet = FilterSpec::new();
        by_facet.push("kind", FilterValue::Text("limited".to_string()));
        assert!(by_facet.matches(&r));

        let mut miss = FilterSpec::new();
        miss.push("color", FilterValue::Text("blue".to_string()));
        assert!(!miss.matches(&r));
    }

    #[test]
    fn categories_combine_with_and_values_with_or() {
        let r = record(&[("color", "Red"), ("size", "M")], &[], "");
        let mut spec = FilterSpec::new();
        spec.push("color", FilterValue::Text("Blue".to_string()));
        spec.push("color", FilterValue::Text("Red".to_string()));
        spec.push("size", FilterValue::Text("M".to_string()));
        assert!(spec.matches(&r));

        spec.push("size", FilterValue::Text("safe".to_string()));
        // still OR within size
        assert!(spec.matches(&r));

        let mut and_miss = FilterSpec::new();
        and_miss.push("color", FilterValue::Text("Red".to_string()));
        and_miss.push("size", FilterValue::Text("XL".to_string()));
        assert!(!and_miss.matches(&r));
    }

    #[test]
    fn range_is_inclusive_and_never_matches_missing_values() {
        let priced = record(&[("price", "25")], &[], "");
        let unpriced = record(&[], &[], "");
        let junk = record(&[("price", "soon")], &[], "");

        let mut spec = FilterSpec::new();
        spec.push("price", FilterValue::Range { from: Some(20.0), to: Some(30.0) });
        assert!(spec.matches(&priced));
        assert!(!spec.matches(&unpriced));
        assert!(!spec.matches(&junk));

        let mut open_low = FilterSpec::new();
        open_low.push("price", FilterValue::Range { from: None, to: Some(25.0) });
        assert!(open_low.matches(&priced));

        let mut open_high = FilterSpec::new();
        open_high.push("price", FilterValue::Range { from: Some(25.0), to: None });
        assert!(open_high.matches(&priced));
    }

    #[test]
    fn wildcard_searches_text_and_all_attributes() {
        let r = record(&[("badge", "Gamma Pick")], &[], "Alpha Item");
        let mut by_text = FilterSpec::new();
        by_text.push(WILDCARD_CATEGORY, FilterValue::Text("alpha".to_string()));
        assert!(by_text.matches(&r));

        let mut by_attr = FilterSpec::new();
        by_attr.push(WILDCARD_CATEGORY, FilterValue::Text("gamma".to_string()));
        assert!(by_attr.matches(&r));

        let mut miss = FilterSpec::new();
        miss.push(WILDCARD_CATEGORY, FilterValue::Text("omega".to_string()));
        assert!(!miss.matches(&r));
    }

    #[test]
    fn range_labels_cover_all_phrasings() {
        assert_eq!(
            FilterValue::Range { from: Some(20.0), to: Some(30.0) }.label(),
            "20 - 30"
        );
        assert_eq!(FilterValue::Range { from: Some(20.0), to: None }.label(), "20");
        assert_eq!(FilterValue::Range { from: None, to: Some(30.5) }.label(), "30.5");
    }

    #[test]
    fn attribute_lookup_goes_through_dataset_key() {
        let mut attrs = HashMap::new();
        attrs.insert("releaseDate".to_string(), "2024".to_string());
        let r = Record {
            id: 0,
            attributes: attrs,
            facets: HashMap::new(),
            text: String::new(),
            html: String::new(),
        };
        let mut spec = FilterSpec::new();
        spec.push("release-date", FilterValue::Text("2024".to_string()));
        assert!(spec.matches(&r));
    }
}
