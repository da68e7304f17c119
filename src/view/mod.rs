use crate::filter::{FilterSpec, FilterValue};

/// What a renderer would paint after an apply cycle. Fields mirror the
/// optional page collaborators; `None` means the collaborator is
/// absent and the feature inactive.
#[derive(Clone, Debug, Default)]
pub struct ViewState {
    /// Record ids in render order for the current page slice.
    pub visible: Vec<usize>,
    pub empty_visible: bool,
    pub result_count: Option<usize>,
    pub pagination: Option<PaginationDisplay>,
    pub tags: Option<Vec<TagChip>>,
    /// Controls hidden by available-value narrowing (advanced mode).
    pub hidden_controls: Vec<usize>,
    /// Toggle containers carrying the active class.
    pub active_controls: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationDisplay {
    pub counter: Option<String>,
    pub prev_present: bool,
    pub prev_hidden: bool,
    pub next_present: bool,
    pub next_hidden: bool,
}

/// One removable chip for an active (category, value) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct TagChip {
    pub category: String,
    pub value: FilterValue,
    pub label: String,
}

impl TagChip {
    pub fn new(category: &str, value: FilterValue, show_category: bool) -> Self {
        let label = if show_category {
            format!("{category}: {}", value.label())
        } else {
            value.label()
        };
        Self {
            category: category.to_string(),
            value,
            label,
        }
    }
}

/// Chips for every active (category, value) pair, rebuilt from scratch
/// each cycle.
pub fn build_tags(spec: &FilterSpec, show_category: bool) -> Vec<TagChip> {
    let mut tags = Vec::new();
    for (category, values) in spec.iter() {
        for value in values {
            tags.push(TagChip::new(category, value.clone(), show_category));
        }
    }
    tags
}
