mod shared;

pub use shared::Shared;

use std::collections::BTreeMap;

use crate::filter::{FilterSpec, FilterValue};
use crate::markup::{ControlScan, FormScan, InputScan, RangeSide, ToggleKind};
use crate::utils;

/// Live state of one category-bound filter control.
#[derive(Clone, Debug)]
pub enum ControlState {
    Toggle {
        kind: ToggleKind,
        label: String,
        checked: bool,
        /// Whether the container currently carries the active class.
        active: bool,
    },
    Text {
        value: String,
    },
    Range {
        side: RangeSide,
        value: Shared<String>,
        /// Baseline recorded the first time a valid number is read;
        /// only departures from it constrain the category.
        default: Option<f64>,
    },
    /// Category bound by markup with no usable input. Still registers
    /// the category as unconstrained.
    Unbound,
}

#[derive(Clone, Debug)]
pub struct FilterControl {
    pub id: usize,
    pub category: String,
    pub state: ControlState,
}

/// All controls of the filter form, in document order, plus the form
/// level flags that shape spec building.
#[derive(Clone, Debug, Default)]
pub struct ControlBank {
    controls: Vec<FilterControl>,
    active_class: Option<String>,
    advanced: bool,
}

impl ControlBank {
    pub fn from_scan(form: &FormScan) -> Self {
        let controls = form
            .controls
            .iter()
            .enumerate()
            .map(|(id, scan)| FilterControl {
                id,
                category: scan.category.clone(),
                state: control_state(scan),
            })
            .collect();
        Self {
            controls,
            active_class: form.active_class.clone(),
            advanced: form.advanced,
        }
    }

    pub fn controls(&self) -> &[FilterControl] {
        &self.controls
    }

    pub fn advanced(&self) -> bool {
        self.advanced
    }

    pub fn active_class(&self) -> Option<&str> {
        self.active_class.as_deref()
    }

    /// Ids of toggle containers currently carrying the active class.
    pub fn active_controls(&self) -> Vec<usize> {
        if self.active_class.is_none() {
            return Vec::new();
        }
        self.controls
            .iter()
            .filter(|c| matches!(c.state, ControlState::Toggle { active: true, .. }))
            .map(|c| c.id)
            .collect()
    }

    /// Reads every control into a fresh spec. Also performs the side
    /// effects of a read: first-seen range defaults are recorded and
    /// toggle active flags follow their checked state.
    pub fn build_spec(&mut self) -> FilterSpec {
        let mut spec = FilterSpec::new();
        let mut ranges: BTreeMap<String, (Option<f64>, Option<f64>)> = BTreeMap::new();
        let has_active_class = self.active_class.is_some();

        for control in &mut self.controls {
            spec.ensure_category(&control.category);
            match &mut control.state {
                ControlState::Toggle {
                    label,
                    checked,
                    active,
                    ..
                } => {
                    if *checked {
                        spec.push(&control.category, FilterValue::Text(label.clone()));
                    }
                    *active = has_active_class && *checked;
                }
                ControlState::Text { value } => {
                    let trimmed = value.trim();
                    if trimmed.is_empty() {
                        spec.clear_category(&control.category);
                    } else {
                        spec.push(&control.category, FilterValue::Text(trimmed.to_string()));
                    }
                }
                ControlState::Range {
                    side,
                    value,
                    default,
                } => {
                    let entry = ranges.entry(control.category.clone()).or_default();
                    let side_slot = match side {
                        RangeSide::From => &mut entry.0,
                        RangeSide::To => &mut entry.1,
                    };
                    match utils::parse_number(&value.get()) {
                        Some(number) => match default {
                            None => *default = Some(number),
                            Some(baseline) if *baseline != number => *side_slot = Some(number),
                            Some(_) => {}
                        },
                        None => *side_slot = None,
                    }
                }
                ControlState::Unbound => {}
            }
        }

        for (category, (from, to)) in ranges {
            if let Some(value) = FilterValue::range(from, to) {
                spec.push(&category, value);
            }
        }
        spec
    }

    pub fn set_checked(&mut self, category: &str, label: &str, value: bool) -> bool {
        let mut found = false;
        for control in self.by_category_mut(category) {
            if let ControlState::Toggle {
                label: own_label,
                checked,
                ..
            } = &mut control.state
            {
                if own_label == label {
                    *checked = value;
                    found = true;
                }
            }
        }
        found
    }

    pub fn set_text(&mut self, category: &str, text: &str) -> bool {
        for control in self.by_category_mut(category) {
            if let ControlState::Text { value } = &mut control.state {
                *value = text.to_string();
                return true;
            }
        }
        false
    }

    pub fn set_range_value(&mut self, category: &str, side: RangeSide, text: &str) -> bool {
        match self.range_shared(category, side) {
            Some(shared) => {
                shared.set(text.to_string());
                true
            }
            None => false,
        }
    }

    /// Handle to a range endpoint's backing value; a paired widget can
    /// keep a clone and write through it.
    pub fn range_shared(&self, category: &str, side: RangeSide) -> Option<Shared<String>> {
        self.controls
            .iter()
            .filter(|c| c.category == category)
            .find_map(|c| match &c.state {
                ControlState::Range {
                    side: own_side,
                    value,
                    ..
                } if *own_side == side => Some(value.clone()),
                _ => None,
            })
    }

    /// Clears the controls behind one removed tag. Text inputs in the
    /// category blank out, range endpoints return to their recorded
    /// defaults, toggles uncheck (all of them in advanced mode, only
    /// the matching label otherwise).
    pub fn clear_for_tag(&mut self, category: &str, value: &FilterValue) {
        let advanced = self.advanced;
        for control in self.by_category_mut(category) {
            match &mut control.state {
                ControlState::Text { value: text } => text.clear(),
                ControlState::Range {
                    value: shared,
                    default,
                    ..
                } => restore_range(shared, *default),
                ControlState::Toggle {
                    label,
                    checked,
                    active,
                    ..
                } => {
                    let matches_label = match value {
                        FilterValue::Text(text) => text == label,
                        FilterValue::Range { .. } => false,
                    };
                    if advanced || matches_label {
                        *checked = false;
                        *active = false;
                    }
                }
                ControlState::Unbound => {}
            }
        }
    }

    pub fn clear_all(&mut self) {
        for control in &mut self.controls {
            match &mut control.state {
                ControlState::Text { value } => value.clear(),
                ControlState::Range {
                    value, default, ..
                } => restore_range(value, *default),
                ControlState::Toggle {
                    checked, active, ..
                } => {
                    *checked = false;
                    *active = false;
                }
                ControlState::Unbound => {}
            }
        }
    }

    fn by_category_mut<'a>(
        &'a mut self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a mut FilterControl> + 'a {
        self.controls
            .iter_mut()
            .filter(move |c| c.category == category)
    }
}

fn restore_range(shared: &Shared<String>, default: Option<f64>) {
    match default {
        Some(number) => shared.set(format_default(number)),
        None => shared.set(String::new()),
    }
}

fn format_default(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn control_state(scan: &ControlScan) -> ControlState {
    match &scan.input {
        Some(InputScan::Toggle {
            kind,
            label,
            checked,
        }) => ControlState::Toggle {
            kind: *kind,
            label: label.clone(),
            checked: *checked,
            active: false,
        },
        Some(InputScan::Text { value }) => ControlState::Text {
            value: value.clone(),
        },
        Some(InputScan::RangeEndpoint {
            side,
            value,
            default,
        }) => ControlState::Range {
            side: *side,
            value: Shared::new(value.clone()),
            default: *default,
        },
        None => ControlState::Unbound,
    }
}
