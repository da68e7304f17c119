use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::record::{ItemStore, Record};
use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A `key-direction` pair from the sort selector, e.g. `"price-asc"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortOrder {
    pub key: String,
    pub direction: Direction,
}

impl SortOrder {
    /// The direction is the suffix after the last hyphen, so keys may
    /// themselves contain hyphens (`release-date-desc`).
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let (key, direction) = trimmed.rsplit_once('-')?;
        let direction = match direction.trim().to_lowercase().as_str() {
            "asc" => Direction::Asc,
            "desc" => Direction::Desc,
            _ => return None,
        };
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            direction,
        })
    }
}

/// Stable in-place sort of the filtered id list. Ties keep their
/// current relative order.
pub fn sort_filtered(store: &mut ItemStore, order: &SortOrder) {
    let key = utils::dataset_key(&order.key);
    let mut ids: Vec<usize> = store.filtered().to_vec();
    ids.sort_by(|&a, &b| {
        let ord = match (store.get(a), store.get(b)) {
            (Some(ra), Some(rb)) => compare_records(ra, rb, &key),
            _ => Ordering::Equal,
        };
        match order.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        }
    });
    store.set_filtered(ids);
}

fn compare_records(a: &Record, b: &Record, dataset_key: &str) -> Ordering {
    let av = a.attribute(dataset_key).unwrap_or_default();
    let bv = b.attribute(dataset_key).unwrap_or_default();
    compare_values(av, bv)
}

/// Numeric if both sides parse, else chronological if both parse as
/// dates, else case-insensitive lexical.
fn compare_values(a: &str, b: &str) -> Ordering {
    if let (Some(x), Some(y)) = (utils::parse_number(a), utils::parse_number(b)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    if let (Some(x), Some(y)) = (parse_date(a), parse_date(b)) {
        return x.cmp(&y);
    }
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y", "%d %b %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
