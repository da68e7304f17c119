use std::borrow::Cow;

const NBSP: char = '\u{a0}';

/// Collapses runs of whitespace (including non-breaking spaces) into a
/// single space and trims the ends.
pub fn normalize_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_gap = false;
    for ch in value.chars() {
        if ch.is_whitespace() || ch == NBSP {
            in_gap = true;
            continue;
        }
        if in_gap && !out.is_empty() {
            out.push(' ');
        }
        in_gap = false;
        out.push(ch);
    }
    out
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Maps a category name onto the dataset key its `data-*` attribute is
/// exposed under, e.g. `"release-date"` -> `"releaseDate"`.
pub fn dataset_key(category: &str) -> String {
    let mut out = String::with_capacity(category.len());
    let mut upper_next = false;
    for ch in category.chars() {
        if ch == '-' || ch.is_whitespace() {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Dataset key for a raw `data-*` attribute name ("data-release-date").
pub fn dataset_key_from_attr(attr: &str) -> Option<String> {
    let rest = attr.strip_prefix("data-")?;
    if rest.is_empty() {
        return None;
    }
    Some(dataset_key(rest))
}

/// Numeric parse with `parseFloat` semantics: a valid leading numeric
/// prefix is enough, trailing junk is ignored.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if idx == 0 => {}
            '.' if !seen_dot => seen_dot = true,
            c if c.is_ascii_digit() => seen_digit = true,
            _ => break,
        }
        end = idx + ch.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    trimmed[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Splits a `category=value` flag, keeping `=` inside the value intact.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected format CATEGORY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty category in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Splits a `category=from:to` range flag. Either side may be blank for
/// an open bound, but not both.
pub fn parse_range_flag(raw: &str) -> Result<(String, Option<f64>, Option<f64>), String> {
    let (category, bounds) = parse_key_value(raw)?;
    let (lo, hi) = bounds
        .split_once(':')
        .ok_or_else(|| format!("expected format CATEGORY=FROM:TO, got '{raw}'"))?;
    let parse_side = |side: &str, name: &str| -> Result<Option<f64>, String> {
        let side = side.trim();
        if side.is_empty() {
            return Ok(None);
        }
        parse_number(side)
            .map(Some)
            .ok_or_else(|| format!("invalid {name} bound '{side}' in '{raw}'"))
    };
    let from = parse_side(lo, "lower")?;
    let to = parse_side(hi, "upper")?;
    if from.is_none() && to.is_none() {
        return Err(format!("range '{raw}' has no bounds"));
    }
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(format!("range '{raw}' has FROM greater than TO"));
        }
    }
    Ok((category, from, to))
}

pub fn truncate_chars(value: &str, limit: usize) -> Cow<'_, str> {
    match value.char_indices().nth(limit) {
        Some((idx, _)) => Cow::Owned(format!("{}…", &value[..idx])),
        None => Cow::Borrowed(value),
    }
}
