//! Small stateless helpers shared by the manager and the CLI.

/// Calendar helpers. "Today" is always passed in explicitly so callers and
/// tests control the clock; [`date::today`] reads the local one.
pub mod date {
    use std::fmt::Write;

    use chrono::{Local, NaiveDate};

    use crate::error::{Error, Result};

    pub const ISO_DATE: &str = "%Y-%m-%d";

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Parse a `YYYY-MM-DD` date.
    pub fn parse_date(input: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(input.trim(), ISO_DATE)
            .map_err(|_| Error::Validation(format!("invalid date format: {input} (expected YYYY-MM-DD)")))
    }

    pub fn format_date(date: NaiveDate, format: &str) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", date.format(format))
            .map_err(|_| Error::InvalidArgument(format!("invalid date format string: {format}")))?;
        Ok(out)
    }

    /// Negative when `due` is already behind `today`.
    pub fn days_until(due: NaiveDate, today: NaiveDate) -> i64 {
        (due - today).num_days()
    }

    pub fn is_overdue(due: NaiveDate, today: NaiveDate) -> bool {
        due < today
    }

    pub fn is_due_today(due: NaiveDate, today: NaiveDate) -> bool {
        due == today
    }
}

pub mod validate {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
    });
    static USERNAME_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]{3,20}$").expect("valid username regex"));

    pub fn is_valid_email(email: &str) -> bool {
        EMAIL_RE.is_match(email)
    }

    /// 3-20 characters of ASCII letters, digits and underscores.
    pub fn is_valid_username(username: &str) -> bool {
        USERNAME_RE.is_match(username)
    }

    /// Length in characters, bounds inclusive.
    pub fn is_valid_length(value: &str, min: usize, max: usize) -> bool {
        let len = value.chars().count();
        min <= len && len <= max
    }
}

pub mod text {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static NON_SLUG_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid slug filter regex"));
    static SLUG_SEPARATOR_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[-\s]+").expect("valid slug separator regex"));

    /// Cut `text` to at most `max` characters, ending in `suffix` when cut.
    pub fn truncate(text: &str, max: usize, suffix: &str) -> String {
        if text.chars().count() <= max {
            return text.to_string();
        }
        let keep = max.saturating_sub(suffix.chars().count());
        let mut out: String = text.chars().take(keep).collect();
        out.push_str(suffix);
        out
    }

    pub fn to_slug(text: &str) -> String {
        let lowered = text.trim().to_lowercase();
        let filtered = NON_SLUG_RE.replace_all(&lowered, "");
        SLUG_SEPARATOR_RE.replace_all(&filtered, "-").into_owned()
    }

    pub fn capitalize_words(text: &str) -> String {
        text.split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(|c| c.to_lowercase()))
                        .collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

pub mod list {
    use std::collections::HashSet;
    use std::hash::Hash;

    /// Split into consecutive chunks of `size`; a zero size yields nothing.
    pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
        if size == 0 {
            return Vec::new();
        }
        items.chunks(size).map(|c| c.to_vec()).collect()
    }

    pub fn flatten<T>(nested: Vec<Vec<T>>) -> Vec<T> {
        nested.into_iter().flatten().collect()
    }

    /// Drop repeated items, keeping first occurrences in order.
    pub fn unique<T: Eq + Hash + Clone>(items: Vec<T>) -> Vec<T> {
        let mut seen = HashSet::new();
        items
            .into_iter()
            .filter(|item| seen.insert(item.clone()))
            .collect()
    }
}
