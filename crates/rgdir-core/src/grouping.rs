//! Year-grouped publication view
//!
//! Publications are partitioned by publication year and shown as an
//! accordion with at most one group open. Recomputed from scratch whenever
//! the list or the sort direction changes.

use std::cmp::Ordering;
use std::collections::HashMap;

use rgdir_api::Publication;

/// Group label for publications without a year
pub const UNKNOWN_YEAR: &str = "Unknown Year";

/// Direction of the year ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearOrder {
    NewestFirst,
    OldestFirst,
}

/// Publications grouped by year, in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearGroups {
    keys: Vec<String>,
    groups: HashMap<String, Vec<Publication>>,
    open: Option<String>,
}

/// Group label of a publication
pub fn year_label(publication: &Publication) -> String {
    match publication.publication_year {
        Some(year) => year.to_string(),
        None => UNKNOWN_YEAR.to_string(),
    }
}

/// Order two labels; [`UNKNOWN_YEAR`] sorts last in both directions.
fn compare_labels(a: &str, b: &str, order: YearOrder) -> Ordering {
    match (a == UNKNOWN_YEAR, b == UNKNOWN_YEAR) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ya = a.parse::<i64>().unwrap_or_default();
            let yb = b.parse::<i64>().unwrap_or_default();
            match order {
                YearOrder::NewestFirst => yb.cmp(&ya),
                YearOrder::OldestFirst => ya.cmp(&yb),
            }
        }
    }
}

/// Partition `publications` by year.
///
/// The previously open group stays open if it still exists; otherwise the
/// first group opens. With no publications nothing is open. Order within a
/// group follows the input.
pub fn group_by_year(
    publications: &[Publication],
    order: YearOrder,
    previously_open: Option<&str>,
) -> YearGroups {
    let mut groups: HashMap<String, Vec<Publication>> = HashMap::new();
    for publication in publications {
        groups
            .entry(year_label(publication))
            .or_default()
            .push(publication.clone());
    }

    let mut keys: Vec<String> = groups.keys().cloned().collect();
    keys.sort_by(|a, b| compare_labels(a, b, order));

    let open = match previously_open {
        Some(label) if groups.contains_key(label) => Some(label.to_string()),
        _ => keys.first().cloned(),
    };

    YearGroups { keys, groups, open }
}

impl YearGroups {
    /// Group labels in display order
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Publications under `label`, in input order
    pub fn group(&self, label: &str) -> &[Publication] {
        self.groups.get(label).map(Vec::as_slice).unwrap_or_default()
    }

    /// `(label, publications)` pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Publication])> {
        self.keys
            .iter()
            .map(move |k| (k.as_str(), self.group(k)))
    }

    pub fn open(&self) -> Option<&str> {
        self.open.as_deref()
    }

    pub fn is_open(&self, label: &str) -> bool {
        self.open.as_deref() == Some(label)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Total publications across all groups
    pub fn publication_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Accordion click: closes the open group, opens any other existing one.
    pub fn toggle(&mut self, label: &str) {
        if self.is_open(label) {
            self.open = None;
        } else if self.groups.contains_key(label) {
            self.open = Some(label.to_string());
        }
    }

    /// Swap in a patched publication wherever it appears
    pub fn replace(&mut self, updated: &Publication) {
        for group in self.groups.values_mut() {
            if let Some(slot) = group.iter_mut().find(|p| p.id == updated.id) {
                *slot = updated.clone();
            }
        }
    }
}
