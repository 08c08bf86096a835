//! Publication listing state: filters, sort, page size, current page
//!
//! Anything that can change which publications make up the result set sends
//! the listing back to page 1.

use std::collections::BTreeSet;

use rgdir_api::{MemberId, PublicationQuery, PublicationSort};

/// Page size used for year sorts, large enough to return every publication
pub const UNBOUNDED_PAGE_SIZE: u32 = 9999;

/// Page sizes offered for paginated sorts
pub const PAGE_SIZE_CHOICES: [u32; 3] = [12, 24, 36];

pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Selection state behind one member's publication list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingState {
    /// 1-based page shown in paginated sorts
    page: u32,
    page_size: u32,
    sort: PublicationSort,
    types: BTreeSet<String>,
    tags: BTreeSet<String>,
}

impl Default for ListingState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: PublicationSort::default(),
            types: BTreeSet::new(),
            tags: BTreeSet::new(),
        }
    }
}

impl ListingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> PublicationSort {
        self.sort
    }

    pub fn selected_types(&self) -> &BTreeSet<String> {
        &self.types
    }

    pub fn selected_tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_filters(&self) -> bool {
        !self.types.is_empty() || !self.tags.is_empty()
    }

    /// Year sorts show one grouped, unpaginated list
    pub fn is_paginated(&self) -> bool {
        !self.sort.is_year_based()
    }

    /// Add the type if absent, remove it if present
    pub fn toggle_type(&mut self, publication_type: &str) {
        toggle(&mut self.types, publication_type);
        self.page = 1;
    }

    /// Add the tag if absent, remove it if present
    pub fn toggle_tag(&mut self, tag: &str) {
        toggle(&mut self.tags, tag);
        self.page = 1;
    }

    /// Empty both filter sets at once
    pub fn clear_filters(&mut self) {
        self.types.clear();
        self.tags.clear();
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: PublicationSort) {
        if self.sort != sort {
            self.sort = sort;
            self.page = 1;
        }
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        let page_size = page_size.max(1);
        if self.page_size != page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    /// Jump to a 1-based page; values below 1 clamp to 1
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Query for the current state. Year sorts request page 0 with
    /// [`UNBOUNDED_PAGE_SIZE`] so the whole list can be grouped.
    pub fn query(&self, member_id: MemberId) -> PublicationQuery {
        let (page, size) = if self.sort.is_year_based() {
            (0, UNBOUNDED_PAGE_SIZE)
        } else {
            (self.page - 1, self.page_size)
        };

        PublicationQuery {
            member_id,
            page,
            size,
            sort: self.sort,
            types: self.types.iter().cloned().collect(),
            tags: self.tags.iter().cloned().collect(),
        }
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}
