//! Flat or grouped rendering of a publication page

use rgdir_api::{Page, Publication, PublicationSort};

use crate::grouping::{group_by_year, YearGroups, YearOrder};

/// What the publication list shows for the current sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationView {
    /// Year sorts: the whole list as an accordion
    Grouped(YearGroups),
    /// Other sorts: one page plus pagination totals
    Flat {
        items: Vec<Publication>,
        /// 1-based page shown
        page: u32,
        total_pages: u32,
        total_elements: u64,
    },
}

impl PublicationView {
    /// Derive the view for `data` fetched with `sort`.
    ///
    /// `page` is the 1-based page of the listing and only matters for flat
    /// views; `previously_open` carries the accordion state across renders.
    pub fn derive(
        data: &Page<Publication>,
        sort: PublicationSort,
        page: u32,
        previously_open: Option<&str>,
    ) -> Self {
        if !sort.is_year_based() {
            return PublicationView::Flat {
                items: data.content.clone(),
                page,
                total_pages: data.total_pages,
                total_elements: data.total_elements,
            };
        }
        let order = if sort.is_ascending() {
            YearOrder::OldestFirst
        } else {
            YearOrder::NewestFirst
        };
        PublicationView::Grouped(group_by_year(&data.content, order, previously_open))
    }

    pub fn groups(&self) -> Option<&YearGroups> {
        match self {
            PublicationView::Grouped(groups) => Some(groups),
            PublicationView::Flat { .. } => None,
        }
    }

    /// Open group label, only ever set for grouped views
    pub fn open_year(&self) -> Option<&str> {
        self.groups().and_then(YearGroups::open)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PublicationView::Grouped(groups) => groups.is_empty(),
            PublicationView::Flat { items, .. } => items.is_empty(),
        }
    }
}
