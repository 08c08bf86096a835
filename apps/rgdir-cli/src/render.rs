//! Plain-text rendering of directory data

use std::fmt::Write;

use comfy_table::{presets::UTF8_FULL, Table};

use rgdir_api::{Conference, Member, Page, Publication, PublicationMetadata, YearCount};
use rgdir_core::{plain_text, ListingState, PublicationView, YearGroups};

const AUTHORS_LIMIT: usize = 120;
const AUTHORS_KEEP: usize = 100;
const CHART_WIDTH: u64 = 40;

/// Shorten long author lists to their first 100 characters
pub fn truncate_authors(authors: &str) -> String {
    if authors.chars().count() > AUTHORS_LIMIT {
        let head: String = authors.chars().take(AUTHORS_KEEP).collect();
        format!("{}... and others", head)
    } else {
        authors.to_string()
    }
}

pub fn members_table(page: &Page<Member>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Name", "Works", "Citations"]);
    for member in &page.content {
        table.add_row(vec![
            member.id.to_string(),
            member.name.clone(),
            member.works_count.to_string(),
            member.cited_by_count.to_string(),
        ]);
    }
    table
}

pub fn conferences_table(conferences: &[Conference]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Year", "Location", "Description"]);
    for conference in conferences {
        table.add_row(vec![
            conference.name.clone(),
            conference.year.map(|y| y.to_string()).unwrap_or_default(),
            conference.location.clone().unwrap_or_default(),
            conference.description.clone().unwrap_or_default(),
        ]);
    }
    table
}

/// Name, photo, totals, and description. `photo_url` is `None` when the
/// member has no photo.
pub fn profile(member: &Member, photo_url: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", member.name, member.id);
    let _ = writeln!(out, "Photo: {}", photo_url.unwrap_or("(no photo)"));
    let _ = writeln!(
        out,
        "Works: {}  Citations: {}",
        member.works_count, member.cited_by_count
    );
    let description = member
        .description
        .as_deref()
        .map(plain_text)
        .unwrap_or_default();
    if description.is_empty() {
        let _ = writeln!(out, "No description yet.");
    } else {
        let _ = writeln!(out, "{}", description);
    }
    out
}

/// Horizontal bar chart of works per year, in the order given
pub fn year_chart(counts: &[YearCount]) -> String {
    let max = counts.iter().map(|c| c.count).max().unwrap_or(0);
    let mut out = String::new();
    for entry in counts {
        let width = if max == 0 {
            0
        } else {
            (entry.count * CHART_WIDTH).div_ceil(max)
        };
        let _ = writeln!(
            out,
            "{:>6} | {} {}",
            entry.year,
            "█".repeat(width as usize),
            entry.count
        );
    }
    out
}

/// Available filters with the selected ones checked
pub fn filters(metadata: &PublicationMetadata, listing: &ListingState) -> String {
    let mark = |selected: bool| if selected { "[x]" } else { "[ ]" };
    let mut out = String::new();
    let _ = write!(out, "Types:");
    for kind in &metadata.types {
        let _ = write!(out, " {} {}", mark(listing.selected_types().contains(kind)), kind);
    }
    let _ = write!(out, "\nTags:");
    for tag in &metadata.tags {
        let _ = write!(out, " {} {}", mark(listing.selected_tags().contains(tag)), tag);
    }
    out.push('\n');
    out
}

fn publication_line(out: &mut String, publication: &Publication, indent: &str) {
    let _ = writeln!(out, "{}#{} {}", indent, publication.id, publication.title);
    if let Some(authors) = publication.authors.as_deref().filter(|a| !a.trim().is_empty()) {
        let _ = writeln!(out, "{}    {}", indent, truncate_authors(authors));
    }

    let mut details = Vec::new();
    if let Some(year) = publication.publication_year {
        details.push(year.to_string());
    }
    if let Some(source) = &publication.source_name {
        details.push(source.clone());
    }
    details.push(
        publication
            .publication_type
            .clone()
            .unwrap_or_else(|| rgdir_core::DEFAULT_TYPE.to_string()),
    );
    details.push(format!("{} citations", publication.cited_by_count));
    let _ = writeln!(out, "{}    {}", indent, details.join(" · "));

    if !publication.tags.is_empty() {
        let _ = writeln!(out, "{}    tags: {}", indent, publication.tags.join(", "));
    }
    if let Some(url) = &publication.identifier_url {
        let _ = writeln!(out, "{}    {}", indent, url);
    }
}

fn grouped(out: &mut String, groups: &YearGroups) {
    for (label, items) in groups.iter() {
        let open = groups.is_open(label);
        let _ = writeln!(
            out,
            "{} {} ({})",
            if open { "▾" } else { "▸" },
            label,
            items.len()
        );
        if open {
            for publication in items {
                publication_line(out, publication, "  ");
            }
        }
    }
}

/// Publications as an accordion of years or a flat page
pub fn publications(view: &PublicationView) -> String {
    if view.is_empty() {
        return "No publications found.\n".to_string();
    }
    let mut out = String::new();
    match view {
        PublicationView::Grouped(groups) => grouped(&mut out, groups),
        PublicationView::Flat {
            items,
            page,
            total_pages,
            total_elements,
        } => {
            for publication in items {
                publication_line(&mut out, publication, "");
            }
            let _ = writeln!(
                out,
                "Page {} of {} ({} publications)",
                page, total_pages, total_elements
            );
        }
    }
    out
}
