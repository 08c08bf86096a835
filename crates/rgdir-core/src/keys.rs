//! Cache keys
//!
//! A key is the entity kind followed by every parameter that affects the
//! query's result. Prefix matching on segments drives invalidation, so
//! `["conferences", "4"]` covers every conference query for member 4.

use std::fmt;

use rgdir_api::{MemberId, MemberListQuery, PublicationQuery};

pub const MEMBER: &str = "member";
pub const MEMBERS: &str = "members";
pub const PUBLICATIONS: &str = "publications";
pub const PUBLICATION_METADATA: &str = "publicationMetadata";
pub const WORK_TYPES: &str = "workTypes";
pub const COUNTS_BY_YEAR: &str = "memberCountsByYear";
pub const CONFERENCES: &str = "conferences";

/// Ordered key segments identifying one query
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    segments: Vec<String>,
}

impl QueryKey {
    /// Key consisting of the entity kind only
    pub fn new(kind: &str) -> Self {
        Self {
            segments: vec![kind.to_string()],
        }
    }

    /// Append a segment
    pub fn with(mut self, segment: impl ToString) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Append a set as its length followed by one segment per element.
    /// Element order does not affect the key.
    pub fn with_set<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        let mut values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
        values.sort_unstable();
        values.dedup();
        self.segments.push(values.len().to_string());
        self.segments.extend(values.into_iter().map(str::to_string));
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn kind(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    /// Whether `prefix`'s segments are a leading run of this key's segments
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    pub fn member(id: MemberId) -> Self {
        Self::new(MEMBER).with(id)
    }

    /// Every members-list query
    pub fn members_family() -> Self {
        Self::new(MEMBERS)
    }

    pub fn members(query: &MemberListQuery) -> Self {
        Self::members_family()
            .with(query.page)
            .with(query.size)
            .with(&query.sort)
    }

    /// Every publication-page query for a member
    pub fn publications_family(member_id: MemberId) -> Self {
        Self::new(PUBLICATIONS).with(member_id)
    }

    pub fn publications(query: &PublicationQuery) -> Self {
        Self::publications_family(query.member_id)
            .with(query.page)
            .with(query.size)
            .with(query.sort)
            .with_set(&query.types)
            .with_set(&query.tags)
    }

    pub fn publication_metadata(member_id: MemberId) -> Self {
        Self::new(PUBLICATION_METADATA).with(member_id)
    }

    pub fn work_types() -> Self {
        Self::new(WORK_TYPES)
    }

    pub fn counts_by_year(member_id: MemberId) -> Self {
        Self::new(COUNTS_BY_YEAR).with(member_id)
    }

    pub fn conferences(member_id: MemberId) -> Self {
        Self::new(CONFERENCES).with(member_id)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgdir_api::PublicationSort;

    fn query(types: &[&str], tags: &[&str]) -> PublicationQuery {
        PublicationQuery {
            member_id: 4,
            page: 0,
            size: 12,
            sort: PublicationSort::CitationsDesc,
            types: types.iter().map(|s| s.to_string()).collect(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn filter_order_does_not_change_key() {
        let a = QueryKey::publications(&query(&["article", "preprint"], &["ai"]));
        let b = QueryKey::publications(&query(&["preprint", "article"], &["ai"]));
        assert_eq!(a, b);
    }

    #[test]
    fn separators_inside_filter_values_do_not_collide() {
        let joined = QueryKey::publications(&query(&[], &["a,b"]));
        let split = QueryKey::publications(&query(&[], &["a", "b"]));
        assert_ne!(joined, split);

        let bracketed = QueryKey::publications(&query(&[], &["[a]"]));
        assert_ne!(bracketed, QueryKey::publications(&query(&[], &["a"])));
    }

    #[test]
    fn filter_values_do_not_move_between_sets() {
        let as_type = QueryKey::publications(&query(&["1", "x"], &[]));
        let as_tag = QueryKey::publications(&query(&["1"], &["x"]));
        assert_ne!(as_type, as_tag);
        assert_ne!(
            QueryKey::publications(&query(&["x"], &[])),
            QueryKey::publications(&query(&[], &["x"]))
        );
    }

    #[test]
    fn every_parameter_is_part_of_the_key() {
        let base = query(&[], &[]);
        let mut other_page = base.clone();
        other_page.page = 1;
        let mut other_size = base.clone();
        other_size.size = 24;
        let mut other_sort = base.clone();
        other_sort.sort = PublicationSort::Id;

        let key = QueryKey::publications(&base);
        assert_ne!(key, QueryKey::publications(&other_page));
        assert_ne!(key, QueryKey::publications(&other_size));
        assert_ne!(key, QueryKey::publications(&other_sort));
        assert_ne!(key, QueryKey::publications(&query(&["article"], &[])));
        assert_ne!(key, QueryKey::publications(&query(&[], &["article"])));
    }

    #[test]
    fn prefix_matching() {
        let key = QueryKey::publications(&query(&[], &[]));
        assert!(key.starts_with(&QueryKey::publications_family(4)));
        assert!(key.starts_with(&QueryKey::new(PUBLICATIONS)));
        assert!(!key.starts_with(&QueryKey::publications_family(40)));
        assert!(!QueryKey::member(4).starts_with(&QueryKey::member(40)));
        assert!(!QueryKey::member(4).starts_with(&QueryKey::new(MEMBERS)));
    }

    #[test]
    fn display_joins_segments() {
        assert_eq!(QueryKey::conferences(7).to_string(), "conferences/7");
        assert_eq!(QueryKey::work_types().kind(), WORK_TYPES);
    }
}
