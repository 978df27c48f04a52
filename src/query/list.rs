//! The immutable listing query.

use std::cmp::Ordering;

use super::page::{Page, Paged};
use super::predicate::{Entity, Field, Predicate, PredicateContext, RowView};
use super::sort::{SortDirection, SortKey};
use crate::error::{ForumError, ForumResult};

/// A filtered, sorted, paginated listing over one entity.
///
/// Builder methods consume and return the query, so a value handed to a
/// store is never mutated behind its back. Fetch and count are both derived
/// from [`ListQuery::predicates`], which keeps `total` consistent with the
/// rows a page can contain.
///
/// ```
/// use forum_kernel::query::{ListQuery, Page, PostSort, SortDirection};
///
/// let query = ListQuery::<PostSort>::new()
///     .search("rust")
///     .not_deleted()
///     .sorted_by(PostSort::Score, SortDirection::Descending)
///     .paged(Page::new(2, 20));
///
/// assert_eq!(query.predicates().len(), 2);
/// assert_eq!(query.page().offset(), 20);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<S: SortKey> {
    predicates: Vec<Predicate>,
    sort: S,
    direction: SortDirection,
    page: Page,
}

impl<S: SortKey> Default for ListQuery<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SortKey> ListQuery<S> {
    /// Unfiltered query with the entity's default ordering.
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            sort: S::default(),
            direction: SortDirection::default(),
            page: Page::default(),
        }
    }

    /// Entity being listed.
    pub fn entity(&self) -> Entity {
        S::ENTITY
    }

    /// Add a conjunct.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add a conjunct when `predicate` is `Some`.
    pub fn filter_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(predicate) => self.filter(predicate),
            None => self,
        }
    }

    /// Case-insensitive substring search on the entity's search column.
    /// The needle is matched as given, surrounding whitespace included; an
    /// empty needle imposes nothing.
    pub fn search(self, needle: &str) -> Self {
        if needle.is_empty() {
            return self;
        }
        let field = S::ENTITY.search_field();
        self.filter(Predicate::Contains {
            field,
            needle: needle.to_string(),
        })
    }

    /// Exact match on an id column.
    pub fn equals(self, field: Field, value: impl Into<i64>) -> Self {
        self.filter(Predicate::Equals {
            field,
            value: value.into(),
        })
    }

    /// Hide tombstoned rows.
    pub fn not_deleted(self) -> Self {
        self.filter(Predicate::NotDeleted)
    }

    /// Set ordering.
    pub fn sorted_by(mut self, sort: S, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    /// Set pagination.
    pub fn paged(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    /// The conjuncts, in insertion order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Sort key.
    pub fn sort(&self) -> S {
        self.sort
    }

    /// Sort direction.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Pagination.
    pub fn page(&self) -> Page {
        self.page
    }

    /// Reject predicates that do not apply to this entity.
    pub fn validate(&self) -> ForumResult<()> {
        for predicate in &self.predicates {
            if !predicate.applies_to(S::ENTITY) {
                return Err(ForumError::validation(format!(
                    "filter {:?} does not apply to {}",
                    predicate,
                    S::ENTITY.table()
                )));
            }
        }
        Ok(())
    }

    /// Whether `row` satisfies every conjunct.
    pub fn matches<R, C>(&self, row: &R, ctx: &C) -> bool
    where
        R: RowView + ?Sized,
        C: PredicateContext + ?Sized,
    {
        self.predicates.iter().all(|p| p.matches(row, ctx))
    }

    /// Listing order: the sort key, then id, both in the query's direction.
    pub fn compare<R: RowView + ?Sized>(&self, a: &R, b: &R) -> Ordering {
        let field = self.sort.field();
        let primary = a.sort_value(field).cmp(&b.sort_value(field));
        self.direction.apply(primary.then_with(|| a.id().cmp(&b.id())))
    }

    /// Filter, order and paginate in-memory rows.
    pub fn select<'a, R, C, I>(&self, rows: I, ctx: &C) -> Paged<&'a R>
    where
        R: RowView + 'a,
        C: PredicateContext + ?Sized,
        I: IntoIterator<Item = &'a R>,
    {
        let mut matched: Vec<&R> = rows
            .into_iter()
            .filter(|row| self.matches(*row, ctx))
            .collect();
        let total = matched.len() as i64;

        matched.sort_by(|a, b| self.compare(*a, *b));

        let offset = usize::try_from(self.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.page.limit()).unwrap_or(usize::MAX);
        let items = matched.into_iter().skip(offset).take(limit).collect();

        Paged::new(items, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::sort::{PostSort, TopicSort};
    use crate::types::{CommentId, CommentPath, TopicId, UserId};
    use chrono::{DateTime, Utc};

    struct Row {
        id: i64,
        name: String,
        score: i64,
    }

    impl RowView for Row {
        fn id(&self) -> i64 {
            self.id
        }
        fn int(&self, field: Field) -> Option<i64> {
            match field {
                Field::Id => Some(self.id),
                Field::Score | Field::NoOfPosts => Some(self.score),
                _ => None,
            }
        }
        fn text(&self, field: Field) -> Option<&str> {
            matches!(field, Field::Title | Field::Name).then_some(self.name.as_str())
        }
        fn time(&self, _field: Field) -> Option<DateTime<Utc>> {
            None
        }
    }

    struct NoCtx;

    impl PredicateContext for NoCtx {
        fn follows(&self, _user: UserId, _topic: TopicId) -> bool {
            false
        }
        fn comment_path(&self, _id: CommentId) -> Option<CommentPath> {
            None
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, name: "alpha".into(), score: 5 },
            Row { id: 2, name: "beta".into(), score: 5 },
            Row { id: 3, name: "gamma".into(), score: 9 },
            Row { id: 4, name: "alphabet".into(), score: -1 },
        ]
    }

    #[test]
    fn test_empty_search_is_ignored() {
        let query = ListQuery::<PostSort>::new().search("");
        assert!(query.predicates().is_empty());
    }

    #[test]
    fn test_search_keeps_surrounding_whitespace() {
        let query = ListQuery::<PostSort>::new().search(" foo");
        assert_eq!(
            query.predicates(),
            &[Predicate::Contains {
                field: Field::Title,
                needle: " foo".to_string(),
            }]
        );
    }

    #[test]
    fn test_validate_rejects_foreign_filters() {
        let ok = ListQuery::<PostSort>::new().search("x").not_deleted();
        assert!(ok.validate().is_ok());

        let bad = ListQuery::<TopicSort>::new().not_deleted();
        assert!(matches!(bad.validate(), Err(ForumError::Validation(_))));
    }

    #[test]
    fn test_select_orders_with_id_tie_break() {
        let data = rows();
        let query = ListQuery::<PostSort>::new().sorted_by(PostSort::Score, SortDirection::Descending);
        let page = query.select(&data, &NoCtx);
        let ids: Vec<i64> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1, 4]);

        let asc = query.sorted_by(PostSort::Score, SortDirection::Ascending);
        let ids: Vec<i64> = asc.select(&data, &NoCtx).items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 1, 2, 3]);
    }

    #[test]
    fn test_select_counts_before_paging() {
        let data = rows();
        let query = ListQuery::<TopicSort>::new()
            .search("ALPHA")
            .sorted_by(TopicSort::Name, SortDirection::Ascending)
            .paged(Page::new(2, 1));
        let page = query.select(&data, &NoCtx);
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "alphabet");
    }
}
