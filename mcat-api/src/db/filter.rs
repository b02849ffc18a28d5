//! Compile [`Filter`] trees and sort keys into SQL
//!
//! Values are always bound parameters. Column names come only from the
//! closed enums in `mcat_common::query`.

use mcat_common::query::{Filter, SearchField};
use mcat_common::{SortDirection, SortField};
use sqlx::{QueryBuilder, Sqlite};

/// Folded shadow column searched for `field`
fn folded_column(field: SearchField) -> &'static str {
    match field {
        SearchField::Title => "title_folded",
        SearchField::Artist => "artist_folded",
    }
}

/// Append `filter` as a boolean SQL expression
pub fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    match filter {
        Filter::MatchAll => {
            query.push("1 = 1");
        }
        Filter::Contains { field, term } => {
            // instr() is a literal match: no LIKE wildcards to escape
            query
                .push("instr(")
                .push(folded_column(*field))
                .push(", ")
                .push_bind(term.clone())
                .push(") > 0");
        }
        Filter::Equals { field, value } => {
            query.push(field.column()).push(" = ").push_bind(value.clone());
        }
        Filter::IsFavorite(flag) => {
            query.push("is_favorite = ").push_bind(*flag);
        }
        Filter::And(filters) => push_group(query, filters, " AND ", "1 = 1"),
        Filter::Or(filters) => push_group(query, filters, " OR ", "1 = 0"),
    }
}

fn push_group(query: &mut QueryBuilder<'_, Sqlite>, filters: &[Filter], joiner: &str, empty: &str) {
    if filters.is_empty() {
        query.push(empty);
        return;
    }

    query.push("(");
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            query.push(joiner);
        }
        push_filter(query, filter);
    }
    query.push(")");
}

/// Append `ORDER BY`, with the id as tie-breaker so paging is stable
pub fn push_order(query: &mut QueryBuilder<'_, Sqlite>, key: SortField, direction: SortDirection) {
    query
        .push(" ORDER BY ")
        .push(key.column())
        .push(" ")
        .push(direction.sql())
        .push(", guid ASC");
}
