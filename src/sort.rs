use crate::models::MovieEntry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Columns the collection view can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Id,
    Name,
    ImdbId,
    Seen,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn toggled(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

impl SortKey {
    /// Direction applied the first time a column header is clicked. The
    /// default view already shows id ascending, so every column starts
    /// descending.
    pub fn initial_direction(self) -> Direction {
        match self {
            SortKey::Id
            | SortKey::Name
            | SortKey::ImdbId
            | SortKey::Seen
            | SortKey::Rating => Direction::Descending,
        }
    }
}

/// Current sort choice of the collection view. Clicking the active column
/// flips its direction; clicking another column switches to it with that
/// column's initial direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: Direction,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            key: SortKey::Id,
            direction: Direction::Ascending,
        }
    }
}

impl SortOrder {
    pub fn click(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.toggled();
        } else {
            *self = SortOrder {
                key,
                direction: key.initial_direction(),
            };
        }
    }
}

/// Produce a deterministically ordered view of the collection map.
///
/// The map has no inherent order, so rows are first put in ascending id
/// order (insertion order, since the backend hands out increasing ids) and
/// the requested sort is applied stably on top. Equal keys therefore keep
/// their relative id order.
pub fn sort_movies(movies: &HashMap<String, MovieEntry>, order: SortOrder) -> Vec<MovieEntry> {
    let mut rows: Vec<MovieEntry> = movies.values().cloned().collect();
    rows.sort_by_key(|m| m.id);
    rows.sort_by(|a, b| {
        let ord = compare(a, b, order.key);
        match order.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
    rows
}

fn compare(a: &MovieEntry, b: &MovieEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::ImdbId => a.imdb_id.cmp(&b.imdb_id),
        SortKey::Seen => a.seen.cmp(&b.seen),
        SortKey::Rating => a.rating.cmp(&b.rating),
    }
}
