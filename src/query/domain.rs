use serde::{Serialize, Deserialize};
use crate::query::ast::OrQuery;

/// Which part of the source data the store is known to hold in full.
///
/// A store that is not fully loaded can still answer a query completely
/// when the query selects a subset of one of the declared complete queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainDescription {
    pub is_fully_loaded: bool,
    pub complete_queries: Vec<OrQuery>,
    pub description: String,
}

impl DomainDescription {
    pub fn fully_loaded() -> Self {
        DomainDescription {
            is_fully_loaded: true,
            ..DomainDescription::default()
        }
    }

    pub fn with_complete_query(mut self, query: OrQuery) -> Self {
        self.complete_queries.push(query);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.is_fully_loaded && self.complete_queries.is_empty()
    }

    /// Whether every record matching `query` is guaranteed to be present
    pub fn covers(&self, query: &OrQuery) -> bool {
        if self.is_fully_loaded {
            return true;
        }
        // full text only narrows the structured part; an empty OrQuery means everything
        let conjunctions = if query.elements.is_empty() {
            vec![Default::default()]
        } else {
            query.elements.clone()
        };

        conjunctions.iter().all(|and| {
            self.complete_queries
                .iter()
                .flat_map(|complete| complete.elements.iter())
                .any(|complete| and.is_subset_of(complete))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::{AndQuery, AtomicQuery};

    #[test]
    fn test_covers_narrower_queries() {
        let london = AndQuery::new().with(AtomicQuery::eq("desk", "london"));
        let domain = DomainDescription::default()
            .with_complete_query(OrQuery::new().with(london.clone()));

        let narrower = OrQuery::new().with(london.clone().with(AtomicQuery::gt("amount", 10)));
        assert!(domain.covers(&narrower));
        assert!(domain.covers(&OrQuery::new().with(london).with_full_text("bond")));

        let other = OrQuery::single(AtomicQuery::eq("desk", "paris"));
        assert!(!domain.covers(&other));
        assert!(!domain.covers(&OrQuery::all()));
        assert!(DomainDescription::fully_loaded().covers(&OrQuery::all()));
    }
}
