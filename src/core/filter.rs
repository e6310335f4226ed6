//! Pure derivations over the loaded catalog. No I/O, no store state.

use crate::core::collate::collate;
use crate::domain::model::{CountryFacet, FilterState, University};
use std::sync::Arc;

/// Stable ascending sort by name.
pub fn sort_by_name(universities: &mut [Arc<University>]) {
    universities.sort_by(|a, b| collate(&a.name, &b.name));
}

/// Distinct non-empty countries in collation order, behind the "All" sentinel.
pub fn country_facets(universities: &[Arc<University>]) -> Vec<CountryFacet> {
    let mut countries: Vec<&str> = universities
        .iter()
        .map(|u| u.country.as_str())
        .filter(|country| !country.is_empty())
        .collect();
    countries.sort_by(|a, b| collate(a, b));
    countries.dedup();

    std::iter::once(CountryFacet::all())
        .chain(countries.into_iter().map(CountryFacet::country))
        .collect()
}

/// Case-insensitive substring match on the name. The term is used as typed;
/// callers decide whether a blank term applies at all.
pub fn name_matches(university: &University, term: &str) -> bool {
    university
        .name
        .to_lowercase()
        .contains(&term.to_lowercase())
}

/// Keeps the names matching `term`; a blank term keeps everything.
pub fn search(list: &[Arc<University>], term: &str) -> Vec<Arc<University>> {
    if term.trim().is_empty() {
        return list.to_vec();
    }
    list.iter()
        .filter(|u| name_matches(u, term))
        .cloned()
        .collect()
}

/// Recomputes the visible list from the full catalog: country first, then
/// the search term when it is not blank. Relative order is preserved.
pub fn apply_filters(all: &[Arc<University>], filter: &FilterState) -> Vec<Arc<University>> {
    let in_country: Vec<Arc<University>> = all
        .iter()
        .filter(|u| !filter.has_country() || u.country == filter.selected_country)
        .cloned()
        .collect();
    search(&in_country, &filter.search_term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Arc<University>> {
        vec![
            Arc::new(University::new("Alpha Institute", "Canada")),
            Arc::new(University::new("Beta College", "Brazil")),
            Arc::new(University::new("Gamma University", "Canada")),
            Arc::new(University::new("Delta University", "")),
            Arc::new(University::new("Universidade Epsilon", "Brazil")),
        ]
    }

    fn names(list: &[Arc<University>]) -> Vec<&str> {
        list.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn test_facets_are_deduplicated_sorted_with_sentinel() {
        let facets = country_facets(&catalog());
        let labels: Vec<&str> = facets.iter().map(|f| f.label.as_str()).collect();

        assert_eq!(labels, vec!["All", "Brazil", "Canada"]);
        assert!(facets[0].is_all());
        assert_eq!(facets[0].value, "");
        assert_eq!(facets[2].value, "Canada");
    }

    #[test]
    fn test_facets_of_empty_catalog() {
        assert_eq!(country_facets(&[]), vec![CountryFacet::all()]);
    }

    #[test]
    fn test_sort_by_name() {
        let mut list = vec![
            Arc::new(University::new("Zeta U", "US")),
            Arc::new(University::new("alpha U", "US")),
            Arc::new(University::new("Beta U", "US")),
        ];
        sort_by_name(&mut list);
        assert_eq!(names(&list), vec!["alpha U", "Beta U", "Zeta U"]);
    }

    #[test]
    fn test_no_filters_returns_everything() {
        let all = catalog();
        let result = apply_filters(&all, &FilterState::default());
        assert_eq!(result.len(), all.len());
    }

    #[test]
    fn test_country_restriction_excludes_missing_country() {
        let filter = FilterState {
            search_term: String::new(),
            selected_country: "Canada".to_string(),
        };
        let result = apply_filters(&catalog(), &filter);
        assert_eq!(names(&result), vec!["Alpha Institute", "Gamma University"]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_scoped() {
        let filter = FilterState {
            search_term: "UNIVERSI".to_string(),
            selected_country: "Brazil".to_string(),
        };
        let result = apply_filters(&catalog(), &filter);
        assert_eq!(names(&result), vec!["Universidade Epsilon"]);
    }

    #[test]
    fn test_blank_search_returns_country_set_in_order() {
        let filter = FilterState {
            search_term: "   ".to_string(),
            selected_country: "Brazil".to_string(),
        };
        let result = apply_filters(&catalog(), &filter);
        assert_eq!(names(&result), vec!["Beta College", "Universidade Epsilon"]);
    }

    #[test]
    fn test_search_results_are_subset_matching_term() {
        let all = catalog();
        for term in ["u", "college", "ITY", "a", "zzz"] {
            let filter = FilterState {
                search_term: term.to_string(),
                selected_country: String::new(),
            };
            let result = apply_filters(&all, &filter);
            assert!(result.iter().all(|u| name_matches(u, term)));
            assert!(result.iter().all(|u| all.iter().any(|a| Arc::ptr_eq(a, u))));
        }
    }
}
