//! Query string options of resource list and get routes.

use std::collections::HashMap;
use std::sync::LazyLock;

use actix_web::web;
use regex::Regex;

use restgate_core::ports::{FindOptions, Populate, SortField};

static POPULATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z,]+$").expect("Invalid regex"));
static SORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z,-]+$").expect("Invalid regex"));
static COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("Invalid regex"));

/// Parse `populate`, `sort`, `limit` and `skip`.
///
/// Invalid values are logged and ignored, never rejected.
pub fn parse_query_parameters(query: &str) -> FindOptions {
    let params = match web::Query::<HashMap<String, String>>::from_query(query) {
        Ok(params) => params.into_inner(),
        Err(e) => {
            tracing::warn!(query = %query, error = %e, "Ignoring unparsable query string");
            return FindOptions::default();
        }
    };

    FindOptions {
        populate: params.get("populate").map_or(Populate::None, |v| populate(v)),
        sort: params.get("sort").map(|v| sort(v)).unwrap_or_default(),
        limit: params.get("limit").and_then(|v| count("limit", v)),
        skip: params.get("skip").and_then(|v| count("skip", v)),
    }
}

fn populate(value: &str) -> Populate {
    if value == "true" {
        return Populate::All;
    }
    if !POPULATE.is_match(value) {
        tracing::warn!(populate = %value, "Invalid populate parameter");
        return Populate::None;
    }

    Populate::Fields(
        value
            .split(',')
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect(),
    )
}

fn sort(value: &str) -> Vec<SortField> {
    if !SORT.is_match(value) {
        tracing::warn!(sort = %value, "Invalid sort parameter");
        return Vec::new();
    }

    value.split(',').filter_map(SortField::parse).collect()
}

fn count(name: &str, value: &str) -> Option<u64> {
    let parsed = COUNT
        .is_match(value)
        .then(|| value.parse().ok())
        .flatten();
    if parsed.is_none() {
        tracing::warn!(parameter = %name, value = %value, "Invalid paging parameter");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query() {
        assert_eq!(parse_query_parameters(""), FindOptions::default());
    }

    #[test]
    fn test_valid_parameters() {
        let options = parse_query_parameters("populate=author,readers&sort=-login,age&limit=2&skip=1");

        assert_eq!(
            options.populate,
            Populate::Fields(vec!["author".to_string(), "readers".to_string()])
        );
        assert_eq!(
            options.sort,
            vec![
                SortField::parse("-login").unwrap(),
                SortField::parse("age").unwrap()
            ]
        );
        assert_eq!(options.limit, Some(2));
        assert_eq!(options.skip, Some(1));
    }

    #[test]
    fn test_populate_true_means_all() {
        assert_eq!(parse_query_parameters("populate=true").populate, Populate::All);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let options = parse_query_parameters("populate=a.b&sort=login;drop&limit=-1&skip=abc");

        assert_eq!(options, FindOptions::default());
    }

    #[test]
    fn test_valid_and_invalid_mix() {
        let options = parse_query_parameters("sort=login&limit=ten");

        assert_eq!(options.sort, vec![SortField::parse("login").unwrap()]);
        assert_eq!(options.limit, None);
    }
}
