//! Case-insensitive text matching for offline search.
//!
//! Each candidate is ranked by its best-matching field; lower is better:
//!
//! | Rank | Match                         |
//! |------|-------------------------------|
//! | 0    | field equals the query        |
//! | 1    | field starts with the query   |
//! | 2    | a word starts with the query  |
//! | 3    | query appears anywhere        |

pub(crate) type Rank = u8;

pub(crate) fn rank(query: &str, field: &str) -> Option<Rank> {
    let query = query.trim().to_lowercase();
    let field = field.to_lowercase();
    if query.is_empty() {
        return None;
    }
    if field == query {
        Some(0)
    } else if field.starts_with(&query) {
        Some(1)
    } else if field.split_whitespace().any(|word| word.starts_with(&query)) {
        Some(2)
    } else if field.contains(&query) {
        Some(3)
    } else {
        None
    }
}

/// Items matching `query` in any of their fields, best first. Items of equal
/// rank keep their input order.
pub(crate) fn search_by<T, F>(items: Vec<T>, query: &str, fields: F) -> Vec<(Rank, T)>
where
    F: Fn(&T) -> Vec<String>,
{
    let mut matches: Vec<(Rank, T)> = items
        .into_iter()
        .filter_map(|item| {
            fields(&item)
                .iter()
                .filter_map(|field| rank(query, field))
                .min()
                .map(|rank| (rank, item))
        })
        .collect();
    matches.sort_by_key(|(rank, _)| *rank);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_ordering() {
        assert_eq!(rank("get lucky", "Get Lucky"), Some(0));
        assert_eq!(rank("get", "Get Lucky"), Some(1));
        assert_eq!(rank("luck", "Get Lucky"), Some(2));
        assert_eq!(rank("ucky", "Get Lucky"), Some(3));
        assert_eq!(rank("disco", "Get Lucky"), None);
        assert_eq!(rank("  ", "Get Lucky"), None);
    }

    #[test]
    fn test_search_by_uses_best_field() {
        let items = vec![
            ("Harder Better", "Daft Punk"),
            ("Punk Rock", "Someone"),
            ("Quiet", "Nobody"),
        ];
        let results = search_by(items, "punk", |(title, artist)| {
            vec![title.to_string(), artist.to_string()]
        });

        let titles: Vec<&str> = results.iter().map(|(_, (title, _))| *title).collect();
        assert_eq!(titles, vec!["Punk Rock", "Harder Better"]);
        assert_eq!(results[0].0, 1);
        assert_eq!(results[1].0, 2);
    }
}
