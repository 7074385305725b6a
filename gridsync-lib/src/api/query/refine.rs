//! Client-side refinement of a fetched page.

use super::Refinement;
use crate::model::Row;

/// What the apparent total counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalScope {
    /// The server's total across all pages.
    Server,
    /// Only the rows of the current page that survived refinement. The true
    /// cross-page total is unknown.
    PageLocal,
}

/// The refined rows of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Refined {
    pub rows: Vec<Row>,
    pub apparent_total: u64,
    pub scope: TotalScope,
}

/// Keeps rows whose every refined field contains its needle,
/// case-insensitively. A row without the field does not match.
///
/// With refinements present, the apparent total is the refined count of this
/// page only. Without them the server's total passes through.
pub fn refine(rows: Vec<Row>, refinements: &[Refinement], server_total: u64) -> Refined {
    if refinements.is_empty() {
        return Refined {
            rows,
            apparent_total: server_total,
            scope: TotalScope::Server,
        };
    }

    let needles: Vec<(&str, String)> = refinements
        .iter()
        .map(|r| (r.field.as_str(), r.needle.to_lowercase()))
        .collect();

    let rows: Vec<Row> = rows
        .into_iter()
        .filter(|row| {
            needles.iter().all(|(field, needle)| {
                row.text(field)
                    .is_some_and(|text| text.to_lowercase().contains(needle.as_str()))
            })
        })
        .collect();

    Refined {
        apparent_total: rows.len() as u64,
        rows,
        scope: TotalScope::PageLocal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<Row> {
        [
            ("1", "Andrew", "andrew@example.com"),
            ("2", "Hannah", "hannah@mail.org"),
            ("3", "Bob", "bob@example.com"),
            ("4", "DAN", "dan@example.com"),
            ("5", "Eve", "eve@mail.org"),
        ]
        .into_iter()
        .map(|(id, name, email)| Row::new(id).set("name", name).set("email", email))
        .collect()
    }

    fn ids(refined: &Refined) -> Vec<&str> {
        refined.rows.iter().map(|r| r.id().as_str()).collect()
    }

    #[test]
    fn test_name_substring_is_case_insensitive_and_page_local() {
        let refinements = [Refinement { field: "name".into(), needle: "an".into() }];
        let refined = refine(users(), &refinements, 42);

        assert_eq!(ids(&refined), ["1", "2", "4"]);
        assert_eq!(refined.apparent_total, 3);
        assert_eq!(refined.scope, TotalScope::PageLocal);
    }

    #[test]
    fn test_fields_combine_with_and() {
        let refinements = [
            Refinement { field: "name".into(), needle: "an".into() },
            Refinement { field: "email".into(), needle: "EXAMPLE".into() },
        ];
        let refined = refine(users(), &refinements, 42);
        assert_eq!(ids(&refined), ["1", "4"]);
    }

    #[test]
    fn test_missing_field_does_not_match() {
        let rows = vec![Row::new("1"), Row::new("2").set("name", "Ann")];
        let refinements = [Refinement { field: "name".into(), needle: "an".into() }];
        assert_eq!(ids(&refine(rows, &refinements, 2)), ["2"]);
    }

    #[test]
    fn test_no_refinements_keeps_server_total() {
        let refined = refine(users(), &[], 42);
        assert_eq!(refined.rows.len(), 5);
        assert_eq!(refined.apparent_total, 42);
        assert_eq!(refined.scope, TotalScope::Server);
    }
}
