//! Text search and column filters for the list pages.
//!
//! `q` matches case-insensitively anywhere in a row's displayed text. Column
//! filters compare one displayed value, ignoring case. Blank values, as sent
//! by an untouched `<select>`, are ignored.

use serde::{Deserialize, Serialize};

/// Query string of a list page, e.g. `/employees?q=martin&role=EMPLOYE`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListFilter {
    pub q: Option<String>,
    pub departement: Option<String>,
    pub role: Option<String>,
    pub etat: Option<String>,
    pub mois: Option<String>,
    pub annee: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ListFilter {
    pub fn text(q: &str) -> Self {
        Self {
            q: Some(q.to_string()),
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        [&self.q, &self.departement, &self.role, &self.etat, &self.mois, &self.annee]
            .into_iter()
            .any(|v| present(v).is_some())
    }

    /// True when `q` is unset or found in one of `fields`.
    pub fn matches_text<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        let Some(term) = present(&self.q) else {
            return true;
        };
        let term = term.to_lowercase();
        fields
            .into_iter()
            .any(|field| field.to_lowercase().contains(&term))
    }

    pub fn matches_departement(&self, actual: Option<&str>) -> bool {
        column(&self.departement, actual)
    }

    pub fn matches_role(&self, actual: &str) -> bool {
        column(&self.role, Some(actual))
    }

    pub fn matches_etat(&self, actual: &str) -> bool {
        column(&self.etat, Some(actual))
    }

    pub fn matches_periode(&self, mois: i32, annee: i32) -> bool {
        column(&self.mois, Some(&mois.to_string())) && column(&self.annee, Some(&annee.to_string()))
    }
}

fn column(wanted: &Option<String>, actual: Option<&str>) -> bool {
    match present(wanted) {
        None => true,
        Some(wanted) => actual.is_some_and(|a| a.trim().to_lowercase() == wanted.to_lowercase()),
    }
}

/// A list row the filter can be applied to.
pub trait Searchable {
    /// Displayed values searched by `q`.
    fn text(&self) -> Vec<&str>;

    /// Column filters; rows match any filter they have no column for.
    fn columns(&self, _filter: &ListFilter) -> bool {
        true
    }
}

pub fn apply<T: Searchable>(rows: Vec<T>, filter: &ListFilter) -> Vec<T> {
    if !filter.is_active() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| filter.matches_text(row.text()) && row.columns(filter))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        nom: &'static str,
        departement: Option<&'static str>,
    }

    impl Searchable for Row {
        fn text(&self) -> Vec<&str> {
            vec![self.nom, self.departement.unwrap_or("")]
        }

        fn columns(&self, filter: &ListFilter) -> bool {
            filter.matches_departement(self.departement)
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { nom: "Martin", departement: Some("Finance") },
            Row { nom: "Moreau", departement: Some("Informatique") },
            Row { nom: "Roux", departement: None },
        ]
    }

    fn names(rows: Vec<Row>) -> Vec<&'static str> {
        rows.into_iter().map(|r| r.nom).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        assert!(!ListFilter::default().is_active());
        let blank = ListFilter {
            q: Some("  ".into()),
            departement: Some(String::new()),
            ..ListFilter::default()
        };
        assert!(!blank.is_active());
        assert_eq!(apply(rows(), &blank).len(), 3);
    }

    #[test]
    fn text_search_ignores_case() {
        assert_eq!(names(apply(rows(), &ListFilter::text("MART"))), vec!["Martin"]);
        assert_eq!(names(apply(rows(), &ListFilter::text("informatique"))), vec!["Moreau"]);
        assert!(apply(rows(), &ListFilter::text("zzz")).is_empty());
    }

    #[test]
    fn column_filter_needs_a_value() {
        let filter = ListFilter {
            departement: Some("finance".into()),
            ..ListFilter::default()
        };
        assert_eq!(names(apply(rows(), &filter)), vec!["Martin"]);
    }

    #[test]
    fn periode_compares_numbers_as_text() {
        let filter = ListFilter {
            mois: Some("1".into()),
            annee: Some(" 2024 ".into()),
            ..ListFilter::default()
        };
        assert!(filter.matches_periode(1, 2024));
        assert!(!filter.matches_periode(2, 2024));
        assert!(!filter.matches_periode(1, 2023));
    }
}
