use crate::error::RegistrationError;
use crate::model::{ClassOffering, Selection};
use crate::store::CatalogStore;
use fxhash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// One whitespace-separated token of a search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// `[TAG]`: offerings whose course carries this general-education tag.
    Tag(String),
    /// Subject, catalog number, or part of the title.
    Text(String),
}

impl SearchTerm {
    /// Splits a query on whitespace. Bare `[]` tokens are ignored.
    #[must_use]
    pub fn parse_query(query: &str) -> Vec<Self> {
        query.split_whitespace().filter_map(Self::parse_token).collect()
    }

    fn parse_token(token: &str) -> Option<Self> {
        match token.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            Some("") => None,
            Some(tag) => Some(Self::Tag(tag.to_ascii_uppercase())),
            None => Some(Self::Text(token.to_owned())),
        }
    }

    /// Whether `offering` matches this term.
    #[must_use]
    pub fn matches(&self, offering: &ClassOffering) -> bool {
        let course = &offering.course;
        match self {
            Self::Tag(tag) => course.sbc.iter().any(|t| t.eq_ignore_ascii_case(tag)),
            Self::Text(text) => {
                course.subject.eq_ignore_ascii_case(text)
                    || course.code == *text
                    || course.title.to_lowercase().contains(&text.to_lowercase())
            },
        }
    }
}

/// Class search over the catalog store.
#[derive(Debug, Clone)]
pub struct ClassSearch {
    catalog: Arc<dyn CatalogStore>,
}

impl ClassSearch {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Union of the matches of every token, first-seen order, no duplicates.
    ///
    /// # Errors
    /// An unavailable-kind error when the catalog cannot be reached.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<ClassOffering>, RegistrationError> {
        let terms = SearchTerm::parse_query(query);
        let mut seen = FxHashSet::<Selection>::default();
        let mut results = Vec::new();

        for term in &terms {
            for offering in self.catalog.search(term).await? {
                if seen.insert(offering.selection()) {
                    results.push(offering);
                }
            }
        }

        debug!(terms = terms.len(), hits = results.len(), "Search finished");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CourseMeta;

    fn offering(subject: &str, code: &str, title: &str, sbc: &[&str]) -> ClassOffering {
        ClassOffering {
            course: CourseMeta {
                subject: subject.to_owned(),
                code: code.to_owned(),
                title: title.to_owned(),
                description: String::new(),
                credits: 3.0,
                prerequisites: String::new(),
                sbc: sbc.iter().map(|s| (*s).to_owned()).collect(),
            },
            section_id: "01".to_owned(),
            capacity_remaining: 10,
            days: "MW".to_owned(),
            time_start: "10:00".to_owned(),
            time_end: "11:20".to_owned(),
            instructor: "Staff".to_owned(),
            room: "Frey 102".to_owned(),
        }
    }

    #[test]
    fn tokens_split_into_tags_and_text() {
        assert_eq!(
            SearchTerm::parse_query("  [tech]  data [] 214 "),
            vec![
                SearchTerm::Tag("TECH".to_owned()),
                SearchTerm::Text("data".to_owned()),
                SearchTerm::Text("214".to_owned()),
            ]
        );
        assert!(SearchTerm::parse_query("   ").is_empty());
    }

    #[test]
    fn text_matches_subject_code_or_title() {
        let ds = offering("CSE", "214", "Data Structures", &["TECH"]);

        assert!(SearchTerm::Text("cse".to_owned()).matches(&ds));
        assert!(SearchTerm::Text("214".to_owned()).matches(&ds));
        assert!(SearchTerm::Text("struct".to_owned()).matches(&ds));
        assert!(!SearchTerm::Text("21".to_owned()).matches(&ds));
        assert!(SearchTerm::Tag("TECH".to_owned()).matches(&ds));
        assert!(!SearchTerm::Tag("HUM".to_owned()).matches(&ds));
    }
}
