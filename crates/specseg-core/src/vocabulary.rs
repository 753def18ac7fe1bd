use crate::types::WorkCategory;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// The content patterns that mark a requirement as belonging to a category.
///
/// `terms` are matched as whole words, case-insensitively, with an optional
/// plural `s`; spaces inside a term match any run of whitespace. `markers`
/// are structural regexes (code-fence languages, DDL, HTTP-verb routes,
/// markup) and are compiled exactly as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub category: WorkCategory,
    pub terms: Vec<String>,
    pub markers: Vec<String>,
}

impl Vocabulary {
    fn new(category: WorkCategory, terms: &[&str], markers: &[&str]) -> Self {
        Self {
            category,
            terms: terms.iter().map(|t| t.to_string()).collect(),
            markers: markers.iter().map(|m| m.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default table
// ---------------------------------------------------------------------------

const SCHEMA_TERMS: &[&str] = &[
    "table",
    "column",
    "migration",
    "index",
    "indexes",
    "indices",
    "schema",
    "database",
    "foreign key",
    "primary key",
    "constraint",
    "rls",
    "row level security",
    "policy",
    "policies",
    "enum type",
    "data model",
];

const SCHEMA_MARKERS: &[&str] = &[
    r"(?i)```\s*(sql|pgsql|postgres|prisma)\b",
    r"(?i)\b(create|alter|drop)\s+(table|index|policy|type|view)\b",
    r"(?i)\breferences\s+[a-z_][a-z0-9_.]*\s*\(",
];

const SERVICE_TERMS: &[&str] = &[
    "endpoint",
    "route",
    "handler",
    "api",
    "request",
    "response",
    "status code",
    "webhook",
    "edge function",
    "server action",
    "rpc",
];

const SERVICE_MARKERS: &[&str] = &[
    r"\b(GET|POST|PUT|PATCH|DELETE)\s+/\S*",
    r"export\s+(async\s+)?function\s+(GET|POST|PUT|PATCH|DELETE)\b",
    r"/api/",
];

const PRESENTATION_TERMS: &[&str] = &[
    "component",
    "page",
    "render",
    "ui",
    "form",
    "button",
    "card",
    "dialog",
    "modal",
    "layout",
    "screen",
    "sidebar",
    "tooltip",
    "wireframe",
];

const PRESENTATION_MARKERS: &[&str] = &[
    r"(?i)```\s*(tsx|jsx|html|vue|svelte)\b",
    // JSX element: attributes or self-closing, never a type argument like `Promise<T>`
    r"(?:^|[^A-Za-z0-9_$<])<[A-Z][A-Za-z0-9.]*(?:\s+[^<>]*=[^<>]*|\s*/)>",
    r"'use client'",
];

const INTEGRATION_TERMS: &[&str] = &[
    "hook",
    "subscription",
    "subscribe",
    "state management",
    "client state",
    "mutation",
    "cache invalidation",
    "query invalidation",
    "navigation",
    "integration",
    "test",
    "e2e",
    "end-to-end",
];

const INTEGRATION_MARKERS: &[&str] = &[
    r"\buse[A-Z][A-Za-z0-9]*\s*\(",
    r"\binvalidateQueries\b",
    r"\b(describe|it|test)\(\s*['\x22]",
];

/// The built-in vocabulary, one entry per detectable category, in canonical
/// order.
pub fn default_vocabulary() -> Vec<Vocabulary> {
    vec![
        Vocabulary::new(WorkCategory::Schema, SCHEMA_TERMS, SCHEMA_MARKERS),
        Vocabulary::new(WorkCategory::Service, SERVICE_TERMS, SERVICE_MARKERS),
        Vocabulary::new(
            WorkCategory::Presentation,
            PRESENTATION_TERMS,
            PRESENTATION_MARKERS,
        ),
        Vocabulary::new(
            WorkCategory::Integration,
            INTEGRATION_TERMS,
            INTEGRATION_MARKERS,
        ),
    ]
}

/// Append extra terms to the matching entries of `table`. Terms for a
/// category with no entry get a new entry; `General` is skipped since it is
/// only ever the fallback.
pub fn extend_vocabulary(
    mut table: Vec<Vocabulary>,
    extra: &BTreeMap<WorkCategory, Vec<String>>,
) -> Vec<Vocabulary> {
    for (category, terms) in extra {
        if *category == WorkCategory::General || terms.is_empty() {
            continue;
        }
        match table.iter_mut().find(|v| v.category == *category) {
            Some(entry) => {
                for term in terms {
                    if !entry.terms.contains(term) {
                        entry.terms.push(term.clone());
                    }
                }
            }
            None => table.push(Vocabulary {
                category: *category,
                terms: terms.clone(),
                markers: Vec::new(),
            }),
        }
    }
    table.sort_by_key(|v| v.category);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_vocabulary_covers_detectable_categories_in_order() {
        let cats: Vec<_> = default_vocabulary().iter().map(|v| v.category).collect();
        assert_eq!(cats, WorkCategory::detectable());
    }

    #[test]
    fn every_entry_has_terms_and_markers() {
        for v in default_vocabulary() {
            assert!(!v.terms.is_empty(), "{} has no terms", v.category);
            assert!(!v.markers.is_empty(), "{} has no markers", v.category);
        }
    }

    #[test]
    fn extend_appends_without_duplicates() {
        let mut extra = BTreeMap::new();
        extra.insert(
            WorkCategory::Schema,
            vec!["table".to_string(), "prisma model".to_string()],
        );
        let table = extend_vocabulary(default_vocabulary(), &extra);
        let schema = &table[0];
        assert_eq!(schema.terms.iter().filter(|t| *t == "table").count(), 1);
        assert!(schema.terms.contains(&"prisma model".to_string()));
    }

    #[test]
    fn extend_ignores_general() {
        let mut extra = BTreeMap::new();
        extra.insert(WorkCategory::General, vec!["anything".to_string()]);
        let table = extend_vocabulary(default_vocabulary(), &extra);
        assert!(table.iter().all(|v| v.category != WorkCategory::General));
    }

    #[test]
    fn extend_adds_missing_category_entry() {
        let mut extra = BTreeMap::new();
        extra.insert(WorkCategory::Service, vec!["grpc".to_string()]);
        let only_schema = vec![default_vocabulary().remove(0)];
        let table = extend_vocabulary(only_schema, &extra);
        assert_eq!(table.len(), 2);
        assert_eq!(table[1].category, WorkCategory::Service);
        assert_eq!(table[1].terms, vec!["grpc".to_string()]);
    }
}
