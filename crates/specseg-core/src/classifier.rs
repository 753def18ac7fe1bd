use crate::document::SpecificationDocument;
use crate::error::{Result, SegmentError};
use crate::parser::{RequirementEntry, Section};
use crate::types::{Span, WorkCategory};
use crate::vocabulary::{default_vocabulary, Vocabulary};
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

// ---------------------------------------------------------------------------
// FeatureRequirement
// ---------------------------------------------------------------------------

/// A requirement with its verbatim text and the categories it was sorted into.
/// `categories` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRequirement {
    pub id: String,
    pub title: String,
    pub span: Span,
    pub content: String,
    pub categories: BTreeSet<WorkCategory>,
}

impl FeatureRequirement {
    pub fn label(&self) -> String {
        format!("FR-{}", self.id)
    }

    pub fn has(&self, category: WorkCategory) -> bool {
        self.categories.contains(&category)
    }
}

// ---------------------------------------------------------------------------
// CategoryMatch
// ---------------------------------------------------------------------------

/// The first piece of text that put a requirement into a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatch {
    pub category: WorkCategory,
    pub evidence: String,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

struct Matcher {
    category: WorkCategory,
    terms: Option<Regex>,
    markers: Vec<Regex>,
}

impl Matcher {
    fn compile(vocab: &Vocabulary) -> Result<Self> {
        let invalid = |source: regex::Error| SegmentError::InvalidVocabulary {
            category: vocab.category.to_string(),
            source,
        };

        let terms = if vocab.terms.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = vocab
                .terms
                .iter()
                .map(|t| {
                    t.split_whitespace()
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(r"\s+")
                })
                .filter(|t| !t.is_empty())
                .collect();
            let pattern = format!(r"(?i)\b(?:{})s?\b", alternatives.join("|"));
            Some(Regex::new(&pattern).map_err(invalid)?)
        };

        let markers = vocab
            .markers
            .iter()
            .map(|m| Regex::new(m).map_err(invalid))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            category: vocab.category,
            terms,
            markers,
        })
    }

    fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.markers
            .iter()
            .chain(self.terms.iter())
            .find_map(|re| re.find(text))
            .map(|m| m.as_str())
    }
}

/// Content-based requirement classifier backed by a vocabulary table.
pub struct Classifier {
    matchers: Vec<Matcher>,
}

impl Classifier {
    pub fn new(vocabulary: &[Vocabulary]) -> Result<Self> {
        let mut matchers = vocabulary
            .iter()
            .filter(|v| v.category != WorkCategory::General)
            .map(Matcher::compile)
            .collect::<Result<Vec<_>>>()?;
        matchers.sort_by_key(|m| m.category);
        Ok(Self { matchers })
    }

    /// Classifier over [`default_vocabulary`].
    pub fn with_defaults() -> Self {
        Self::new(&default_vocabulary()).expect("built-in vocabulary compiles")
    }

    /// Every category whose vocabulary appears in `text`, with the text that
    /// matched. Empty when nothing matches.
    pub fn explain(&self, text: &str) -> Vec<CategoryMatch> {
        self.matchers
            .iter()
            .filter_map(|m| {
                m.find(text).map(|evidence| CategoryMatch {
                    category: m.category,
                    evidence: evidence.to_string(),
                })
            })
            .collect()
    }

    /// The categories `text` belongs to. Falls back to
    /// [`WorkCategory::General`] so the result is never empty.
    pub fn classify(&self, text: &str) -> BTreeSet<WorkCategory> {
        let mut categories: BTreeSet<WorkCategory> =
            self.explain(text).into_iter().map(|m| m.category).collect();
        if categories.is_empty() {
            categories.insert(WorkCategory::General);
        }
        categories
    }

    pub fn classify_requirement(
        &self,
        doc: &SpecificationDocument,
        entry: &RequirementEntry,
    ) -> FeatureRequirement {
        let content = doc.slice(entry.span).to_string();
        let matches = self.explain(&content);
        for m in &matches {
            debug!(
                requirement = %entry.label(),
                category = %m.category,
                evidence = %m.evidence,
                "classified"
            );
        }
        let mut categories: BTreeSet<WorkCategory> =
            matches.into_iter().map(|m| m.category).collect();
        if categories.is_empty() {
            debug!(requirement = %entry.label(), "no vocabulary matched, using general");
            categories.insert(WorkCategory::General);
        }
        FeatureRequirement {
            id: entry.id.clone(),
            title: entry.title.clone(),
            span: entry.span,
            content,
            categories,
        }
    }

    pub fn classify_section(
        &self,
        doc: &SpecificationDocument,
        section: &Section,
    ) -> Vec<FeatureRequirement> {
        section
            .requirements
            .iter()
            .map(|entry| self.classify_requirement(doc, entry))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use WorkCategory::*;

    fn cats(text: &str) -> Vec<WorkCategory> {
        Classifier::with_defaults().classify(text).into_iter().collect()
    }

    #[test]
    fn sql_block_is_schema() {
        let text = "Store jobs.\n```sql\nCREATE TABLE jobs (id uuid);\n```\n";
        assert_eq!(cats(text), vec![Schema]);
    }

    #[test]
    fn http_verb_route_is_service() {
        assert_eq!(cats("Expose POST /jobs/start to kick off work."), vec![Service]);
    }

    #[test]
    fn exported_verb_handler_is_service() {
        assert_eq!(cats("export async function GET(req) {}"), vec![Service]);
    }

    #[test]
    fn typed_route_handler_is_service_only() {
        let text = "\
```ts
export async function POST(req: NextRequest): Promise<NextResponse> {
  const body: Array<Record<string, Job>> = await req.json();
  return NextResponse.json(body);
}
```";
        assert_eq!(cats(text), vec![Service]);
        let c = Classifier::with_defaults();
        assert!(c.explain(text).iter().all(|m| m.category != Presentation));
    }

    #[test]
    fn jsx_elements_are_presentation() {
        assert_eq!(cats("Show <JobsList jobs={jobs} /> on load."), vec![Presentation]);
        assert_eq!(cats("Then <EmptyState/> when nothing is queued."), vec![Presentation]);
    }

    #[test]
    fn tsx_block_is_presentation() {
        let text = "```tsx\nexport default function JobsList() { return <div/> }\n```";
        assert_eq!(cats(text), vec![Presentation]);
    }

    #[test]
    fn hook_call_is_integration() {
        assert_eq!(cats("Wire data with useJobs() everywhere."), vec![Integration]);
    }

    #[test]
    fn table_and_endpoint_match_both() {
        let text = "Add a `jobs` table and a GET /api/jobs endpoint.";
        assert_eq!(cats(text), vec![Schema, Service]);
    }

    #[test]
    fn unmatched_text_falls_back_to_general() {
        assert_eq!(cats("Improve overall quality of life."), vec![General]);
        assert_eq!(cats(""), vec![General]);
    }

    #[test]
    fn terms_are_case_insensitive_whole_words() {
        assert_eq!(cats("The MIGRATION must be reversible."), vec![Schema]);
        // "build" contains "ui", "format" contains "form"
        assert_eq!(cats("Build the format converter."), vec![General]);
    }

    #[test]
    fn plural_terms_match() {
        assert_eq!(cats("Three new columns."), vec![Schema]);
        assert_eq!(cats("Two buttons."), vec![Presentation]);
    }

    #[test]
    fn multi_word_terms_span_whitespace() {
        assert_eq!(cats("Add a foreign\n key to owners."), vec![Schema]);
    }

    #[test]
    fn explain_reports_evidence() {
        let c = Classifier::with_defaults();
        let m = c.explain("POST /api/jobs");
        assert_eq!(m[0].category, Service);
        assert_eq!(m[0].evidence, "POST /api/jobs");
    }

    #[test]
    fn custom_vocabulary_replaces_defaults() {
        let vocab = vec![Vocabulary {
            category: Presentation,
            terms: vec!["widget".to_string()],
            markers: vec![],
        }];
        let c = Classifier::new(&vocab).unwrap();
        assert_eq!(c.classify("a widget"), BTreeSet::from([Presentation]));
        assert_eq!(c.classify("a table"), BTreeSet::from([General]));
    }

    #[test]
    fn invalid_marker_is_reported_with_category() {
        let vocab = vec![Vocabulary {
            category: Schema,
            terms: vec![],
            markers: vec!["(unclosed".to_string()],
        }];
        let err = Classifier::new(&vocab).err().unwrap();
        assert!(matches!(err, SegmentError::InvalidVocabulary { ref category, .. } if category == "schema"));
    }

    #[test]
    fn classify_section_preserves_order_and_content() {
        let text = "## SECTION 1: A\n#### FR-1.1: Jobs table\nCREATE TABLE jobs ();\n#### FR-1.2: Misc\nTidy up.\n";
        let doc = SpecificationDocument::from_text("spec.md", text);
        let outline = parse(&doc).unwrap();
        let frs = Classifier::with_defaults().classify_section(&doc, &outline.sections[0]);
        assert_eq!(frs.len(), 2);
        assert_eq!(frs[0].label(), "FR-1.1");
        assert!(frs[0].has(Schema));
        assert_eq!(frs[1].content, "#### FR-1.2: Misc\nTidy up.\n");
        assert_eq!(frs[1].categories, BTreeSet::from([General]));
    }
}
