use crate::classifier::{Classifier, FeatureRequirement};
use crate::document::SpecificationDocument;
use crate::parser::{Outline, Section};
use crate::types::{UnitId, WorkCategory};
use serde::Serialize;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// SectionRef
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionRef {
    pub number: u32,
    pub title: String,
}

impl From<&Section> for SectionRef {
    fn from(s: &Section) -> Self {
        Self {
            number: s.number,
            title: s.title.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// PromptUnit
// ---------------------------------------------------------------------------

/// All requirements of one section that carry one category. Built once by
/// [`group_section`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptUnit {
    pub id: UnitId,
    pub section: SectionRef,
    pub category: WorkCategory,
    pub requirements: Vec<FeatureRequirement>,
}

impl PromptUnit {
    pub fn requirement_ids(&self) -> Vec<String> {
        self.requirements.iter().map(|r| r.label()).collect()
    }

    pub fn summary(&self) -> UnitSummary {
        UnitSummary {
            id: self.id,
            section_title: self.section.title.clone(),
            category: self.category,
            requirement_ids: self.requirement_ids(),
        }
    }
}

/// What later prompts are told about an earlier unit: its identity, never
/// its requirement bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    pub id: UnitId,
    pub section_title: String,
    pub category: WorkCategory,
    pub requirement_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// One unit per category present, in canonical category order. Sequence
/// numbers come from this pass, so schema work is always unit 1 when a
/// section has any.
pub fn group_section(section: &SectionRef, requirements: &[FeatureRequirement]) -> Vec<PromptUnit> {
    let mut units = Vec::new();
    for &category in WorkCategory::all() {
        let members: Vec<FeatureRequirement> = requirements
            .iter()
            .filter(|r| r.has(category))
            .cloned()
            .collect();
        if members.is_empty() {
            continue;
        }
        let sequence = units.len() as u32 + 1;
        units.push(PromptUnit {
            id: UnitId::new(section.number, sequence),
            section: section.clone(),
            category,
            requirements: members,
        });
    }
    units
}

/// The members of `ids` that `id` depends on: earlier units of its own
/// section, and every unit of the closest earlier section present in `ids`
/// (a section that produced no units does not break the chain).
pub fn dependencies_among(id: UnitId, ids: &[UnitId]) -> Vec<UnitId> {
    let previous_section = ids
        .iter()
        .map(|u| u.section)
        .filter(|s| *s < id.section)
        .max();

    ids.iter()
        .copied()
        .filter(|u| {
            (u.section == id.section && u.sequence < id.sequence)
                || Some(u.section) == previous_section
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ExecutionPlan
// ---------------------------------------------------------------------------

/// Every prompt unit of a document in global execution order.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    /// All sections, including those that produced no units.
    pub sections: Vec<SectionRef>,
    pub units: Vec<PromptUnit>,
    pub requirement_count: usize,
    pub warnings: Vec<String>,
}

impl ExecutionPlan {
    pub fn build(doc: &SpecificationDocument, outline: &Outline, classifier: &Classifier) -> Self {
        let mut plan = ExecutionPlan {
            warnings: outline.warnings.clone(),
            ..Default::default()
        };

        if outline.sections.is_empty() {
            let msg = format!("no sections found in {}", doc.path().display());
            warn!("{msg}");
            plan.warnings.push(msg);
            return plan;
        }

        for section in &outline.sections {
            let section_ref = SectionRef::from(section);
            plan.sections.push(section_ref.clone());

            if section.requirements.is_empty() {
                let msg = format!(
                    "section {} ({}) has no feature requirements; skipped",
                    section.number, section.title
                );
                warn!("{msg}");
                plan.warnings.push(msg);
                continue;
            }

            let requirements = classifier.classify_section(doc, section);
            plan.requirement_count += requirements.len();
            let units = group_section(&section_ref, &requirements);
            info!(
                section = section.number,
                requirements = requirements.len(),
                units = units.len(),
                "grouped section"
            );
            plan.units.extend(units);
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units `id` must wait for. Derived from the plan's order, so it cannot
    /// contain a cycle.
    pub fn dependencies(&self, id: UnitId) -> Vec<UnitId> {
        let ids: Vec<UnitId> = self.units.iter().map(|u| u.id).collect();
        dependencies_among(id, &ids)
    }

    /// Distinct requirement ids across all units, in first-seen order.
    pub fn requirement_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.units
            .iter()
            .flat_map(|u| u.requirements.iter())
            .filter(|r| seen.insert(r.id.clone()))
            .map(|r| r.label())
            .collect()
    }

    /// Requirement placements summed over units; a requirement in two
    /// categories counts twice.
    pub fn placement_count(&self) -> usize {
        self.units.iter().map(|u| u.requirements.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::collections::BTreeSet;
    use WorkCategory::*;

    fn fr(id: &str, cats: &[WorkCategory]) -> FeatureRequirement {
        FeatureRequirement {
            id: id.to_string(),
            title: format!("Requirement {id}"),
            span: crate::types::Span::new(0, 0),
            content: String::new(),
            categories: cats.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn section(n: u32) -> SectionRef {
        SectionRef {
            number: n,
            title: format!("S{n}"),
        }
    }

    fn plan(text: &str) -> ExecutionPlan {
        let doc = SpecificationDocument::from_text("spec.md", text);
        let outline = parse(&doc).unwrap();
        ExecutionPlan::build(&doc, &outline, &Classifier::with_defaults())
    }

    #[test]
    fn units_follow_canonical_order_not_requirement_order() {
        let frs = vec![fr("1.1", &[Presentation]), fr("1.2", &[Schema])];
        let units = group_section(&section(1), &frs);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].category, Schema);
        assert_eq!(units[0].id, UnitId::new(1, 1));
        assert_eq!(units[1].category, Presentation);
        assert_eq!(units[1].id, UnitId::new(1, 2));
    }

    #[test]
    fn requirement_in_two_categories_lands_in_both_units() {
        let frs = vec![fr("1.1", &[Schema, Service])];
        let units = group_section(&section(1), &frs);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].requirement_ids(), vec!["FR-1.1"]);
        assert_eq!(units[1].requirement_ids(), vec!["FR-1.1"]);
    }

    #[test]
    fn source_order_is_kept_inside_a_unit() {
        let frs = vec![fr("1.3", &[Service]), fr("1.1", &[Service]), fr("1.2", &[Schema])];
        let units = group_section(&section(1), &frs);
        assert_eq!(units[1].requirement_ids(), vec!["FR-1.3", "FR-1.1"]);
    }

    #[test]
    fn general_units_come_last() {
        let frs = vec![fr("1.1", &[General]), fr("1.2", &[Integration])];
        let units = group_section(&section(1), &frs);
        assert_eq!(units[0].category, Integration);
        assert_eq!(units[1].category, General);
    }

    #[test]
    fn three_prompt_example() {
        let p = plan(
            "## SECTION 1: Data\n\
             #### FR-1.1: Jobs\n```sql\nCREATE TABLE jobs (id int);\n```\n\
             #### FR-1.2: Jobs API\nPOST /jobs\n\
             ## SECTION 2: Screens\n\
             #### FR-2.1: Jobs Screen\n```tsx\n<JobsList />\n```\n",
        );
        let ids: Vec<_> = p.units.iter().map(|u| (u.id.to_string(), u.category)).collect();
        assert_eq!(
            ids,
            vec![
                ("E01-P01".to_string(), Schema),
                ("E01-P02".to_string(), Service),
                ("E02-P01".to_string(), Presentation),
            ]
        );
        assert!(p.units.iter().all(|u| u.requirements.len() == 1));
    }

    #[test]
    fn dependencies_within_and_across_sections() {
        let p = plan(
            "## SECTION 1: A\n#### FR-1.1: T\nCREATE TABLE t ();\n#### FR-1.2: R\nGET /t\n\
             ## SECTION 2: B\n#### FR-2.1: T2\nCREATE TABLE u ();\n#### FR-2.2: P\n<Page />\n",
        );
        assert!(p.dependencies(UnitId::new(1, 1)).is_empty());
        assert_eq!(p.dependencies(UnitId::new(1, 2)), vec![UnitId::new(1, 1)]);
        assert_eq!(
            p.dependencies(UnitId::new(2, 1)),
            vec![UnitId::new(1, 1), UnitId::new(1, 2)]
        );
        assert_eq!(
            p.dependencies(UnitId::new(2, 2)),
            vec![UnitId::new(1, 1), UnitId::new(1, 2), UnitId::new(2, 1)]
        );
    }

    #[test]
    fn dependencies_never_point_forward() {
        let p = plan(
            "## SECTION 1: A\n#### FR-1.1: T\ntable and endpoint and component and hook\n\
             ## SECTION 2: B\n#### FR-2.1: X\nmigration and page\n",
        );
        for unit in &p.units {
            for dep in p.dependencies(unit.id) {
                assert!(dep < unit.id, "{} depends on {}", unit.id, dep);
            }
        }
    }

    #[test]
    fn empty_section_is_skipped_and_does_not_break_the_chain() {
        let p = plan(
            "## SECTION 1: A\n#### FR-1.1: T\nCREATE TABLE t ();\n\
             ## SECTION 2: Empty\nprose only\n\
             ## SECTION 3: C\n#### FR-3.1: P\n<Page />\n",
        );
        assert_eq!(p.sections.len(), 3);
        assert_eq!(p.units.len(), 2);
        assert!(p.units.iter().all(|u| u.id.section != 2));
        assert_eq!(p.dependencies(UnitId::new(3, 1)), vec![UnitId::new(1, 1)]);
        assert!(p.warnings.iter().any(|w| w.contains("section 2")));
    }

    #[test]
    fn empty_document_yields_empty_plan_with_warning() {
        let p = plan("");
        assert!(p.is_empty());
        assert!(p.sections.is_empty());
        assert_eq!(p.warnings.len(), 1);
    }

    #[test]
    fn every_requirement_is_covered() {
        let p = plan(
            "## SECTION 1: A\n#### FR-1.1: Vague\nMake it nice.\n#### FR-1.2: T\ntable\n",
        );
        assert_eq!(p.requirement_count, 2);
        assert_eq!(p.requirement_ids(), vec!["FR-1.2", "FR-1.1"]);
        assert_eq!(p.units[1].id, UnitId::new(1, 2));
        assert_eq!(p.units[1].category, General);
    }

    #[test]
    fn placement_count_counts_duplicates() {
        let p = plan("## SECTION 1: A\n#### FR-1.1: T\nAdd a table and an endpoint.\n");
        assert_eq!(p.requirement_count, 1);
        assert_eq!(p.placement_count(), 2);
    }
}
