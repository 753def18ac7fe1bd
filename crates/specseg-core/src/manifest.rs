use crate::grouper::{ExecutionPlan, SectionRef};
use crate::render::ExecutionPrompt;
use crate::types::WorkCategory;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The only line of the manifest that changes between identical runs.
pub const GENERATED_LINE_PREFIX: &str = "**Generated**:";

// ---------------------------------------------------------------------------
// ManifestRow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRow {
    pub section_number: u32,
    pub sequence_in_section: u32,
    pub category: WorkCategory,
    pub fr_ids: Vec<String>,
    pub output_filename: String,
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Index of every generated prompt in global execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub sections: Vec<SectionRef>,
    pub requirement_count: usize,
    pub rows: Vec<ManifestRow>,
}

impl Manifest {
    pub fn new(plan: &ExecutionPlan, prompts: &[ExecutionPrompt], project_name: Option<String>) -> Self {
        let mut rows: Vec<ManifestRow> = prompts
            .iter()
            .map(|p| ManifestRow {
                section_number: p.id.section,
                sequence_in_section: p.id.sequence,
                category: p.category,
                fr_ids: p.requirement_ids.clone(),
                output_filename: p.filename.clone(),
            })
            .collect();
        rows.sort_by_key(|r| (r.section_number, r.sequence_in_section));
        Self {
            project_name,
            sections: plan.sections.clone(),
            requirement_count: plan.requirement_count,
            rows,
        }
    }

    /// Section numbers that produced at least one prompt, ascending.
    pub fn section_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.rows.iter().map(|r| r.section_number).collect();
        numbers.dedup();
        numbers
    }

    pub fn render(&self, generated_at: DateTime<Utc>) -> String {
        let mut doc = String::new();

        doc.push_str("# Execution Prompts Index\n\n");
        if let Some(ref project) = self.project_name {
            doc.push_str(&format!("**Project**: {project}  \n"));
        }
        doc.push_str(&format!(
            "{GENERATED_LINE_PREFIX} {}  \n",
            generated_at.format("%Y-%m-%dT%H:%M:%SZ")
        ));
        doc.push_str(&format!("**Total Prompts**: {}  \n", self.rows.len()));
        doc.push_str(&format!("**Total Sections**: {}  \n", self.sections.len()));
        doc.push_str(&format!(
            "**Total Requirements**: {}\n",
            self.requirement_count
        ));

        doc.push_str("\n---\n\n## Execution Order\n\n");
        doc.push_str(
            "Execute prompts in the order listed below. Each prompt builds on every prompt before it.\n",
        );
        doc.push_str("\n### Progressive Dependency Model\n\n");
        doc.push_str("**Within a section**:\n\n```\n");
        let chain: Vec<&str> = WorkCategory::all().iter().map(|c| c.label()).collect();
        doc.push_str(&chain.join(" → "));
        doc.push_str("\n```\n\n**Between sections**:\n\n```\n");
        if self.sections.is_empty() {
            doc.push_str("(no sections)");
        } else {
            let chain: Vec<String> = self
                .sections
                .iter()
                .map(|s| format!("E{:02}", s.number))
                .collect();
            doc.push_str(&chain.join(" → "));
        }
        doc.push_str("\n```\n");

        doc.push_str("\n---\n\n## Prompt List\n");
        if self.sections.is_empty() {
            doc.push_str("\n*No sections found in the input document*\n");
        }
        for section in &self.sections {
            doc.push_str(&format!(
                "\n### Section {}: {}\n\n",
                section.number, section.title
            ));
            let rows: Vec<&ManifestRow> = self
                .rows
                .iter()
                .filter(|r| r.section_number == section.number)
                .collect();
            if rows.is_empty() {
                doc.push_str("*No prompts generated for this section*\n");
                continue;
            }
            for (i, row) in rows.iter().enumerate() {
                doc.push_str(&format!(
                    "{}. **{}** - {} ({} requirement(s): {})\n",
                    i + 1,
                    row.output_filename,
                    row.category,
                    row.fr_ids.len(),
                    row.fr_ids.join(", ")
                ));
            }
        }

        doc.push_str("\n---\n\n## Traceability\n\n");
        if self.rows.is_empty() {
            doc.push_str("*No prompts generated*\n");
        } else {
            doc.push_str("| Order | Section | Sequence | Category | Requirements | File |\n");
            doc.push_str("|---|---|---|---|---|---|\n");
            for (i, row) in self.rows.iter().enumerate() {
                doc.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} |\n",
                    i + 1,
                    row.section_number,
                    row.sequence_in_section,
                    row.category,
                    row.fr_ids.join(", "),
                    row.output_filename
                ));
            }
        }

        doc.push_str("\n---\n\n## Usage\n\n");
        doc.push_str("1. Execute each prompt in order\n");
        doc.push_str("2. Complete all acceptance criteria before moving to the next prompt\n");
        doc.push_str("3. Run the validation steps after each prompt\n");
        doc.push_str("4. Do not skip prompts; later prompts assume earlier ones are done\n");
        doc.push_str("\n---\n\n**Status**: Ready for progressive execution\n");

        doc
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
