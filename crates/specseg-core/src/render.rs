use crate::grouper::{dependencies_among, ExecutionPlan, PromptUnit, UnitSummary};
use crate::paths::prompt_filename;
use crate::types::{UnitId, WorkCategory};
use serde::Serialize;

// ---------------------------------------------------------------------------
// RenderContext
// ---------------------------------------------------------------------------

/// Run-wide values rendered into every prompt. Holds nothing time-dependent.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub project_name: Option<String>,
    pub environment: Option<String>,
}

// ---------------------------------------------------------------------------
// ExecutionPrompt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPrompt {
    pub id: UnitId,
    pub category: WorkCategory,
    pub requirement_ids: Vec<String>,
    pub filename: String,
    #[serde(skip)]
    pub content: String,
}

// ---------------------------------------------------------------------------
// Category guidance
// ---------------------------------------------------------------------------

fn deliverable(category: WorkCategory) -> &'static str {
    match category {
        WorkCategory::Schema => {
            "Data definitions: tables, columns, constraints, indexes, access policies and the migrations that create them."
        }
        WorkCategory::Service => {
            "Service entry points: routes and handlers with request validation, data access and consistent responses."
        }
        WorkCategory::Presentation => {
            "User-facing components and pages that render the data and states described below."
        }
        WorkCategory::Integration => {
            "Wiring between layers: hooks, subscriptions, state management, navigation and the tests that cover them."
        }
        WorkCategory::General => {
            "The behaviour described below, wherever in the codebase it naturally belongs."
        }
    }
}

fn scope(category: WorkCategory) -> &'static str {
    match category {
        WorkCategory::Schema => "tables, columns, migrations, indexes, policies",
        WorkCategory::Service => "routes, handlers, endpoint logic",
        WorkCategory::Presentation => "components, pages, markup, styling",
        WorkCategory::Integration => "hooks, subscriptions, state management, cross-layer tests",
        WorkCategory::General => "work outside the listed requirements",
    }
}

fn acceptance_criteria(category: WorkCategory) -> &'static [&'static str] {
    match category {
        WorkCategory::Schema => &[
            "Migration files created and applied cleanly from an empty database",
            "Every table and column named in the requirements exists",
            "Primary keys, foreign keys and constraints enforced",
            "Indexes created for foreign keys and frequently filtered columns",
            "Access policies in place and tested with a non-owner account",
            "Rows can be inserted, queried, updated and deleted",
        ],
        WorkCategory::Service => &[
            "Every route named in the requirements exists and responds",
            "Requests are authenticated where required",
            "Input is validated and invalid input is rejected with a clear error",
            "Success and error responses follow one consistent shape",
            "Data access goes through the schema delivered by earlier units",
        ],
        WorkCategory::Presentation => &[
            "Every component and page named in the requirements exists",
            "Components render without runtime errors or console warnings",
            "Loading, empty and error states are handled",
            "Layout works on narrow and wide viewports",
            "Interactive elements are reachable by keyboard and labelled",
        ],
        WorkCategory::Integration => &[
            "Hooks and subscriptions fetch and update data through the service layer",
            "Mutations refresh or invalidate dependent data",
            "Pages render real data end to end",
            "Navigation between the affected screens works",
            "Automated tests cover the integrated flows",
        ],
        WorkCategory::General => &[
            "Every listed requirement is implemented as described",
            "Existing behaviour is unchanged outside the listed requirements",
            "New code follows the conventions of the surrounding code",
        ],
    }
}

fn validation_steps(category: WorkCategory) -> &'static [&'static str] {
    match category {
        WorkCategory::Schema => &[
            "Verify structural objects exist: list the tables, columns, indexes and policies and compare them against the requirements",
            "Run the migrations against a fresh database and confirm they apply without errors",
            "Insert and read back a sample row for every new table",
            "Attempt a forbidden access and confirm the policy blocks it",
        ],
        WorkCategory::Service => &[
            "Call every new route with a valid request and check status code and body",
            "Call every new route with invalid input and check the error response",
            "Call protected routes without credentials and confirm they are rejected",
            "Confirm the data written by the routes is visible in the schema",
        ],
        WorkCategory::Presentation => &[
            "Visual check: open every new page and compare it against the requirements",
            "Interaction check: exercise every button, form and dialog",
            "Trigger loading, empty and error states and confirm each renders",
            "Resize to a mobile viewport and confirm the layout holds",
        ],
        WorkCategory::Integration => &[
            "Walk the complete user flow from page load to persisted data",
            "Perform a mutation and confirm dependent views update without a reload",
            "Run the automated test suite and confirm the new tests pass",
        ],
        WorkCategory::General => &[
            "Check each listed requirement against the implementation",
            "Run the existing test suite and confirm nothing regressed",
        ],
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn summary_line(s: &UnitSummary, with_section: bool) -> String {
    let ids = s.requirement_ids.join(", ");
    if with_section {
        format!(
            "- **{}** Section {} ({}) - {}: {}\n",
            s.id, s.id.section, s.section_title, s.category, ids
        )
    } else {
        format!("- **{}** {}: {}\n", s.id, s.category, ids)
    }
}

/// Render one unit given the identities of every unit completed before it.
///
/// Pure: the same unit and the same `completed` list always produce the same
/// text. Only entries of `completed` that precede `unit` are referenced.
pub fn render_prompt(unit: &PromptUnit, completed: &[UnitSummary], ctx: &RenderContext) -> String {
    let earlier: Vec<&UnitSummary> = completed.iter().filter(|s| s.id < unit.id).collect();
    let same_section: Vec<&UnitSummary> = earlier
        .iter()
        .copied()
        .filter(|s| s.id.section == unit.id.section)
        .collect();
    let previous_sections: Vec<&UnitSummary> = earlier
        .iter()
        .copied()
        .filter(|s| s.id.section < unit.id.section)
        .collect();
    let earlier_ids: Vec<UnitId> = earlier.iter().map(|s| s.id).collect();
    let depends_on = dependencies_among(unit.id, &earlier_ids);

    let mut doc = String::new();

    doc.push_str(&format!("# Execution Prompt: {}\n\n", unit.id));
    if let Some(ref project) = ctx.project_name {
        doc.push_str(&format!("**Project**: {project}  \n"));
    }
    doc.push_str(&format!(
        "**Section**: {} - {}  \n",
        unit.section.number, unit.section.title
    ));
    doc.push_str(&format!(
        "**Category**: {} ({})  \n",
        unit.category,
        unit.category.description()
    ));
    let deps = if depends_on.is_empty() {
        "None".to_string()
    } else {
        depends_on
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    doc.push_str(&format!("**Depends On**: {deps}  \n"));
    doc.push_str(&format!(
        "**Estimated Effort**: {}\n",
        unit.category.estimate(unit.requirements.len())
    ));

    if let Some(ref env) = ctx.environment {
        if !env.trim().is_empty() {
            doc.push_str("\n---\n\n## Environment Context\n\n");
            doc.push_str(env.trim_end());
            doc.push('\n');
        }
    }

    doc.push_str("\n---\n\n## Previously Completed\n\n");
    doc.push_str("### Earlier in This Section\n\n");
    if same_section.is_empty() {
        doc.push_str("None - this is the first unit in this section.\n");
    } else {
        for s in &same_section {
            doc.push_str(&summary_line(s, false));
        }
    }
    doc.push_str("\n### From Previous Sections\n\n");
    if previous_sections.is_empty() {
        doc.push_str("None - this is the first section.\n");
    } else {
        for s in &previous_sections {
            doc.push_str(&summary_line(s, true));
        }
    }
    doc.push_str("\nEverything listed above is in place. Build on it; do not recreate it.\n");

    doc.push_str("\n---\n\n## This Unit Must Produce\n\n");
    doc.push_str(&format!(
        "This unit implements **{} requirement(s)** in the {} category:\n\n",
        unit.requirements.len(),
        unit.category
    ));
    for r in &unit.requirements {
        doc.push_str(&format!("- {}: {}\n", r.label(), r.title));
    }
    doc.push_str(&format!("\n{}\n", deliverable(unit.category)));
    if unit.requirements.iter().any(|r| r.categories.len() > 1) {
        doc.push_str(
            "\nRequirements that span several categories appear in each matching unit. \
             Implement only the parts that fall in this unit's category.\n",
        );
    }

    doc.push_str("\n---\n\n## Requirements\n\n");
    for (i, r) in unit.requirements.iter().enumerate() {
        if i > 0 {
            doc.push_str("\n---\n\n");
        }
        doc.push_str(r.content.trim_end());
        doc.push('\n');
    }

    doc.push_str("\n---\n\n## Acceptance Criteria\n\n");
    for item in acceptance_criteria(unit.category) {
        doc.push_str(&format!("- [ ] {item}\n"));
    }

    doc.push_str("\n---\n\n## Validation Steps\n\n");
    for (i, step) in validation_steps(unit.category).iter().enumerate() {
        doc.push_str(&format!("{}. {step}\n", i + 1));
    }

    doc.push_str("\n---\n\n## Do Not\n\n");
    for &other in WorkCategory::all() {
        if other == unit.category || other == WorkCategory::General {
            continue;
        }
        match same_section.iter().find(|s| s.category == other) {
            Some(s) => doc.push_str(&format!(
                "- Do not rework {} delivered by {}; use it as it is\n",
                scope(other),
                s.id
            )),
            None => doc.push_str(&format!(
                "- Do not implement {} work ({}); it belongs to a separate unit\n",
                other,
                scope(other)
            )),
        }
    }
    doc.push_str("- Do not implement requirements that are not listed under This Unit Must Produce\n");
    doc.push_str("- Do not start work belonging to later sections\n");
    doc.push_str("- Do not add dependencies or tooling the requirements do not call for\n");

    doc.push_str("\n---\n\n**Prompt Status**: Ready for execution\n");

    doc
}

/// Render every unit of `plan` in order, threading the identities of the
/// units rendered so far through each step.
pub fn render_plan(plan: &ExecutionPlan, ctx: &RenderContext, prefix: &str) -> Vec<ExecutionPrompt> {
    let (prompts, _completed) = plan.units.iter().fold(
        (Vec::with_capacity(plan.units.len()), Vec::<UnitSummary>::new()),
        |(mut prompts, mut completed), unit| {
            let content = render_prompt(unit, &completed, ctx);
            prompts.push(ExecutionPrompt {
                id: unit.id,
                category: unit.category,
                requirement_ids: unit.requirement_ids(),
                filename: prompt_filename(prefix, unit.id),
                content,
            });
            completed.push(unit.summary());
            (prompts, completed)
        },
    );
    prompts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
