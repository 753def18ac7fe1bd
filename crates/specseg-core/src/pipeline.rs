use crate::config::SegmentConfig;
use crate::document::SpecificationDocument;
use crate::error::Result;
use crate::grouper::ExecutionPlan;
use crate::io::{atomic_write, ensure_dir, remove_files};
use crate::manifest::Manifest;
use crate::parser::parse;
use crate::paths::{existing_prompts, manifest_path, prompt_path};
use crate::render::{render_plan, ExecutionPrompt, RenderContext};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SegmentOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub config: SegmentConfig,
    /// Delete prompts left by an earlier run before writing.
    pub clean: bool,
    /// Build and render everything but write nothing.
    pub dry_run: bool,
}

impl SegmentOptions {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            config: SegmentConfig::default(),
            clean: false,
            dry_run: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Prepared
// ---------------------------------------------------------------------------

/// The complete in-memory result of a run, before anything touches disk.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub document: SpecificationDocument,
    pub plan: ExecutionPlan,
    pub prompts: Vec<ExecutionPrompt>,
    pub manifest: Manifest,
}

/// Read, parse, classify, group and render. Fails only if the input cannot
/// be read, the vocabulary does not compile, or the document repeats a
/// section number or requirement id.
pub fn prepare(input: &Path, config: &SegmentConfig) -> Result<Prepared> {
    let document = SpecificationDocument::read(input)?;
    info!(path = %document.path().display(), bytes = document.text().len(), "read specification");

    let classifier = config.classifier()?;
    let outline = parse(&document)?;
    info!(
        sections = outline.sections.len(),
        requirements = outline.requirement_count(),
        "parsed outline"
    );

    let plan = ExecutionPlan::build(&document, &outline, &classifier);
    let ctx = RenderContext {
        project_name: config.project_name.clone(),
        environment: config.context.clone(),
    };
    let prompts = render_plan(&plan, &ctx, &config.prefix);
    let manifest = Manifest::new(&plan, &prompts, config.project_name.clone());

    Ok(Prepared {
        document,
        plan,
        prompts,
        manifest,
    })
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SegmentOutcome {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub dry_run: bool,
    pub sections: usize,
    pub requirements: usize,
    pub placements: usize,
    pub prompts: Vec<ExecutionPrompt>,
    pub manifest: Manifest,
    pub removed: usize,
    pub warnings: Vec<String>,
}

impl SegmentOutcome {
    pub fn first_prompt(&self) -> Option<&str> {
        self.prompts.first().map(|p| p.filename.as_str())
    }
}

/// Run the whole transformation and write the artifacts. Nothing is written
/// until every prompt and the manifest have been rendered in memory.
pub fn run(options: &SegmentOptions, now: DateTime<Utc>) -> Result<SegmentOutcome> {
    let prepared = prepare(&options.input, &options.config)?;
    let Prepared {
        document,
        plan,
        prompts,
        manifest,
    } = prepared;

    let out_dir = &options.output_dir;
    let manifest_file = manifest_path(out_dir, &options.config.manifest_file);
    let manifest_text = manifest.render(now);
    let mut warnings = plan.warnings.clone();
    let mut removed = 0;

    if options.dry_run {
        info!("dry run: nothing written");
    } else {
        if out_dir.is_dir() {
            let msg = format!(
                "output directory already exists, files may be overwritten: {}",
                out_dir.display()
            );
            warn!("{msg}");
            warnings.push(msg);
        }
        ensure_dir(out_dir)?;

        if options.clean {
            let stale = existing_prompts(out_dir, &options.config.prefix)?;
            removed = remove_files(&stale)?;
            info!(removed, "removed previously generated prompts");
        }

        for prompt in &prompts {
            let path = prompt_path(out_dir, &options.config.prefix, prompt.id);
            atomic_write(&path, prompt.content.as_bytes())?;
            info!(file = %prompt.filename, "wrote prompt");
        }
        atomic_write(&manifest_file, manifest_text.as_bytes())?;
        info!(file = %manifest_file.display(), "wrote manifest");
    }

    Ok(SegmentOutcome {
        input: document.path().to_path_buf(),
        output_dir: out_dir.clone(),
        manifest_path: manifest_file,
        dry_run: options.dry_run,
        sections: plan.sections.len(),
        requirements: plan.requirement_count,
        placements: plan.placement_count(),
        prompts,
        manifest,
        removed,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
