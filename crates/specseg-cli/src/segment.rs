use crate::Cli;
use anyhow::{bail, Context};
use specseg_core::config::{SegmentConfig, WarnLevel};
use specseg_core::manifest::ManifestRow;
use specseg_core::pipeline::{self, SegmentOptions, SegmentOutcome};

pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => SegmentConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SegmentConfig::default(),
    };
    if let Some(prefix) = &cli.prefix {
        config.prefix = prefix.clone();
    }

    let mut errors = Vec::new();
    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => tracing::warn!("config: {}", w.message),
            WarnLevel::Error => errors.push(w.message),
        }
    }
    if !errors.is_empty() {
        bail!("invalid config: {}", errors.join("; "));
    }

    let options = SegmentOptions {
        input: cli.input.clone(),
        output_dir: cli.output_dir.clone(),
        config,
        clean: cli.clean,
        dry_run: cli.dry_run,
    };

    let outcome = pipeline::run(&options, chrono::Utc::now())
        .with_context(|| format!("failed to segment {}", cli.input.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

fn print_summary(outcome: &SegmentOutcome) {
    if outcome.prompts.is_empty() {
        println!("No execution prompts generated.");
    } else {
        print_plan(&outcome.manifest.rows);
    }

    println!();
    println!("Sections:      {}", outcome.sections);
    println!("Requirements:  {}", outcome.requirements);
    println!("Placements:    {}", outcome.placements);
    println!("Prompts:       {}", outcome.prompts.len());
    if outcome.removed > 0 {
        println!("Removed:       {} stale prompt(s)", outcome.removed);
    }
    if outcome.dry_run {
        println!("Output:        (dry run, nothing written)");
    } else {
        println!("Output:        {}", outcome.output_dir.display());
        println!("Manifest:      {}", outcome.manifest_path.display());
    }
    if let Some(first) = outcome.first_prompt() {
        println!("Start with:    {first}");
    }
}

/// Execution-order table: one line per prompt, columns padded to the widest cell.
fn print_plan(rows: &[ManifestRow]) {
    let header: Vec<String> = ["#", "FILE", "CATEGORY", "REQUIREMENTS"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.output_filename.clone(),
                r.category.to_string(),
                r.fr_ids.join(", "),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    for row in std::iter::once(&header).chain(std::iter::once(&rule)).chain(&body) {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:w$}", w = *w))
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}
