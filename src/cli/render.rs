//! `render` command: diagrams to PNG, SVG or PDF.

use std::error::Error;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::RenderArgs;
use crate::config::SiteConfig;
use crate::core;
use crate::log;
use crate::render::{self, BatchReport, ChromeBrowser, ConversionJob, RenderError, Viewers};

pub fn run_render(args: &RenderArgs, config: &SiteConfig) -> Result<()> {
    let jobs = plan_jobs(args)?;
    let browser = ChromeBrowser::from_config(&config.render);
    let viewers = Viewers::new(config.render.viewer.clone());
    let options = config.render.options();

    core::enable_graceful_shutdown();
    if let (Some(output), [input]) = (&args.output, args.inputs.as_slice()) {
        render::convert(&browser, input, output, &options, &viewers)
            .map_err(|e| anyhow::anyhow!(describe(&e)))
            .with_context(|| format!("failed to render {}", input.display()))?;
        log!("render"; "{} -> {}", input.display(), output.display());
        return Ok(());
    }

    let report = render::convert_all(&browser, &jobs, &options, &viewers)
        .map_err(|e| anyhow::anyhow!(describe(&e)))
        .context("render batch aborted")?;

    print_report(&report);

    let failures = report.failures();
    if failures > 0 {
        bail!("{failures} render failure(s)");
    }
    Ok(())
}

/// One job per input.
///
/// `--output` names the single output directly; otherwise each format
/// becomes `{stem}.{format}` in `--out-dir` or next to the input.
fn plan_jobs(args: &RenderArgs) -> Result<Vec<ConversionJob>> {
    if args.output.is_some() && args.inputs.len() > 1 {
        bail!("--output needs exactly one input, use --out-dir for several");
    }

    args.inputs
        .iter()
        .map(|input| {
            let outputs = match &args.output {
                Some(output) => vec![output.clone()],
                None => derived_outputs(input, args.out_dir.as_deref(), &args.formats)?,
            };
            Ok(ConversionJob::new(input, outputs))
        })
        .collect()
}

fn derived_outputs(input: &Path, out_dir: Option<&Path>, formats: &[String]) -> Result<Vec<PathBuf>> {
    let stem = input
        .file_stem()
        .with_context(|| format!("`{}` has no file name", input.display()))?;
    let dir = out_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new(""));

    Ok(formats
        .iter()
        .map(|format| format.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|format| !format.is_empty())
        .map(|format| {
            let mut name = stem.to_os_string();
            name.push(".");
            name.push(format);
            dir.join(name)
        })
        .collect())
}

fn print_report(report: &BatchReport) {
    for job in &report.jobs {
        if let Some(e) = &job.error {
            log!("error"; "{}: {}", job.input.display(), describe(e));
            continue;
        }
        for output in &job.outputs {
            match &output.result {
                Ok(()) => log!("render"; "{} -> {}", job.input.display(), output.path.display()),
                Err(e) => log!("error"; "{}: {}", output.path.display(), describe(e)),
            }
        }
    }
}

/// Error message including its source, if any.
fn describe(error: &RenderError) -> String {
    match error.source() {
        Some(source) => format!("{error}: {source}"),
        None => error.to_string(),
    }
}
