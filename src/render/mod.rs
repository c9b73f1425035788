//! Headless diagram rasterizer.
//!
//! A batch of conversion jobs shares one browser session. Each job gets its
//! own page: the bootstrap document is loaded, the family's viewer library is
//! injected, the diagram is opened and measured, and every requested output
//! is captured from that single load.
//!
//! Failures are contained as narrowly as possible:
//! - an unsupported output extension fails that output only
//! - a diagram that cannot be read or rendered fails that job only
//! - losing the browser process aborts the batch
//!
//! The session is closed exactly once on every path.

mod browser;
mod cdp;
mod error;
mod job;
mod viewer;

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use browser::{Browser, Clip, Page, ScopedSession, Session, Viewport};
pub use cdp::ChromeBrowser;
pub use error::RenderError;
pub use job::{
    ConversionJob, Footer, MinDimensions, OutputFormat, RenderOptions, TitleOption,
    effective_title,
};
pub use viewer::Viewers;

use crate::asset::AssetFamily;
use crate::logger::ProgressLine;
use crate::{core, debug};

/// Size reported by the in-page `openDiagram`, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Dimensions {
    /// Full page width.
    width: f64,
    /// Full page height, footer included.
    height: f64,
    /// Title plus canvas, the region captured for raster outputs.
    diagram_height: f64,
}

/// Outcome of one output file.
#[derive(Debug)]
pub struct OutputReport {
    pub path: PathBuf,
    pub result: Result<(), RenderError>,
}

/// Outcome of one job. `error` is set when the diagram never loaded.
#[derive(Debug)]
pub struct JobReport {
    pub input: PathBuf,
    pub error: Option<RenderError>,
    pub outputs: Vec<OutputReport>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.outputs.iter().all(|o| o.result.is_ok())
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub jobs: Vec<JobReport>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.jobs.iter().all(JobReport::is_success)
    }

    /// Number of failed outputs plus jobs that failed before any output.
    pub fn failures(&self) -> usize {
        self.jobs
            .iter()
            .map(|job| match job.error {
                Some(_) => 1,
                None => job.outputs.iter().filter(|o| o.result.is_err()).count(),
            })
            .sum()
    }
}

/// Run every job in one browser session.
///
/// Returns `Err` only when the browser cannot be launched or is lost
/// mid-batch; per-job and per-output failures are in the report.
pub fn convert_all(
    browser: &dyn Browser,
    jobs: &[ConversionJob],
    options: &RenderOptions,
    viewers: &Viewers,
) -> Result<BatchReport, RenderError> {
    let mut session = ScopedSession::acquire(browser)?;

    let progress = (jobs.len() > 1 && std::io::stdout().is_terminal())
        .then(|| ProgressLine::new(&[("diagrams", jobs.len())]));

    let mut report = BatchReport::default();
    for job in jobs {
        if core::is_shutdown() {
            drop(progress);
            session.finish()?;
            return Err(RenderError::Process("interrupted".into()));
        }

        let outcome = session.with_page(|page| render_job(page, job, options, viewers));
        let job_report = match outcome {
            Ok(outputs) => JobReport {
                input: job.input.clone(),
                error: None,
                outputs,
            },
            Err(e) if e.is_fatal() => {
                drop(progress);
                if let Err(close) = session.finish() {
                    debug!("render"; "failed to close browser after fatal error: {close}");
                }
                return Err(e);
            }
            Err(e) => {
                debug!("render"; "{}: {e}", job.input.display());
                JobReport {
                    input: job.input.clone(),
                    error: Some(e),
                    outputs: Vec::new(),
                }
            }
        };
        report.jobs.push(job_report);

        if let Some(progress) = &progress {
            progress.inc("diagrams");
        }
    }

    if let Some(progress) = progress {
        progress.finish();
    }
    session.finish()?;
    Ok(report)
}

/// Convert a single input to a single output.
pub fn convert(
    browser: &dyn Browser,
    input: &Path,
    output: &Path,
    options: &RenderOptions,
    viewers: &Viewers,
) -> Result<(), RenderError> {
    let job = ConversionJob::new(input, vec![output.to_path_buf()]);
    let report = convert_all(browser, std::slice::from_ref(&job), options, viewers)?;

    let Some(job) = report.jobs.into_iter().next() else {
        return Ok(());
    };
    if let Some(e) = job.error {
        return Err(e);
    }
    job.outputs
        .into_iter()
        .try_for_each(|output| output.result)
}

/// Render `input` to PNG bytes in a short-lived session.
pub fn preview_png(
    browser: &dyn Browser,
    input: &Path,
    options: &RenderOptions,
    viewers: &Viewers,
) -> Result<Vec<u8>, RenderError> {
    let mut session = ScopedSession::acquire(browser)?;
    let bytes = session.with_page(|page| {
        let dims = load_diagram(page, input, options, viewers)?;
        capture(page, OutputFormat::Png, dims)
    })?;
    session.finish()?;
    Ok(bytes)
}

/// Load the diagram once, then produce every output of the job.
///
/// Fatal errors while writing outputs abort the job (and the batch);
/// anything else is recorded on that output.
fn render_job(
    page: &mut dyn Page,
    job: &ConversionJob,
    options: &RenderOptions,
    viewers: &Viewers,
) -> Result<Vec<OutputReport>, RenderError> {
    let dims = load_diagram(page, &job.input, options, viewers)?;

    let mut outputs = Vec::with_capacity(job.outputs.len());
    for path in &job.outputs {
        let result = match render_output(page, path, dims) {
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!("render"; "{}: {e}", path.display());
                Err(e)
            }
            Ok(()) => Ok(()),
        };
        outputs.push(OutputReport {
            path: path.clone(),
            result,
        });
    }
    Ok(outputs)
}

fn render_output(page: &mut dyn Page, path: &Path, dims: Dimensions) -> Result<(), RenderError> {
    let format = OutputFormat::from_path(path)?;
    let bytes = capture(page, format, dims)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| RenderError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| RenderError::io(path, e))
}

/// Open `input` in `page` and size the viewport to fit it.
fn load_diagram(
    page: &mut dyn Page,
    input: &Path,
    options: &RenderOptions,
    viewers: &Viewers,
) -> Result<Dimensions, RenderError> {
    let family = AssetFamily::from_path(input).ok_or_else(|| {
        RenderError::Render(format!("`{}` is not a diagram file", input.display()))
    })?;
    let source = fs::read_to_string(input).map_err(|e| RenderError::io(input, e))?;

    page.set_content(&viewer::skeleton(family))?;
    page.evaluate(&viewers.injection(family)?)?;

    let opened = page.evaluate(&format!(
        "openDiagram({}, {})",
        viewer::js_string(&source),
        options.open_options(input)
    ))?;
    let dims: Dimensions = serde_json::from_value(opened)
        .map_err(|e| RenderError::Render(format!("unexpected diagram size: {e}")))?;

    page.set_viewport(Viewport {
        width: css_pixels(dims.width),
        height: css_pixels(dims.height),
        device_scale_factor: options.scale(),
    })?;
    page.evaluate("resize()")?;

    Ok(dims)
}

/// Nearest whole CSS pixel, never below one.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to >= 1
fn css_pixels(value: f64) -> u32 {
    value.round().max(1.0) as u32
}

/// Encode the loaded diagram as `format`.
///
/// PDF covers the whole page including the footer; raster formats are
/// clipped to the diagram.
fn capture(
    page: &mut dyn Page,
    format: OutputFormat,
    dims: Dimensions,
) -> Result<Vec<u8>, RenderError> {
    match format {
        OutputFormat::Pdf => page.pdf(dims.width, dims.height),
        OutputFormat::Svg => match page.evaluate("toSVG()")? {
            serde_json::Value::String(svg) => Ok(svg.into_bytes()),
            other => Err(RenderError::Render(format!(
                "toSVG() returned {other} instead of markup"
            ))),
        },
        OutputFormat::Png | OutputFormat::Jpeg | OutputFormat::Webp => page.screenshot(
            format,
            Clip {
                x: 0.0,
                y: 0.0,
                width: dims.width,
                height: dims.diagram_height,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const FAIL: &str = "FAIL_RENDER";
    const CRASH: &str = "CRASH_BROWSER";

    #[derive(Default)]
    struct Calls {
        launches: AtomicUsize,
        closes: AtomicUsize,
        pages: AtomicUsize,
        opened: Mutex<Vec<String>>,
        viewports: Mutex<Vec<Viewport>>,
        clips: Mutex<Vec<Clip>>,
    }

    #[derive(Default)]
    struct MockBrowser {
        calls: Arc<Calls>,
        fail_launch: bool,
    }

    struct MockSession {
        calls: Arc<Calls>,
    }

    struct MockPage {
        calls: Arc<Calls>,
    }

    impl Browser for MockBrowser {
        fn launch(&self) -> Result<Box<dyn Session>, RenderError> {
            self.calls.launches.fetch_add(1, Ordering::SeqCst);
            if self.fail_launch {
                return Err(RenderError::Process("no browser".into()));
            }
            Ok(Box::new(MockSession {
                calls: Arc::clone(&self.calls),
            }))
        }
    }

    impl Session for MockSession {
        fn new_page(&mut self) -> Result<Box<dyn Page>, RenderError> {
            self.calls.pages.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockPage {
                calls: Arc::clone(&self.calls),
            }))
        }

        fn close(&mut self) -> Result<(), RenderError> {
            self.calls.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Page for MockPage {
        fn set_content(&mut self, _html: &str) -> Result<(), RenderError> {
            Ok(())
        }

        fn evaluate(&mut self, expression: &str) -> Result<Value, RenderError> {
            if expression.starts_with("openDiagram(") {
                self.calls.opened.lock().push(expression.to_string());
                if expression.contains(FAIL) {
                    return Err(RenderError::Render("cannot parse diagram".into()));
                }
                if expression.contains(CRASH) {
                    return Err(RenderError::Process("connection lost".into()));
                }
                return Ok(json!({ "width": 100.4, "height": 80.0, "diagramHeight": 60.0 }));
            }
            if expression == "toSVG()" {
                return Ok(Value::String("<svg/>".into()));
            }
            Ok(Value::Null)
        }

        fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError> {
            self.calls.viewports.lock().push(viewport);
            Ok(())
        }

        fn screenshot(&mut self, _format: OutputFormat, clip: Clip) -> Result<Vec<u8>, RenderError> {
            self.calls.clips.lock().push(clip);
            Ok(b"raster".to_vec())
        }

        fn pdf(&mut self, _width: f64, _height: f64) -> Result<Vec<u8>, RenderError> {
            Ok(b"%PDF".to_vec())
        }

        fn close(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn diagram(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn job(input: &Path, outputs: &[&str]) -> ConversionJob {
        let dir = input.parent().unwrap();
        ConversionJob::new(input, outputs.iter().map(|o| dir.join(o)).collect())
    }

    #[test]
    fn test_batch_shares_one_session() {
        let dir = TempDir::new().unwrap();
        let a = diagram(&dir, "a.bpmn", "<definitions/>");
        let b = diagram(&dir, "b.bpmn", FAIL);
        let c = diagram(&dir, "c.excalidraw", "{}");
        let jobs = [
            job(&a, &["a.png"]),
            job(&b, &["b.png"]),
            job(&c, &["c.png"]),
        ];

        let browser = MockBrowser::default();
        let report =
            convert_all(&browser, &jobs, &RenderOptions::default(), &Viewers::default()).unwrap();

        assert_eq!(browser.calls.launches.load(Ordering::SeqCst), 1);
        assert_eq!(browser.calls.closes.load(Ordering::SeqCst), 1);
        assert_eq!(report.jobs.len(), 3);
        assert!(report.jobs[0].is_success());
        assert!(matches!(report.jobs[1].error, Some(RenderError::Render(_))));
        assert!(report.jobs[2].is_success());
        assert_eq!(report.failures(), 1);
        assert!(dir.path().join("a.png").exists());
        assert!(!dir.path().join("b.png").exists());
        assert!(dir.path().join("c.png").exists());
    }

    #[test]
    fn test_unsupported_output_fails_alone() {
        let dir = TempDir::new().unwrap();
        let input = diagram(&dir, "flow.bpmn", "<definitions/>");
        let jobs = [job(&input, &["flow.png", "flow.tiff", "flow.svg"])];

        let browser = MockBrowser::default();
        let report =
            convert_all(&browser, &jobs, &RenderOptions::default(), &Viewers::default()).unwrap();

        let outputs = &report.jobs[0].outputs;
        assert!(outputs[0].result.is_ok());
        assert!(matches!(
            outputs[1].result,
            Err(RenderError::UnsupportedFormat(_))
        ));
        assert!(outputs[2].result.is_ok());
        assert_eq!(
            fs::read_to_string(dir.path().join("flow.svg")).unwrap(),
            "<svg/>"
        );
        assert!(!dir.path().join("flow.tiff").exists());
        // the diagram is loaded once for all outputs
        assert_eq!(browser.calls.opened.lock().len(), 1);
    }

    #[test]
    fn test_launch_failure_is_batch_error() {
        let dir = TempDir::new().unwrap();
        let input = diagram(&dir, "flow.bpmn", "<definitions/>");
        let browser = MockBrowser {
            fail_launch: true,
            ..MockBrowser::default()
        };

        let result = convert_all(
            &browser,
            &[job(&input, &["flow.png"])],
            &RenderOptions::default(),
            &Viewers::default(),
        );
        assert!(matches!(result, Err(RenderError::Process(_))));
        assert_eq!(browser.calls.closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_lost_browser_aborts_and_closes_once() {
        let dir = TempDir::new().unwrap();
        let a = diagram(&dir, "a.bpmn", CRASH);
        let b = diagram(&dir, "b.bpmn", "<definitions/>");
        let jobs = [job(&a, &["a.png"]), job(&b, &["b.png"])];

        let browser = MockBrowser::default();
        let result = convert_all(&browser, &jobs, &RenderOptions::default(), &Viewers::default());

        assert!(matches!(result, Err(RenderError::Process(_))));
        assert_eq!(browser.calls.pages.load(Ordering::SeqCst), 1);
        assert_eq!(browser.calls.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_input_extension_fails_job() {
        let dir = TempDir::new().unwrap();
        let input = diagram(&dir, "notes.txt", "hello");

        let browser = MockBrowser::default();
        let report = convert_all(
            &browser,
            &[job(&input, &["notes.png"])],
            &RenderOptions::default(),
            &Viewers::default(),
        )
        .unwrap();

        assert!(matches!(report.jobs[0].error, Some(RenderError::Render(_))));
        assert!(browser.calls.opened.lock().is_empty());
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = TempDir::new().unwrap();
        let browser = MockBrowser::default();
        let report = convert_all(
            &browser,
            &[job(&dir.path().join("gone.bpmn"), &["gone.png"])],
            &RenderOptions::default(),
            &Viewers::default(),
        )
        .unwrap();

        assert!(matches!(report.jobs[0].error, Some(RenderError::Io { .. })));
    }

    #[test]
    fn test_title_and_layout_reach_the_page() {
        let dir = TempDir::new().unwrap();
        let input = diagram(&dir, "order-flow.bpmn", "<definitions/>");
        let options = RenderOptions {
            device_scale_factor: Some(2.0),
            ..RenderOptions::default()
        };

        let browser = MockBrowser::default();
        convert(
            &browser,
            &input,
            &dir.path().join("out/order-flow.png"),
            &options,
            &Viewers::default(),
        )
        .unwrap();

        let opened = browser.calls.opened.lock();
        assert!(opened[0].contains(r#""title":"order-flow""#));

        let viewport = browser.calls.viewports.lock()[0];
        assert_eq!((viewport.width, viewport.height), (100, 80));
        assert_eq!(viewport.device_scale_factor, 2.0);

        // footer stays out of raster captures
        let clip = browser.calls.clips.lock()[0];
        assert_eq!(clip.height, 60.0);
        assert!(dir.path().join("out/order-flow.png").exists());
    }

    #[test]
    fn test_convert_reports_output_error() {
        let dir = TempDir::new().unwrap();
        let input = diagram(&dir, "flow.bpmn", "<definitions/>");

        let result = convert(
            &MockBrowser::default(),
            &input,
            &dir.path().join("flow.gif"),
            &RenderOptions::default(),
            &Viewers::default(),
        );
        assert!(matches!(result, Err(RenderError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_preview_png() {
        let dir = TempDir::new().unwrap();
        let input = diagram(&dir, "flow.excalidraw", "{}");

        let browser = MockBrowser::default();
        let bytes = preview_png(
            &browser,
            &input,
            &RenderOptions::default(),
            &Viewers::default(),
        )
        .unwrap();

        assert_eq!(bytes, b"raster");
        assert_eq!(browser.calls.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_css_pixels_rounds_to_nearest() {
        assert_eq!(css_pixels(100.4), 100);
        assert_eq!(css_pixels(100.5), 101);
        assert_eq!(css_pixels(80.2), 80);
        assert_eq!(css_pixels(0.2), 1);
    }

    #[test]
    fn test_preview_failure_still_closes_session() {
        let dir = TempDir::new().unwrap();
        let input = diagram(&dir, "flow.bpmn", FAIL);

        let browser = MockBrowser::default();
        let result = preview_png(
            &browser,
            &input,
            &RenderOptions::default(),
            &Viewers::default(),
        );

        assert!(matches!(result, Err(RenderError::Render(_))));
        assert_eq!(browser.calls.launches.load(Ordering::SeqCst), 1);
        assert_eq!(browser.calls.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_session_closes_once_on_panic() {
        let browser = MockBrowser::default();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut session = ScopedSession::acquire(&browser).unwrap();
            let _ = session.with_page(|_| -> Result<(), RenderError> {
                panic!("viewer crashed");
            });
        }));

        assert!(outcome.is_err());
        assert_eq!(browser.calls.pages.load(Ordering::SeqCst), 1);
        assert_eq!(browser.calls.closes.load(Ordering::SeqCst), 1);
    }
}
