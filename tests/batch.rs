//! Batch driver tests against an in-process renderer.
//!
//! `PageRenderer` is swapped for a fake that synthesises a 700×900 page from
//! the first byte of each file, so these run without a pdfium library.

use image::{Rgb, RgbImage};
use pdfstack::{
    inspect_with, run_batch, BatchConfig, BatchProgressCallback, ErrorKind, FailurePolicy,
    PageInfo, PageRenderer, PdfStackError, Region,
};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Page whose pixels encode their coordinates plus a per-file seed.
fn synthetic_page(seed: u8) -> RgbImage {
    RgbImage::from_fn(700, 900, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, seed])
    })
}

/// Renders `synthetic_page(first byte of file)`.
///
/// Files whose content starts with `broken` fail like an invalid PDF; files
/// starting with `empty` fail like a zero-page PDF.
struct FakeRenderer;

impl PageRenderer for FakeRenderer {
    fn render_first_page(&self, path: &Path) -> Result<RgbImage, PdfStackError> {
        let bytes = fs::read(path).map_err(|_| PdfStackError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        if bytes.starts_with(b"broken") {
            return Err(PdfStackError::InvalidDocument {
                path: path.to_path_buf(),
                detail: "FormatError".into(),
            });
        }
        if bytes.starts_with(b"empty") {
            return Err(PdfStackError::EmptyDocument {
                path: path.to_path_buf(),
            });
        }
        Ok(synthetic_page(bytes.first().copied().unwrap_or(0)))
    }

    fn inspect_first_page(&self, path: &Path) -> Result<PageInfo, PdfStackError> {
        let page = self.render_first_page(path)?;
        Ok(PageInfo {
            page_count: 1,
            width_px: page.width(),
            height_px: page.height(),
        })
    }
}

fn scenario_regions() -> Vec<Region> {
    vec![Region::new(90, 10, 680, 200), Region::new(90, 700, 680, 800)]
}

fn input_dir_with(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Scenario ─────────────────────────────────────────────────────────────────

#[test]
fn two_pdfs_and_a_text_file() {
    let input = input_dir_with(&[("a.pdf", "A"), ("b.pdf", "B"), ("notes.txt", "hello")]);
    let out = tempfile::tempdir().unwrap();
    let config = BatchConfig::builder(input.path(), out.path())
        .regions(scenario_regions())
        .build()
        .unwrap();

    let report = run_batch(&FakeRenderer, &config).expect("batch should succeed");

    assert_eq!(report.stats.total_files, 2);
    assert_eq!(report.stats.succeeded, 2);
    assert_eq!(report.stats.failed, 0);
    assert_eq!(sorted_names(out.path()), vec!["a_combined.png", "b_combined.png"]);

    for outcome in &report.files {
        assert_eq!((outcome.width, outcome.height), (590, 290));
        let png = image::open(outcome.output.as_ref().unwrap()).unwrap().to_rgb8();
        assert_eq!(png.dimensions(), (590, 290));
    }
}

#[test]
fn crops_land_at_running_offsets() {
    let input = input_dir_with(&[("a.pdf", "A")]);
    let out = tempfile::tempdir().unwrap();
    let config = BatchConfig::builder(input.path(), out.path())
        .regions(scenario_regions())
        .build()
        .unwrap();

    run_batch(&FakeRenderer, &config).unwrap();

    let page = synthetic_page(b'A');
    let png = image::open(out.path().join("a_combined.png")).unwrap().to_rgb8();
    // Region 0 starts at row 0, region 1 at row 190.
    assert_eq!(png.get_pixel(0, 0), page.get_pixel(90, 10));
    assert_eq!(png.get_pixel(589, 189), page.get_pixel(679, 199));
    assert_eq!(png.get_pixel(0, 190), page.get_pixel(90, 700));
    assert_eq!(png.get_pixel(589, 289), page.get_pixel(679, 799));
}

#[test]
fn rerun_is_byte_identical() {
    let input = input_dir_with(&[("a.pdf", "A"), ("b.pdf", "B")]);
    let out = tempfile::tempdir().unwrap();
    let config = BatchConfig::builder(input.path(), out.path())
        .regions(scenario_regions())
        .build()
        .unwrap();

    run_batch(&FakeRenderer, &config).unwrap();
    let first_a = fs::read(out.path().join("a_combined.png")).unwrap();
    let first_b = fs::read(out.path().join("b_combined.png")).unwrap();

    run_batch(&FakeRenderer, &config).unwrap();
    assert_eq!(fs::read(out.path().join("a_combined.png")).unwrap(), first_a);
    assert_eq!(fs::read(out.path().join("b_combined.png")).unwrap(), first_b);
    assert_ne!(first_a, first_b);
}

#[test]
fn output_dir_is_created_recursively() {
    let input = input_dir_with(&[("a.pdf", "A")]);
    let out = tempfile::tempdir().unwrap();
    let nested = out.path().join("deep/er/output");
    let config = BatchConfig::builder(input.path(), &nested)
        .region(Region::new(0, 0, 10, 10))
        .build()
        .unwrap();

    run_batch(&FakeRenderer, &config).unwrap();
    assert!(nested.join("a_combined.png").is_file());
}

#[test]
fn empty_input_dir_is_a_successful_no_op() {
    let input = input_dir_with(&[("readme.md", "#")]);
    let out = tempfile::tempdir().unwrap();
    let config = BatchConfig::builder(input.path(), out.path())
        .region(Region::new(0, 0, 10, 10))
        .build()
        .unwrap();

    let report = run_batch(&FakeRenderer, &config).unwrap();
    assert_eq!(report.stats.total_files, 0);
    assert!(report.files.is_empty());
    assert!(sorted_names(out.path()).is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_file_names_are_processed_and_reported() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let input = input_dir_with(&[("a.pdf", "A")]);
    fs::write(input.path().join(OsStr::from_bytes(b"r\xe9sum\xe9.pdf")), "R").unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = BatchConfig::builder(input.path(), out.path())
        .regions(scenario_regions())
        .build()
        .unwrap();

    let report = run_batch(&FakeRenderer, &config).unwrap();
    assert_eq!(report.stats.succeeded, 2);
    assert!(out
        .path()
        .join(OsStr::from_bytes(b"r\xe9sum\xe9_combined.png"))
        .is_file());

    let json = serde_json::to_string(&report).expect("report serialises");
    assert!(json.contains("_combined.png"));
}

// ── Inspection ───────────────────────────────────────────────────────────────

#[test]
fn inspect_lists_every_pdf_and_keeps_per_file_errors() {
    let input = input_dir_with(&[("a.pdf", "A"), ("b.pdf", "broken"), ("notes.txt", "x")]);

    let rows = inspect_with(&FakeRenderer, input.path()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0.file_name().unwrap(), "a.pdf");
    assert_eq!(
        rows[0].1.as_ref().unwrap(),
        &PageInfo {
            page_count: 1,
            width_px: 700,
            height_px: 900
        }
    );
    assert!(matches!(
        rows[1].1,
        Err(PdfStackError::InvalidDocument { .. })
    ));
}

// ── Failure policy ───────────────────────────────────────────────────────────

#[test]
fn abort_stops_at_first_failure_and_names_the_file() {
    let input = input_dir_with(&[("a.pdf", "A"), ("b.pdf", "broken"), ("c.pdf", "C")]);
    let out = tempfile::tempdir().unwrap();
    let config = BatchConfig::builder(input.path(), out.path())
        .regions(scenario_regions())
        .build()
        .unwrap();

    let err = run_batch(&FakeRenderer, &config).unwrap_err();
    match &err {
        PdfStackError::FileFailed { path, source } => {
            assert_eq!(path.file_name().unwrap(), "b.pdf");
            assert!(matches!(**source, PdfStackError::InvalidDocument { .. }));
        }
        other => panic!("expected FileFailed, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Document);
    // a.pdf was done before b.pdf failed; c.pdf was never reached.
    assert_eq!(sorted_names(out.path()), vec!["a_combined.png"]);
}

#[test]
fn skip_records_failures_and_continues() {
    let input = input_dir_with(&[("a.pdf", "A"), ("b.pdf", "broken"), ("c.pdf", "empty")]);
    let out = tempfile::tempdir().unwrap();
    let config = BatchConfig::builder(input.path(), out.path())
        .regions(scenario_regions())
        .on_error(FailurePolicy::Skip)
        .build()
        .unwrap();

    let report = run_batch(&FakeRenderer, &config).unwrap();
    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(report.stats.failed, 2);
    assert_eq!(report.outputs().count(), 1);

    let failed: Vec<String> = report
        .files
        .iter()
        .filter(|f| !f.is_success())
        .map(|f| f.input.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(failed, vec!["b.pdf", "c.pdf"]);
    assert!(report
        .files
        .iter()
        .filter_map(|f| f.error.as_ref())
        .all(|e| e.kind == ErrorKind::Document));

    let err = report.into_result().unwrap_err();
    assert!(matches!(
        err,
        PdfStackError::PartialFailure {
            succeeded: 1,
            failed: 2,
            total: 3
        }
    ));
}

#[test]
fn region_outside_page_is_a_geometry_failure() {
    let input = input_dir_with(&[("a.pdf", "A")]);
    let out = tempfile::tempdir().unwrap();
    let config = BatchConfig::builder(input.path(), out.path())
        .region(Region::new(0, 0, 10, 10))
        .region(Region::new(0, 850, 700, 950))
        .build()
        .unwrap();

    let err = run_batch(&FakeRenderer, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Geometry);
    assert!(err.to_string().contains("a.pdf"), "got: {err}");
    assert!(sorted_names(out.path()).is_empty());
}

#[test]
fn missing_input_dir_is_fatal() {
    let out = tempfile::tempdir().unwrap();
    let config = BatchConfig::builder(out.path().join("missing"), out.path().join("o"))
        .region(Region::new(0, 0, 10, 10))
        .build()
        .unwrap();

    let err = run_batch(&FakeRenderer, &config).unwrap_err();
    assert!(matches!(err, PdfStackError::InputDirNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::Filesystem);
}

// ── Progress callback ────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl BatchProgressCallback for RecordingCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.events.lock().unwrap().push(format!("start {total_files}"));
    }

    fn on_file_start(&self, file_num: usize, total_files: usize, _input: &Path) {
        self.events
            .lock()
            .unwrap()
            .push(format!("file {file_num}/{total_files}"));
    }

    fn on_file_complete(
        &self,
        file_num: usize,
        _total: usize,
        _input: &Path,
        output: &Path,
        width: u32,
        height: u32,
    ) {
        let name = output.file_name().unwrap().to_string_lossy().into_owned();
        self.events
            .lock()
            .unwrap()
            .push(format!("done {file_num} {name} {width}x{height}"));
    }

    fn on_file_error(&self, file_num: usize, _total: usize, _input: &Path, _error: &str) {
        self.events.lock().unwrap().push(format!("error {file_num}"));
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("end {success_count}/{total_files}"));
    }
}

#[test]
fn progress_events_arrive_in_order() {
    let input = input_dir_with(&[("b.pdf", "broken"), ("a.pdf", "A")]);
    let out = tempfile::tempdir().unwrap();
    let recorder = Arc::new(RecordingCallback::default());
    let config = BatchConfig::builder(input.path(), out.path())
        .regions(scenario_regions())
        .on_error(FailurePolicy::Skip)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    run_batch(&FakeRenderer, &config).unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 2",
            "file 1/2",
            "done 1 a_combined.png 590x290",
            "file 2/2",
            "error 2",
            "end 1/2",
        ]
    );
}
