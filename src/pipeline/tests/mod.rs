use super::*;
use crate::error::ExtractionError;
use crate::test_support::{scripted_toolchain, write_docx, write_pdf};
use lopdf::Document;
use std::io::Write;
use tempfile::TempDir;

// -----------------------------------------------------------------------
// Fixtures
// -----------------------------------------------------------------------

fn zip_of(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = ::zip::ZipWriter::new(&mut buffer);
        for (name, data) in entries {
            writer
                .start_file(*name, ::zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }
    buffer.into_inner()
}

fn pdf_bytes(dir: &Path, labels: &[&str]) -> Vec<u8> {
    let path = dir.join("fixture.pdf");
    write_pdf(&path, labels);
    std::fs::read(path).unwrap()
}

fn docx_bytes(dir: &Path, body: &str) -> Vec<u8> {
    let path = dir.join("fixture.docx");
    write_docx(&path, body);
    std::fs::read(path).unwrap()
}

fn image_bytes(dir: &Path, name: &str) -> Vec<u8> {
    let path = dir.join(name);
    image::RgbImage::from_fn(64, 48, |x, y| image::Rgb([(x * 4) as u8, (y * 5) as u8, 90]))
        .save(&path)
        .unwrap();
    std::fs::read(path).unwrap()
}

struct Harness {
    _temp: TempDir,
    fixtures: PathBuf,
    config: Arc<Config>,
    pipeline: Pipeline,
    events: broadcast::Receiver<Event>,
}

impl Harness {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let fixtures = temp.path().join("fixtures");
        std::fs::create_dir_all(&fixtures).unwrap();
        let config = Arc::new(Config {
            work_dir: temp.path().join("work"),
            ..Default::default()
        });
        let (event_tx, events) = broadcast::channel(256);
        let pipeline = Pipeline::new(config.clone(), scripted_toolchain(), event_tx);
        Self {
            _temp: temp,
            fixtures,
            config,
            pipeline,
            events,
        }
    }

    fn upload(name: &str, data: Vec<u8>) -> Source {
        Source::Bytes {
            name: Some(name.to_string()),
            data,
        }
    }

    fn scratch_dirs(&self) -> Vec<String> {
        std::fs::read_dir(&self.config.work_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("scratch_"))
            .collect()
    }

    fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

fn page_text(doc: &Document, page: u32) -> String {
    doc.extract_text(&[page]).unwrap_or_default()
}

fn page_has_image(doc: &Document, page: u32) -> bool {
    let page_id = doc.get_pages()[&page];
    let page_dict = doc.get_dictionary(page_id).unwrap();
    let Ok(resources) = page_dict.get(b"Resources") else {
        return false;
    };
    let (_, resources) = doc.dereference(resources).unwrap();
    let Ok(xobjects) = resources.as_dict().unwrap().get(b"XObject") else {
        return false;
    };
    let (_, xobjects) = doc.dereference(xobjects).unwrap();
    xobjects.as_dict().unwrap().iter().any(|(_, object)| {
        let (_, object) = doc.dereference(object).unwrap();
        object
            .as_stream()
            .ok()
            .and_then(|stream| stream.dict.get(b"Subtype").ok())
            .and_then(|subtype| subtype.as_name().ok())
            == Some(b"Image".as_slice())
    })
}

// -----------------------------------------------------------------------
// Successful runs
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_pdf_run_merges_in_discovery_order() {
    let mut h = Harness::new();
    let inner = zip_of(&[("d.docx", docx_bytes(&h.fixtures, "nested body"))]);
    let outer = zip_of(&[
        ("a.pdf", pdf_bytes(&h.fixtures, &["A1", "A2"])),
        ("b.jpg", image_bytes(&h.fixtures, "b.jpg")),
        ("c.zip", inner),
    ]);

    let id = TaskId::new();
    let summary = h
        .pipeline
        .run(id, Harness::upload("bundle.zip", outer), OutputMode::Pdf)
        .await
        .unwrap();

    assert_eq!(summary.output_path, h.config.output_dir_for(&id).join("final.pdf"));
    let doc = Document::load(&summary.output_path).unwrap();
    assert_eq!(doc.get_pages().len(), 4);
    assert!(page_text(&doc, 1).contains("A1"));
    assert!(page_text(&doc, 2).contains("A2"));
    assert!(page_has_image(&doc, 3));
    assert!(!page_has_image(&doc, 1));
    assert!(page_text(&doc, 4).contains('d'));

    assert_eq!(summary.stats.archives_expanded, 1);
    assert_eq!(summary.stats.files_eligible, 3);
    assert_eq!(summary.stats.files_converted, 3);
    assert_eq!(summary.stats.artifacts_included, 3);
    assert!(h.scratch_dirs().is_empty());

    let events = h.drain_events();
    assert!(events.iter().any(|e| matches!(e, Event::ArchiveExpanded { archive, .. } if archive == Path::new("c.zip"))));
    assert!(matches!(events.last(), Some(Event::Completed { .. })));
    let stages: Vec<Stage> = events
        .iter()
        .filter_map(|e| match e {
            Event::StageChanged { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            Stage::Downloading,
            Stage::ExpandingRoot,
            Stage::UnpackingRecursive,
            Stage::Normalizing,
            Stage::Aggregating,
            Stage::Cleanup,
        ]
    );
}

#[tokio::test]
async fn test_text_run_delimits_sources_and_drops_blank_ones() {
    let h = Harness::new();
    let archive = zip_of(&[
        ("notes.txt", b"meeting notes ".repeat(10)),
        ("blank.txt", vec![b' '; 200]),
        ("scan.png", image_bytes(&h.fixtures, "scan.png")),
    ]);

    let summary = h
        .pipeline
        .run(TaskId::new(), Harness::upload("texts.zip", archive), OutputMode::Text)
        .await
        .unwrap();

    let text = std::fs::read_to_string(&summary.output_path).unwrap();
    assert!(text.contains("\n--- notes.txt ---\nmeeting notes"));
    assert!(text.contains("\n--- scan.png ---\nocr[eng+rus] scan.png"));
    assert!(!text.contains("blank.txt"));
    assert!(text.find("notes.txt").unwrap() < text.find("scan.png").unwrap());
    assert_eq!(summary.stats.artifacts_included, 2);
    assert_eq!(summary.stats.artifacts_skipped, 1);
}

#[tokio::test]
async fn test_one_failed_file_does_not_fail_the_run() {
    let h = Harness::new();
    let archive = zip_of(&[
        ("good.pdf", pdf_bytes(&h.fixtures, &["good"])),
        ("will_fail.docx", docx_bytes(&h.fixtures, "never converted")),
    ]);

    let summary = h
        .pipeline
        .run(TaskId::new(), Harness::upload("mixed.zip", archive), OutputMode::Pdf)
        .await
        .unwrap();

    assert_eq!(summary.stats.files_eligible, 2);
    assert_eq!(summary.stats.files_failed, 1);
    assert_eq!(summary.stats.artifacts_included, 1);
    assert_eq!(Document::load(&summary.output_path).unwrap().get_pages().len(), 1);
}

// -----------------------------------------------------------------------
// Failed runs
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_archive_without_documents_reports_no_files_converted() {
    let mut h = Harness::new();
    let archive = zip_of(&[("data.bin", vec![7u8; 500]), (".DS_Store", vec![0u8; 500])]);

    let id = TaskId::new();
    let err = h
        .pipeline
        .run(id, Harness::upload("empty.zip", archive), OutputMode::Pdf)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Pipeline(PipelineError::NoFilesConverted { eligible: 0, .. })
    ));
    assert!(err.to_string().contains("no files converted"));
    assert!(!h.config.output_dir_for(&id).exists());
    assert!(h.scratch_dirs().is_empty());

    let events = h.drain_events();
    assert!(matches!(
        events.last(),
        Some(Event::Failed { stage: Stage::Normalizing, .. })
    ));
}

#[tokio::test]
async fn test_unreadable_pdfs_report_no_valid_artifacts() {
    let h = Harness::new();
    let archive = zip_of(&[("broken.pdf", b"%PDF-1.4 truncated ".repeat(20))]);

    let err = h
        .pipeline
        .run(TaskId::new(), Harness::upload("broken.zip", archive), OutputMode::Pdf)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Pipeline(PipelineError::NoValidArtifacts { converted: 1 })
    ));
}

#[tokio::test]
async fn test_corrupt_root_archive_is_fatal_and_cleaned_up() {
    let mut h = Harness::new();

    let err = h
        .pipeline
        .run(
            TaskId::new(),
            Harness::upload("bad.zip", b"PK definitely not a zip".repeat(10)),
            OutputMode::Pdf,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Extraction(ExtractionError::Failed { .. })));
    assert!(h.scratch_dirs().is_empty());
    assert!(h.drain_events().iter().any(|e| matches!(
        e,
        Event::Failed {
            stage: Stage::ExpandingRoot,
            ..
        }
    )));
}

#[tokio::test]
async fn test_non_archive_source_is_fatal() {
    let h = Harness::new();

    let err = h
        .pipeline
        .run(
            TaskId::new(),
            Harness::upload("letter", b"Dear reader, this is plain prose.".repeat(5)),
            OutputMode::Text,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Extraction(ExtractionError::NotAnArchive { .. })));
    assert!(h.scratch_dirs().is_empty());
}

#[tokio::test]
async fn test_discovery_can_be_sorted_by_relative_path() {
    let temp = TempDir::new().unwrap();
    for rel in ["b/z.txt", "a b/y.txt", "a/x.txt", "c.txt"] {
        let path = temp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    let files = discover_files(temp.path(), true).await.unwrap();
    let relative: Vec<PathBuf> = files.iter().map(|p| relative_to(p, temp.path())).collect();

    assert_eq!(
        relative,
        vec![
            PathBuf::from("a/x.txt"),
            PathBuf::from("a b/y.txt"),
            PathBuf::from("b/z.txt"),
            PathBuf::from("c.txt"),
        ]
    );
}
