use super::*;
use crate::test_support::{pdf_page_texts, scripted_toolchain, write_docx, write_pdf};
use tempfile::TempDir;

fn normalizer() -> Normalizer {
    Normalizer::new(scripted_toolchain(), ConversionConfig::default())
}

fn node(path: &Path) -> FileNode {
    FileNode::inspect(path, 0)
}

fn write_image(path: &Path) {
    ::image::RgbImage::from_pixel(20, 10, ::image::Rgb([40, 80, 120]))
        .save(path)
        .unwrap();
}

fn leftover_staging(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(".staging_"))
        .collect()
}

// -----------------------------------------------------------------------
// PDF mode
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_pdf_is_passed_through_unchanged() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let pdf = src.path().join("a.pdf");
    write_pdf(&pdf, &["one", "two"]);

    let result = normalizer().normalize(&node(&pdf), OutputMode::Pdf, out.path()).await;

    assert_eq!(result.artifact(), Some(pdf.as_path()));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_image_becomes_single_page_pdf() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let jpg = src.path().join("b.jpg");
    write_image(&jpg);

    let result = normalizer().normalize(&node(&jpg), OutputMode::Pdf, out.path()).await;

    let artifact = result.artifact().unwrap();
    assert_eq!(artifact, out.path().join("b.pdf"));
    assert_eq!(lopdf::Document::load(artifact).unwrap().get_pages().len(), 1);
}

#[tokio::test]
async fn test_office_documents_go_through_the_converter() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let docx = src.path().join("d.docx");
    write_docx(&docx, "body");

    let result = normalizer().normalize(&node(&docx), OutputMode::Pdf, out.path()).await;

    let artifact = result.artifact().unwrap();
    assert_eq!(artifact, out.path().join("d.pdf"));
    assert_eq!(pdf_page_texts(artifact), vec!["d".to_string()]);
    assert!(leftover_staging(out.path()).is_empty());
}

#[tokio::test]
async fn test_same_stem_from_different_folders_does_not_overwrite() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    std::fs::create_dir_all(src.path().join("x")).unwrap();
    std::fs::create_dir_all(src.path().join("y")).unwrap();
    let first = src.path().join("x/report.docx");
    let second = src.path().join("y/report.docx");
    write_docx(&first, "first");
    write_docx(&second, "second");

    let n = normalizer();
    let a = n.normalize(&node(&first), OutputMode::Pdf, out.path()).await;
    let b = n.normalize(&node(&second), OutputMode::Pdf, out.path()).await;

    assert_eq!(a.artifact().unwrap(), out.path().join("report.pdf"));
    assert_eq!(b.artifact().unwrap(), out.path().join("report (1).pdf"));
}

#[tokio::test]
async fn test_tool_failure_is_reported_per_file() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let doc = src.path().join("will_fail.doc");
    std::fs::write(&doc, vec![b'x'; 512]).unwrap();

    let result = normalizer().normalize(&node(&doc), OutputMode::Pdf, out.path()).await;

    assert!(matches!(result.outcome, Err(ConversionError::ToolFailed { .. })));
    assert_eq!(result.source.path, doc);
    assert!(leftover_staging(out.path()).is_empty());
}

#[tokio::test]
async fn test_missing_tool_is_a_tool_failure() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let docx = src.path().join("memo.docx");
    write_docx(&docx, "body");

    let n = Normalizer::new(Toolchain::unavailable(), ConversionConfig::default());
    let result = n.normalize(&node(&docx), OutputMode::Pdf, out.path()).await;

    match result.outcome {
        Err(ConversionError::ToolFailed { tool, .. }) => assert_eq!(tool, "noop"),
        other => panic!("expected ToolFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_archives_and_unknown_files_are_unsupported() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let zip = src.path().join("inner.zip");
    let bin = src.path().join("blob.bin");
    std::fs::write(&zip, vec![0u8; 256]).unwrap();
    std::fs::write(&bin, vec![0u8; 256]).unwrap();

    let n = normalizer();
    for path in [&zip, &bin] {
        for mode in [OutputMode::Pdf, OutputMode::Text] {
            let result = n.normalize(&node(path), mode, out.path()).await;
            assert!(
                matches!(result.outcome, Err(ConversionError::UnsupportedFormat { .. })),
                "{} in {} mode",
                path.display(),
                mode
            );
        }
    }
}

// -----------------------------------------------------------------------
// Text mode
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_text_file_is_passed_through() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let txt = src.path().join("notes.txt");
    std::fs::write(&txt, "plain notes").unwrap();

    let result = normalizer().normalize(&node(&txt), OutputMode::Text, out.path()).await;
    assert_eq!(result.artifact(), Some(txt.as_path()));
}

#[tokio::test]
async fn test_image_is_recognized_with_configured_languages() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let gif = src.path().join("scan.gif");
    write_image(&gif);

    let settings = ConversionConfig {
        ocr_languages: "deu".to_string(),
        ..Default::default()
    };
    let n = Normalizer::new(scripted_toolchain(), settings);
    let result = n.normalize(&node(&gif), OutputMode::Text, out.path()).await;

    let artifact = result.artifact().unwrap();
    assert_eq!(artifact, out.path().join("scan.txt"));
    assert_eq!(std::fs::read_to_string(artifact).unwrap(), "ocr[deu] scan.png\n");
    assert!(leftover_staging(out.path()).is_empty());
}

#[tokio::test]
async fn test_docx_text_is_read_without_tools() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let docx = src.path().join("memo.docx");
    write_docx(&docx, "Budget approved");

    let n = Normalizer::new(Toolchain::unavailable(), ConversionConfig::default());
    let result = n.normalize(&node(&docx), OutputMode::Text, out.path()).await;

    let text = std::fs::read_to_string(result.artifact().unwrap()).unwrap();
    assert!(text.contains("Budget approved"));
}

#[tokio::test]
async fn test_legacy_doc_uses_office_text_export() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let doc = src.path().join("legacy.doc");
    std::fs::write(&doc, vec![b'x'; 512]).unwrap();

    let result = normalizer().normalize(&node(&doc), OutputMode::Text, out.path()).await;

    let artifact = result.artifact().unwrap();
    assert_eq!(artifact, out.path().join("legacy.txt"));
    assert_eq!(std::fs::read_to_string(artifact).unwrap(), "office text of legacy");
}

#[tokio::test]
async fn test_pdf_pages_are_ocrd_in_order() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let pdf = src.path().join("scanned.pdf");
    write_pdf(&pdf, &["p1", "p2"]);

    let result = normalizer().normalize(&node(&pdf), OutputMode::Text, out.path()).await;

    let text = std::fs::read_to_string(result.artifact().unwrap()).unwrap();
    assert_eq!(text, "ocr[eng+rus] page-1.png\nocr[eng+rus] page-2.png\n");
    assert!(leftover_staging(out.path()).is_empty());
}

#[tokio::test]
async fn test_rtf_and_odt_have_no_text_route() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let rtf = src.path().join("letter.rtf");
    let odt = src.path().join("sheet.odt");
    std::fs::write(&rtf, vec![b'r'; 256]).unwrap();
    std::fs::write(&odt, vec![b'o'; 256]).unwrap();

    let n = normalizer();
    for path in [&rtf, &odt] {
        let result = n.normalize(&node(path), OutputMode::Text, out.path()).await;
        assert!(matches!(result.outcome, Err(ConversionError::UnsupportedFormat { .. })));
    }
}
