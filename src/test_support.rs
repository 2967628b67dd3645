//! Shared fixtures for unit tests: real PDFs, DOCX files and scripted tools

use crate::conversion::{OcrEngine, OfficeConverter, OfficeTarget, PageRasterizer, Toolchain};
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Write a PDF with one page per label; each page shows its label as text
pub fn write_pdf(path: &Path, labels: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Text of every page of a PDF, in page order
pub fn pdf_page_texts(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .keys()
        .map(|number| doc.extract_text(&[*number]).unwrap().trim().to_string())
        .collect()
}

/// Write a minimal but valid DOCX whose body is one paragraph
pub fn write_docx(path: &Path, body: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options = ::zip::write::FileOptions::default();

    writer.start_file("[Content_Types].xml", options).unwrap();
    writer
        .write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
        )
        .unwrap();

    writer.start_file("_rels/.rels", options).unwrap();
    writer
        .write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#,
        )
        .unwrap();

    writer.start_file("word/document.xml", options).unwrap();
    write!(
        writer,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{body}</w:t></w:r></w:p></w:body></w:document>"#
    )
    .unwrap();

    writer.finish().unwrap();
}

/// Office converter that renders a one-page PDF (labelled with the input
/// stem) or a text file. Fails for inputs whose name contains "fail" and
/// panics for those containing "panic"
pub struct ScriptedOffice;

#[async_trait]
impl OfficeConverter for ScriptedOffice {
    async fn convert(
        &self,
        input: &Path,
        out_dir: &Path,
        target: OfficeTarget,
    ) -> crate::Result<PathBuf> {
        let stem = input.file_stem().unwrap().to_string_lossy().into_owned();
        if stem.contains("panic") {
            panic!("scripted office converter panicked on {stem}");
        }
        if stem.contains("fail") {
            return Err(crate::Error::Conversion(
                crate::error::ConversionError::ToolFailed {
                    tool: "scripted".into(),
                    path: input.to_path_buf(),
                    reason: "exit status: 1".into(),
                },
            ));
        }
        let output = out_dir.join(format!("{}.{}", stem, target.extension()));
        match target {
            OfficeTarget::Pdf => write_pdf(&output, &[&stem]),
            OfficeTarget::Text => std::fs::write(&output, format!("office text of {stem}")).unwrap(),
        }
        Ok(output)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// OCR engine that "reads" the image's file name
pub struct ScriptedOcr;

#[async_trait]
impl OcrEngine for ScriptedOcr {
    async fn recognize(&self, image: &Path, languages: &str) -> crate::Result<String> {
        let name = image.file_name().unwrap().to_string_lossy();
        Ok(format!("ocr[{languages}] {name}\n"))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Rasterizer that emits one PNG per page of the input PDF
pub struct ScriptedRasterizer;

#[async_trait]
impl PageRasterizer for ScriptedRasterizer {
    async fn rasterize(&self, pdf: &Path, out_dir: &Path, _dpi: u32) -> crate::Result<Vec<PathBuf>> {
        let pages = Document::load(pdf)
            .map_err(|e| crate::Error::Other(e.to_string()))?
            .get_pages()
            .len();
        let mut out = Vec::new();
        for i in 1..=pages {
            let path = out_dir.join(format!("page-{i}.png"));
            image::RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255]))
                .save(&path)
                .unwrap();
            out.push(path);
        }
        Ok(out)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Toolchain made of the scripted tools above
pub fn scripted_toolchain() -> Toolchain {
    Toolchain::new(
        Arc::new(ScriptedOffice),
        Arc::new(ScriptedOcr),
        Arc::new(ScriptedRasterizer),
    )
}
