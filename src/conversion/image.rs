//! Raster image handling: wrapping an image into a one-page PDF, and
//! re-encoding images to PNG before OCR

use crate::error::ConversionError;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;

/// Name of the image XObject in the page resources
const IMAGE_RESOURCE: &str = "Im0";

fn image_error(path: &Path, reason: impl std::fmt::Display) -> ConversionError {
    ConversionError::Image {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Page extent in points for `pixels` rendered at `dpi`
fn points(pixels: u32, dpi: u32) -> i64 {
    let pts = (u64::from(pixels) * 72).div_ceil(u64::from(dpi.max(1)));
    i64::try_from(pts.max(1)).unwrap_or(i64::MAX)
}

/// Write `image_path` as a single-page PDF at `output_path`
///
/// Any color model (palette, grayscale, alpha, 16-bit) is flattened to 8-bit
/// RGB first. The page is sized so the image renders at `dpi`.
pub fn image_to_pdf(image_path: &Path, output_path: &Path, dpi: u32) -> Result<(), ConversionError> {
    let rgb = image::open(image_path)
        .map_err(|e| image_error(image_path, e))?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    let (width_pt, height_pt) = (points(width, dpi), points(height, dpi));

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width_pt),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height_pt),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content.encode().map_err(|e| image_error(image_path, e))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_RESOURCE => image_id },
        },
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width_pt),
            Object::Integer(height_pt),
        ],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(output_path)
        .map_err(|e| image_error(image_path, format!("failed to write PDF: {}", e)))?;

    Ok(())
}

/// Re-encode any supported image as an RGB PNG
pub fn image_to_png(image_path: &Path, output_path: &Path) -> Result<(), ConversionError> {
    image::open(image_path)
        .map_err(|e| image_error(image_path, e))?
        .to_rgb8()
        .save_with_format(output_path, image::ImageFormat::Png)
        .map_err(|e| image_error(image_path, e))
}
