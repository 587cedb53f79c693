//! Image (JPEG/PNG) to PDF conversion

use std::path::Path;
use std::time::Instant;

use ::image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::info;

use crate::error::{Error, Result};
use crate::layout::PageDimensions;
use crate::pdf::create::{save_document, DocumentBuilder};

/// Convert an image to a one-page letter-size PDF.
///
/// The image is decoded, converted to 8-bit RGB, scaled uniformly to fit the
/// page and centered.
pub fn image_to_pdf(input: &Path, output: &Path) -> Result<()> {
    let start = Instant::now();

    let image = ::image::open(input)
        .map_err(|e| Error::conversion(input, e))?
        .to_rgb8();

    let mut doc = render_image(image).map_err(|e| Error::conversion(input, e))?;
    save_document(&mut doc, output).map_err(|e| Error::conversion(input, e))?;

    info!(
        "Converted {} in {:.2}s",
        input.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Lay out `image` centered on a letter page
pub(crate) fn render_image(image: RgbImage) -> Result<Document> {
    let page = PageDimensions::letter();
    let (width, height) = image.dimensions();
    let placement = page
        .fit_centered(width as f32, height as f32)
        .ok_or_else(|| Error::General("image has no pixels".to_string()))?;

    let mut builder = DocumentBuilder::new(page);
    let image_id = builder.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.into_raw(),
    ));

    // Image space is the unit square, so scale it up to the placed size
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(placement.width),
                    0.into(),
                    0.into(),
                    Object::Real(placement.height),
                    Object::Real(placement.x),
                    Object::Real(placement.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let resources = dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
    };
    builder.add_page(content, resources)?;

    Ok(builder.finish())
}
