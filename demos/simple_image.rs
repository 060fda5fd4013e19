//! Example: Convert an image to ASCII art using glyphcast as a library
//! Run with: cargo run --example simple_image

use glyphcast::{AsciiConverter, ConversionOptions, RampKind};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let converter = AsciiConverter::new();

    let options = ConversionOptions::default()
        .with_columns(100)
        .with_scale(0.5)
        .with_ramp(RampKind::Extended)
        .with_save_text(true);

    let input = Path::new("resources/source.png");
    if !input.exists() {
        println!("Put an image at {} to try this example.", input.display());
        return Ok(());
    }

    // Raster plus text file
    let canvas = converter.convert_image(input, Path::new("example_output.png"), &options)?;
    println!("Wrote a {}x{} canvas to example_output.png", canvas.columns(), canvas.rows());

    // Text only
    let text = converter.image_to_string(input, &options.with_columns(60))?;
    println!("{}", text);

    Ok(())
}
