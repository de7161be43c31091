use argh::FromArgs;
use std::path::PathBuf;

use korrel::{
    imgproc::histogram,
    io::{descriptor, functional as F},
    pipeline::{FilterKind, FilterPipeline},
};

#[derive(FromArgs)]
/// Apply a filter descriptor to an image
struct Args {
    /// path to an input image
    #[argh(option, short = 'i')]
    image: PathBuf,

    /// path to the filter descriptor text file
    #[argh(option, short = 'f')]
    filter: PathBuf,

    /// filter kind: plain, parameterized, 3d (default: plain)
    #[argh(option, short = 'k', default = "String::from(\"plain\")")]
    kind: String,

    /// path to the output image
    #[argh(option, short = 'o')]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    // read the image
    let image = F::read_image_any_rgb8(&args.image)?;

    // read and apply the filter, keeping the original image on a bad descriptor
    let kind: FilterKind = args.kind.parse()?;
    let lines = descriptor::read_descriptor_tokens(&args.filter)?;

    let mut pipeline = FilterPipeline::new();
    let (output, err) = pipeline.apply_or_keep(&image, kind, &lines);
    if let Some(err) = err {
        log::error!("{}: {err}", args.filter.display());
    }

    // report how much of the intensity range the result uses
    let mut hist = vec![0; 16];
    histogram::compute_histogram(&output, &mut hist, 16)?;
    let occupied = hist.iter().filter(|&&count| count > 0).count();
    log::info!("output occupies {occupied} of {} intensity bins", hist.len());

    F::write_image_any(&args.output, &output)?;
    println!("Saved {}", args.output.display());

    Ok(())
}
