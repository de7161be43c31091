use argh::FromArgs;
use std::path::PathBuf;

use korrel::{io::functional as F, pipeline::FilterPipeline};

#[derive(FromArgs)]
/// Convert an image to a gray looking RGB image
struct Args {
    /// path to an input image
    #[argh(option, short = 'i')]
    image: PathBuf,

    /// gray value: g (green channel) or y (luma) (default: g)
    #[argh(option, short = 'm', default = "String::from(\"g\")")]
    method: String,

    /// path to the output image
    #[argh(option, short = 'o')]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    let image = F::read_image_any_rgb8(&args.image)?;

    let gray = match FilterPipeline::new().grayscale_with_selector(&image, &args.method) {
        Ok(gray) => gray,
        Err(err) => {
            log::error!("{err}");
            image
        }
    };

    F::write_image_any(&args.output, &gray)?;
    println!("Saved {}", args.output.display());

    Ok(())
}
