//! Converts a comic archive into an ACV archive with pre-detected panels.

use std::io::Cursor;
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use image::ImageFormat;
use image::imageops::FilterType;
use log::info;

use comic_scroller::{
    AcvArchiveWriter, AcvManifest, DEFAULT_EDGE_WIDTH, Pixmap, Screen, SmartScroller,
    most_common_edge_color, open_comic,
};

#[derive(Parser)]
#[command(name = "comic2acv", about = "Convert a comic archive to an ACV archive")]
struct Args {
    /// Target display size (rows will be computed to fit it)
    #[arg(short, long, value_name = "WIDTHxHEIGHT", value_parser = parse_display)]
    display: Option<(u32, u32)>,

    /// Downscale images to fit under SIZExSIZE
    #[arg(short = 'D', long, value_name = "SIZE")]
    downscale: Option<u32>,

    /// Output file path (defaults to the input with an .acv extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to the comic archive to convert
    comic: PathBuf,
}

fn parse_display(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = width.parse().map_err(|_| format!("invalid width: {width}"))?;
    let height = height
        .parse()
        .map_err(|_| format!("invalid height: {height}"))?;
    Ok((width, height))
}

fn run(args: &Args) -> comic_scroller::Result<i32> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.comic.with_extension("acv"));
    if output.exists() {
        eprintln!("output already exists: {}", output.display());
        return Ok(1);
    }

    let mut comic = open_comic(&args.comic)?;
    if comic.page_count() == 0 {
        eprintln!("no images found in comic: {}", args.comic.display());
        return Ok(2);
    }

    let (view_width, view_height) = args.display.unwrap_or((0, 0));
    let mut writer = AcvArchiveWriter::create(&output)?;
    let mut manifest = AcvManifest::default();
    let mut scroller = SmartScroller::new();

    for page in 0..comic.page_count() {
        let name = comic.filename(page).to_string();
        println!("processing page {page}: {name}");
        let mut raw = comic.read_raw(page)?;
        let mut decoded = image::load_from_memory(&raw)?;

        if let Some(max_size) = args.downscale {
            let (width, height) = (decoded.width(), decoded.height());
            if width > max_size || height > max_size {
                decoded = decoded.resize(max_size, max_size, FilterType::Lanczos3);
                info!(
                    "downscaled page {page} from {width}x{height} to {}x{}",
                    decoded.width(),
                    decoded.height()
                );
                let format = ImageFormat::from_path(&name)?;
                let mut encoded = Cursor::new(Vec::new());
                decoded.write_to(&mut encoded, format)?;
                raw = encoded.into_inner();
            }
        }

        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        let pixmap = Pixmap::from_raw(width, height, rgb.as_raw());

        let bgcolor = most_common_edge_color(&pixmap, DEFAULT_EDGE_WIDTH)?;
        scroller.setup_image(&pixmap, bgcolor)?;
        let rows = scroller.rows(view_width, view_height)?;
        manifest.screens.insert(
            page as u32,
            Screen::from_rects(bgcolor, &rows, width, height),
        );

        writer.add_page(&name, &raw)?;
    }

    writer.add_manifest(&manifest)?;
    writer.finish()?;
    println!("created {}", output.display());
    Ok(0)
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(code) => exit(code),
        Err(err) => {
            eprintln!("comic2acv: {err}");
            exit(1);
        }
    }
}
