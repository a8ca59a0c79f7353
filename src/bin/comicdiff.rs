//! Compares two comic archives page by page.

use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser;

use comic_scroller::open_comic;

#[derive(Parser)]
#[command(name = "comicdiff", about = "Compare two comic archives")]
struct Args {
    /// Report every per-page difference
    #[arg(short)]
    verbose: bool,

    comic1: PathBuf,
    comic2: PathBuf,
}

struct PageInfo {
    name: String,
    resolution: (u32, u32),
}

struct ComicInfo {
    name: String,
    format: &'static str,
    size: u64,
    pages: Vec<PageInfo>,
}

fn comic_info(path: &Path) -> comic_scroller::Result<ComicInfo> {
    let mut comic = open_comic(path)?;
    let mut pages = Vec::with_capacity(comic.page_count());
    for page in 0..comic.page_count() {
        let name = comic.filename(page).to_string();
        let data = comic.read_raw(page)?;
        let resolution = image::load_from_memory(&data)?.to_rgb8().dimensions();
        pages.push(PageInfo { name, resolution });
    }
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = if path.is_dir() { "dir" } else { "zip" };
    let size = std::fs::metadata(path)?.len();
    Ok(ComicInfo {
        name,
        format,
        size,
        pages,
    })
}

fn show_diff(name: &str, f1: &str, diff: &str, f2: &str, extra: Option<&str>) {
    match extra {
        Some(extra) => println!("{name:<30}: {f1:<30} {diff:<2} {f2:>30} [{extra}]"),
        None => println!("{name:<30}: {f1:<30} {diff:<2} {f2:>30}"),
    }
}

fn format_size(size: u64) -> String {
    for (order, unit) in [(0x4000_0000, 'G'), (0x0010_0000, 'M'), (0x0000_0400, 'K')] {
        if size / order != 0 {
            return format!("{:.2}{}", size as f64 / order as f64, unit);
        }
    }
    format!("{size}")
}

fn show_diff_size(name: &str, s1: u64, s2: u64) {
    let sign = if s2 < s1 { '-' } else { '+' };
    let delta = format!("{}{}", sign, format_size(s1.abs_diff(s2)));
    show_diff(
        name,
        &format_size(s1),
        if s1 < s2 { "<" } else { ">" },
        &format_size(s2),
        Some(&delta),
    );
}

fn show_diff_number(name: &str, n1: usize, n2: usize) {
    let delta = n2 as i64 - n1 as i64;
    show_diff(
        name,
        &n1.to_string(),
        if n1 < n2 { "<" } else { ">" },
        &n2.to_string(),
        Some(&format!("{delta:+}")),
    );
}

fn average_resolution(pages: &[PageInfo]) -> (u32, u32) {
    let width: u64 = pages.iter().map(|p| u64::from(p.resolution.0)).sum();
    let height: u64 = pages.iter().map(|p| u64::from(p.resolution.1)).sum();
    let n = pages.len() as u64;
    ((width / n) as u32, (height / n) as u32)
}

fn run(args: &Args) -> comic_scroller::Result<i32> {
    let comic1 = comic_info(&args.comic1)?;
    let comic2 = comic_info(&args.comic2)?;

    let num_common_pages = comic1.pages.len().min(comic2.pages.len());

    // One-sided until a page contradicts it.
    let mut lower_resolution = true;
    let mut higher_resolution = true;

    let mut num_page_diffs = 0;
    for n in 0..num_common_pages {
        let p1 = &comic1.pages[n];
        let p2 = &comic2.pages[n];
        if p1.name != p2.name || p1.resolution != p2.resolution {
            num_page_diffs += 1;
        }
        if p1.name != p2.name && args.verbose {
            show_diff(&format!("Page {n} name"), &p1.name, "!=", &p2.name, None);
        }
        if p1.resolution != p2.resolution {
            let (w1, h1) = p1.resolution;
            let (w2, h2) = p2.resolution;
            if (w1 >= w2 && h1 >= h2) || (w1 <= w2 && h1 <= h2) {
                let diff = if w1 >= w2 {
                    lower_resolution = false;
                    ">"
                } else {
                    higher_resolution = false;
                    "<"
                };
                if args.verbose {
                    show_diff(
                        &format!("Page {n} resolution"),
                        &format!("{w1}x{h1}"),
                        diff,
                        &format!("{w2}x{h2}"),
                        None,
                    );
                }
            } else if args.verbose {
                show_diff_number(&format!("Page {n} width"), w1 as usize, w2 as usize);
                show_diff_number(&format!("Page {n} height"), h1 as usize, h2 as usize);
            }
        }
    }

    let mut comic_diff = 0;
    if comic1.name != comic2.name {
        comic_diff += 1;
        show_diff("Name", &comic1.name, "!=", &comic2.name, None);
    }
    if comic1.format != comic2.format {
        comic_diff += 1;
        show_diff("Format", comic1.format, "!=", comic2.format, None);
    }
    if comic1.size != comic2.size {
        comic_diff += 1;
        show_diff_size("Size", comic1.size, comic2.size);
    }
    if comic1.pages.len() != comic2.pages.len() {
        comic_diff += 1;
        show_diff_number("Length", comic1.pages.len(), comic2.pages.len());
    }
    if num_page_diffs != 0 {
        comic_diff += 1;
        println!(
            "{:<30}: {:<30} {:<2} {:>30}",
            "Different pages", num_page_diffs, "/", num_common_pages
        );
    }
    if lower_resolution != higher_resolution {
        comic_diff += 1;
        let (w1, h1) = average_resolution(&comic1.pages[..num_common_pages]);
        let (w2, h2) = average_resolution(&comic2.pages[..num_common_pages]);
        show_diff(
            "Resolution",
            &format!("~{w1}x{h1}"),
            if lower_resolution { "<" } else { ">" },
            &format!("~{w2}x{h2}"),
            None,
        );
    }

    Ok(if comic_diff == 0 { 0 } else { 1 })
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(code) => exit(code),
        Err(err) => {
            eprintln!("comicdiff: {err}");
            exit(1);
        }
    }
}
