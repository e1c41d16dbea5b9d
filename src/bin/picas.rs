use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use picas_palette::speech::{LogSpeaker, SpeechQueue};
use picas_palette::{
    ColorDatabase, ExtractOptions, ImageProcessor, NamedColor, Pixel, name_palette, parse_hex,
};
use serde_json::json;

/// Extract dominant colors from images and name them.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required_unless_present = "lookup")]
    inputs: Vec<PathBuf>,

    /// Name a `#rrggbb` color instead of (or besides) extracting palettes
    #[arg(short = 'l', long, value_parser = parse_color)]
    lookup: Vec<Pixel>,

    /// Number of palette colors
    #[arg(short = 'k', long, default_value_t = 5)]
    n_colors: usize,

    /// `R,G,B,Name` color table (defaults to the built-in table)
    #[arg(short = 'c', long)]
    colors: Option<PathBuf>,

    /// Seed of the first k-means run
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of k-means restarts
    #[arg(long, default_value_t = 10)]
    runs: usize,

    /// Side of the square grid images are sampled down to
    #[arg(long, default_value_t = 100)]
    sample_side: u32,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Say every color name after printing it
    #[arg(long)]
    speak: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let db = match &args.colors {
        Some(path) => ColorDatabase::load(path),
        None => ColorDatabase::builtin(),
    };
    log::info!("using {} reference colors", db.len());

    let opts = ExtractOptions {
        clusters: args.n_colors,
        runs: args.runs,
        seed: args.seed,
        sample_side: args.sample_side,
        ..ExtractOptions::default()
    };

    let speech = if args.speak {
        Some(SpeechQueue::spawn(LogSpeaker).context("failed to start speech worker")?)
    } else {
        None
    };

    let mut processor = ImageProcessor::new();
    let mut report = Vec::new();

    if !args.lookup.is_empty() {
        let named = name_palette(&args.lookup, &db).context("color lookup failed")?;
        if args.json {
            report.push(json!({
                "input": "lookup",
                "palette": named.iter().map(to_json).collect::<Vec<_>>(),
            }));
        } else {
            print_palette("lookup", &named);
        }
        announce(speech.as_ref(), &named);
    }

    for input in &args.inputs {
        processor
            .load_image(input)
            .with_context(|| format!("could not load {}", input.display()))?;
        let named = processor
            .named_palette(&db, &opts)
            .context("palette extraction failed")?;

        if args.json {
            report.push(json!({
                "input": input.display().to_string(),
                "palette": named.iter().map(to_json).collect::<Vec<_>>(),
            }));
        } else {
            print_palette(&input.display().to_string(), &named);
        }

        announce(speech.as_ref(), &named);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if let Some(queue) = speech {
        queue.close();
    }

    Ok(())
}

fn parse_color(s: &str) -> Result<Pixel, String> {
    parse_hex(s).ok_or_else(|| format!("expected a #rrggbb color, got {s:?}"))
}

fn print_palette(title: &str, named: &[NamedColor]) {
    println!("{title}");
    for color in named {
        let (r, g, b) = color.rgb.into_components();
        println!("  {}  {r:>3},{g:>3},{b:>3}  {}", color.hex, color.name);
    }
}

fn announce(speech: Option<&SpeechQueue>, named: &[NamedColor]) {
    let Some(queue) = speech else { return };
    for color in named {
        // `say` already logs the lost utterance
        if !queue.say(picas_palette::namer::describe(color)) {
            break;
        }
    }
}

fn to_json(color: &NamedColor) -> serde_json::Value {
    let (r, g, b) = color.rgb.into_components();
    json!({ "hex": color.hex, "name": color.name, "rgb": [r, g, b] })
}
