//! scorewave CLI: render scores to WAV, play them, inspect score files.
//!
//! Usage:
//!   scorewave render [score.ron] [--config render.ron] [--samples dir] [--out file.wav] [--play]
//!   scorewave play <file.wav>
//!   scorewave info <score.ron> [--config render.ron] [--samples dir]

mod player;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::{env, error::Error, fs};

use sw_master::{RenderConfig, Renderer, Score};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage:
  scorewave render [score.ron] [--config render.ron] [--samples dir] [--out file.wav] [--play]
  scorewave play <file.wav>
  scorewave info <score.ron> [--config render.ron] [--samples dir]";

const DEFAULT_SCORE: &str = "scores/huang.ron";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("render") => render(&args[1..]),
        Some("play") => match positional(&args[1..]) {
            Some(path) => play(Path::new(path)),
            None => usage(),
        },
        Some("info") => match positional(&args[1..]) {
            Some(path) => info(Path::new(path), &args[1..]),
            None => usage(),
        },
        _ => usage(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut shown = e.to_string();
            eprintln!("error: {}", shown);
            let mut source = e.source();
            while let Some(cause) = source {
                let text = cause.to_string();
                if !shown.contains(&text) {
                    eprintln!("  caused by: {}", text);
                }
                shown = text;
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn usage() -> Result<(), Box<dyn Error>> {
    Err(USAGE.into())
}

/// Value following `--flag`, if present.
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--play" {
            continue;
        }
        if arg.starts_with("--") {
            iter.next();
            continue;
        }
        return Some(arg);
    }
    None
}

fn load_score(path: &Path) -> Result<Score, Box<dyn Error>> {
    sw_formats::load_score(path).map_err(|e| format!("{}: {}", path.display(), e).into())
}

/// Render settings from `--config`, with `--samples` overriding the sample root.
fn load_config(args: &[String]) -> Result<RenderConfig, Box<dyn Error>> {
    let mut config = match flag(args, "--config") {
        Some(path) => RenderConfig::load(Path::new(path))?,
        None => RenderConfig::default(),
    };
    if let Some(dir) = flag(args, "--samples") {
        config.sample_root = PathBuf::from(dir);
    }
    Ok(config)
}

fn render(args: &[String]) -> Result<(), Box<dyn Error>> {
    let config = load_config(args)?;
    let out = flag(args, "--out").map(PathBuf::from).unwrap_or_else(|| config.output_path());
    let score_path = positional(args).unwrap_or(DEFAULT_SCORE);
    let score = load_score(Path::new(score_path))?;

    let renderer = Renderer::from_config(config);
    let report = renderer.render_to(&score, &out)?;

    println!("Wrote {}", report.output.display());
    println!("  {} segments, {:.2}s", report.segments, report.duration_seconds);
    for skipped in &report.skipped {
        println!("  skipped event {} ({}): {}", skipped.index + 1, skipped.event, skipped.reason);
    }

    if args.iter().any(|a| a == "--play") {
        play(&report.output)?;
    }
    Ok(())
}

fn play(path: &Path) -> Result<(), Box<dyn Error>> {
    if !path.is_file() {
        return Err(format!(
            "{} not found; render it first with `scorewave render --out {}`",
            path.display(),
            path.display()
        )
        .into());
    }
    let attempts = player::play(path, &player::PLAYERS);
    if let Some(program) = player::played(&attempts) {
        println!("Played with {}", program);
        return Ok(());
    }
    for attempt in &attempts {
        match attempt {
            player::Attempt::Missing(p) => println!("  {}: not installed", p),
            player::Attempt::Exited { program, code } => match code {
                Some(code) => println!("  {}: exited with status {}", program, code),
                None => println!("  {}: terminated by signal", program),
            },
            player::Attempt::SpawnFailed { program, error } => println!("  {}: {}", program, error),
            player::Attempt::Played(_) => {}
        }
    }
    println!("no player found; open {} manually", path.display());
    Ok(())
}

fn info(path: &Path, args: &[String]) -> Result<(), Box<dyn Error>> {
    let score = load_score(path)?;
    println!("Title:    {}", score.title());
    if let Some(bpm) = score.tempo() {
        println!("Tempo:    {} BPM", bpm);
    }
    println!("Events:   {} ({} notes, {} rests)", score.len(), score.note_count(), score.rest_count());
    println!("Length:   {:.2}s before crossfades", score.total_duration());

    let config = load_config(args)?;
    let store = sw_formats::DirStore::new(&config.sample_root);
    if fs::metadata(store.root()).is_ok() {
        let missing = store.missing();
        println!("Samples:  {} ({} of 21 missing)", store.root().display(), missing.len());
        for id in missing {
            println!("  missing {}", store.path_of(&id).display());
        }
    }
    Ok(())
}
