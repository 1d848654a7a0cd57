use clap::{Parser, Subcommand};
use log::{error, info};
use rust_omr::detector::candidates::{ExtractionParams, extract_candidates};
use rust_omr::detector::normalize::normalize;
use rust_omr::grading::{AnswerKey, score};
use rust_omr::tools::synthetic::{SheetLayout, render_answers};
use rust_omr::tools::{dataset_iter, grayscale_stats, load_rgb, mask_stats};
use rust_omr::utils::grayscale::to_grayscale;
use rust_omr::{AnalyzerConfig, RasterImage, SheetAnalyzer, analyze};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "omrtool", version, about = "RustOMR CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract answers from a single sheet and print them as JSON
    Analyze {
        #[arg(long)]
        image: PathBuf,
        /// JSON file with analyzer settings
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        expected_options: Option<usize>,
        #[arg(long)]
        expected_questions: Option<usize>,
        #[arg(long)]
        fill_threshold: Option<f32>,
        /// Write the annotated overlay PNG here
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Answer key JSON to score against
        #[arg(long)]
        key: Option<PathBuf>,
    },
    /// Print per-stage statistics for an image
    DebugDetect {
        #[arg(long)]
        image: PathBuf,
    },
    /// Write a synthetic answer sheet
    RenderSample {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 5)]
        rows: usize,
        #[arg(long, default_value_t = 4)]
        options: usize,
        /// Comma-separated answers per row: letters, 0-based indices or `-`
        #[arg(long, value_delimiter = ',')]
        seed_answers: Vec<String>,
    },
    /// Analyze every image under a directory and print a summary
    Batch {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        expected_options: Option<usize>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Analyze {
            image,
            config,
            expected_options,
            expected_questions,
            fill_threshold,
            overlay,
            key,
        } => {
            let overrides = Overrides {
                expected_options,
                expected_questions,
                fill_threshold,
            };
            analyze_cmd(
                &image,
                config.as_deref(),
                overrides,
                overlay.as_deref(),
                key.as_deref(),
            )
        }
        Command::DebugDetect { image } => debug_detect_cmd(&image),
        Command::RenderSample {
            out,
            rows,
            options,
            seed_answers,
        } => render_sample_cmd(&out, rows, options, &seed_answers),
        Command::Batch {
            root,
            limit,
            expected_options,
        } => batch_cmd(&root, limit, expected_options),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

struct Overrides {
    expected_options: Option<usize>,
    expected_questions: Option<usize>,
    fill_threshold: Option<f32>,
}

fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<AnalyzerConfig, String> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
            serde_json::from_str::<AnalyzerConfig>(&json)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?
        }
        None => AnalyzerConfig::from_env(),
    };
    if let Some(options) = overrides.expected_options {
        config = config.with_expected_options(options);
    }
    if let Some(questions) = overrides.expected_questions {
        config = config.with_expected_questions(questions);
    }
    if let Some(threshold) = overrides.fill_threshold {
        config = config.with_fill_threshold(threshold);
    }
    Ok(config)
}

fn load_image(image: &Path) -> Result<(Vec<u8>, usize, usize), String> {
    load_rgb(image).map_err(|err| format!("Failed to load image {}: {}", image.display(), err))
}

fn analyze_cmd(
    image: &Path,
    config_path: Option<&Path>,
    overrides: Overrides,
    overlay: Option<&Path>,
    key: Option<&Path>,
) -> Result<(), String> {
    let config = load_config(config_path, overrides)?.with_debug_overlay(overlay.is_some());
    let key = key
        .map(|path| AnswerKey::load(path).map_err(|e| e.to_string()))
        .transpose()?;

    let (pixels, width, height) = load_image(image)?;
    let raster = RasterImage::from_rgb(&pixels, width, height).map_err(|e| e.to_string())?;

    let start = Instant::now();
    let result = analyze(&raster, &config).map_err(|e| e.to_string())?;
    info!(
        "{}: {} questions in {:.2}ms",
        image.display(),
        result.questions.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    if let (Some(path), Some(canvas)) = (overlay, result.debug_overlay.as_ref()) {
        canvas
            .save(path)
            .map_err(|e| format!("Failed to write overlay {}: {}", path.display(), e))?;
    }

    let mut output = serde_json::to_value(&result).map_err(|e| e.to_string())?;
    if let Some(key) = &key {
        let report = score(key, &result.questions);
        output["score"] = serde_json::to_value(&report).map_err(|e| e.to_string())?;
    }
    let json = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn debug_detect_cmd(image: &Path) -> Result<(), String> {
    let (pixels, width, height) = load_image(image)?;
    println!("Image: {} ({}x{})", image.display(), width, height);

    let raster = RasterImage::from_rgb(&pixels, width, height).map_err(|e| e.to_string())?;
    let config = AnalyzerConfig::from_env();

    let gray = to_grayscale(&raster);
    let gray_stats = grayscale_stats(&gray);
    println!(
        "Grayscale range: {}-{}, average: {}",
        gray_stats.min, gray_stats.max, gray_stats.avg
    );

    let normalized = normalize(&raster, &config).map_err(|e| e.to_string())?;
    let stats = mask_stats(&normalized.binary);
    println!(
        "Binary: foreground_pixels={} total={} foreground_ratio={:.2}% (contrast enhanced: {})",
        stats.foreground_pixels,
        stats.total_pixels,
        stats.foreground_ratio * 100.0,
        normalized.enhanced
    );

    let params = ExtractionParams {
        min_area: config.min_bubble_area,
        max_area: config.max_bubble_area,
        min_circularity: config.min_circularity,
    };
    let extraction = extract_candidates(&normalized.binary, &params);
    println!(
        "Candidates: primary={} relaxed={} retried={}",
        extraction.primary, extraction.relaxed, extraction.retried
    );
    for (i, candidate) in extraction.candidates.iter().take(10).enumerate() {
        println!(
            "  Candidate {}: center=({:.1}, {:.1}) radius={:.2}",
            i, candidate.x, candidate.y, candidate.radius
        );
    }

    let result = analyze(&raster, &config).map_err(|e| e.to_string())?;
    let d = &result.diagnostics;
    println!(
        "Rows: {} ({} matching, confidence {:.2}, degraded {})",
        d.row_count, d.rows_matching_expected, d.confidence, d.degraded
    );
    for question in result.questions.iter().take(10) {
        let answer = question
            .option_letter()
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        let scores: Vec<String> = question
            .scores_per_option
            .iter()
            .map(|s| format!("{:.2}", s))
            .collect();
        println!("  Q{}: {} [{}]", question.index, answer, scores.join(", "));
    }
    Ok(())
}

fn parse_answer(token: &str, options: usize) -> Result<Option<usize>, String> {
    let token = token.trim();
    if token.is_empty() || token == "-" {
        return Ok(None);
    }
    let index = match token.parse::<usize>() {
        Ok(index) => index,
        Err(_) => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => {
                    (c.to_ascii_uppercase() as u8 - b'A') as usize
                }
                _ => return Err(format!("Invalid answer {:?}", token)),
            }
        }
    };
    if index >= options {
        return Err(format!("Answer {:?} out of range for {} options", token, options));
    }
    Ok(Some(index))
}

fn render_sample_cmd(
    out: &Path,
    rows: usize,
    options: usize,
    seed_answers: &[String],
) -> Result<(), String> {
    if rows == 0 || options == 0 {
        return Err("rows and options must be positive".to_string());
    }
    let answers = seed_answers
        .iter()
        .map(|token| parse_answer(token, options))
        .collect::<Result<Vec<_>, _>>()?;

    let layout = SheetLayout::grid(rows, options);
    let sheet = render_answers(&layout, &answers);
    sheet
        .save(out)
        .map_err(|e| format!("Failed to write {}: {}", out.display(), e))?;
    println!(
        "Wrote {} ({}x{}, {} rows x {} options)",
        out.display(),
        sheet.width(),
        sheet.height(),
        rows,
        options
    );
    Ok(())
}

fn batch_cmd(root: &Path, limit: Option<usize>, expected_options: Option<usize>) -> Result<(), String> {
    let mut config = AnalyzerConfig::from_env();
    if let Some(options) = expected_options {
        config = config.with_expected_options(options);
    }
    let analyzer = SheetAnalyzer::new(config).map_err(|e| e.to_string())?;

    let images: Vec<PathBuf> = dataset_iter(root, limit).collect();
    if images.is_empty() {
        return Err(format!("No images found under {}", root.display()));
    }

    let start = Instant::now();
    let mut analyzed = 0usize;
    let mut degraded = 0usize;
    let mut failed = 0usize;
    for path in &images {
        let outcome = load_image(path).and_then(|(pixels, width, height)| {
            let raster =
                RasterImage::from_rgb(&pixels, width, height).map_err(|e| e.to_string())?;
            analyzer.analyze(&raster).map_err(|e| e.to_string())
        });
        match outcome {
            Ok(result) => {
                analyzed += 1;
                if result.needs_review() {
                    degraded += 1;
                }
                println!(
                    "{}: {} questions, confidence {:.2}{}",
                    path.display(),
                    result.questions.len(),
                    result.diagnostics.confidence,
                    if result.needs_review() { " (review)" } else { "" }
                );
            }
            Err(message) => {
                failed += 1;
                error!("{}", message);
            }
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "Analyzed {} of {} images ({} need review, {} failed) in {:.2}s",
        analyzed,
        images.len(),
        degraded,
        failed,
        elapsed
    );
    Ok(())
}
