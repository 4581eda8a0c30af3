use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use image_text_translate::resolution::RESOLUTIONS;
use image_text_translate::{
    default_output_path, resolution_for, GlossaryTranslator, ImageTranslator, OutlineFont,
    PipelineOptions, PrecomputedDetector, ProcessResult,
};

#[derive(Parser)]
#[command(
    name = "image-translate",
    about = "Erase printed text in an image and re-render it translated",
    version,
    after_help = "Regions come from a JSON file of OCR detections:\n  \
                  [{\"polygon\": [[x, y], ...], \"text\": \"HELLO\", \"confidence\": 0.9}]\n\
                  Translations come from a glossary JSON file:\n  \
                  {\"es\": {\"HELLO\": \"HOLA\"}}"
)]
struct Cli {
    /// Input image file
    #[arg(required_unless_present = "list_resolutions")]
    input: Option<String>,

    /// Output file (default: {name}_{lang}.png)
    #[arg(short, long)]
    output: Option<String>,

    /// Target language code
    #[arg(short, long, default_value = "en")]
    lang: String,

    /// Device resolution preset (see --list-resolutions)
    #[arg(short, long)]
    resolution: Option<String>,

    /// JSON file with detected text regions
    #[arg(long, required_unless_present = "list_resolutions")]
    regions: Option<PathBuf>,

    /// JSON glossary of translations per target language
    #[arg(long)]
    glossary: Option<PathBuf>,

    /// TrueType/OpenType font used to draw translations
    #[arg(long, required_unless_present = "list_resolutions")]
    font: Option<PathBuf>,

    /// Minimum detection confidence (0.0-1.0)
    #[arg(long, default_value = "0.4")]
    min_confidence: f32,

    /// Print the resolution presets and exit
    #[arg(long)]
    list_resolutions: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if cli.list_resolutions {
        for (name, target) in RESOLUTIONS {
            println!("{name:<18} {}x{}", target.width(), target.height());
        }
        return;
    }

    if !(0.0..=1.0).contains(&cli.min_confidence) {
        eprintln!("Error: Minimum confidence must be between 0.0 and 1.0");
        process::exit(1);
    }

    if let Some(key) = &cli.resolution {
        if resolution_for(key).is_none() && !cli.quiet {
            eprintln!("WARNING: Unknown resolution '{key}', keeping source size");
        }
    }

    let (Some(input), Some(regions), Some(font_path)) = (&cli.input, &cli.regions, &cli.font) else {
        eprintln!("Error: input, --regions and --font are required");
        process::exit(1);
    };

    let input_path = Path::new(input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {input}");
        process::exit(1);
    }

    let detector = match PrecomputedDetector::from_json_file(regions) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Fatal: Failed to load regions: {e}");
            process::exit(1);
        }
    };
    let glossary = match &cli.glossary {
        Some(path) => match GlossaryTranslator::from_json_file(path) {
            Ok(g) => g,
            Err(e) => {
                eprintln!("Fatal: Failed to load glossary: {e}");
                process::exit(1);
            }
        },
        None => GlossaryTranslator::new(),
    };
    let font = match OutlineFont::from_file(font_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Fatal: Failed to load font: {e}");
            process::exit(1);
        }
    };

    let options = PipelineOptions {
        min_confidence: cli.min_confidence,
        ..PipelineOptions::default()
    };
    let pipeline = ImageTranslator::new(detector, glossary, font).with_options(options);

    let output_path = match &cli.output {
        Some(o) => PathBuf::from(o),
        None => default_output_path(input_path, &cli.lang),
    };
    let result = pipeline.translate_file(
        input_path,
        &output_path,
        &cli.lang,
        cli.resolution.as_deref(),
    );

    print_result(&result, &output_path, cli.quiet);
    if !result.success {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, output: &Path, quiet: bool) {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        if !quiet {
            eprintln!("[OK] {filename} -> {}: {}", output.display(), result.message);
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}
