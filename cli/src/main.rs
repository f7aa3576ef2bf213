//! rentsheet CLI - rental presentation-sheet extraction tool

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use rentsheet::render::to_json;
use rentsheet::{
    BatchItem, ContentExtractor, ExtractOptions, FieldId, FieldNormalizer, JsonFormat,
    LabelDictionary, NormalizationReport, ProcessedListing, RentalProperty,
};

#[derive(Parser)]
#[command(name = "rentsheet")]
#[command(version)]
#[command(about = "Turn rental presentation-sheet PDFs into JSON records and images", long_about = None)]
struct Cli {
    /// Label dictionary JSON (built-in Finnish labels if not given)
    #[arg(long, global = true, value_name = "FILE", env = "RENTSHEET_LABELS")]
    labels: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the merged label/value table as JSON
    Tables {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Only this page (1-based)
        #[arg(long)]
        page: Option<u32>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Extract photos, dropping a trailing run of duplicate pages
    Images {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        encoding: ImageArgs,
    },

    /// Normalize one sheet and print the property record
    Normalize {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Listing URL to store with the record
        #[arg(long)]
        link: Option<String>,

        /// Record id (random if not given)
        #[arg(long)]
        id: Option<String>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Normalize many sheets into one JSON array and an image directory
    Batch {
        /// Input PDF files
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output JSON file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Directory for image files
        #[arg(long, value_name = "DIR")]
        images: Option<PathBuf>,

        /// City to store on every record instead of the parsed one
        #[arg(long)]
        city: Option<String>,

        /// Process one document at a time
        #[arg(long)]
        sequential: bool,

        #[command(flatten)]
        encoding: ImageArgs,
    },

    /// Print the active label dictionary
    Labels {
        /// Show field, label and parsing rule as a list instead of JSON
        #[arg(long)]
        rules: bool,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args)]
struct ImageArgs {
    /// Write PNG instead of JPEG
    #[arg(long)]
    png: bool,

    /// JPEG quality (1-100)
    #[arg(long, default_value = "90")]
    quality: u8,
}

impl ImageArgs {
    fn options(&self) -> ExtractOptions {
        let options = ExtractOptions::new();
        if self.png {
            options.png()
        } else {
            options.with_jpeg_quality(self.quality)
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = load_normalizer(cli.labels.as_deref()).and_then(|normalizer| match cli.command {
        Commands::Tables {
            input,
            page,
            compact,
        } => cmd_tables(&input, page, compact),
        Commands::Images {
            input,
            output,
            encoding,
        } => cmd_images(&input, output.as_deref(), &encoding),
        Commands::Normalize {
            input,
            link,
            id,
            compact,
        } => cmd_normalize(&input, link, id, compact, &normalizer),
        Commands::Batch {
            inputs,
            output,
            images,
            city,
            sequential,
            encoding,
        } => {
            let mut options = encoding.options();
            if sequential {
                options = options.sequential();
            }
            cmd_batch(
                &inputs,
                &output,
                images.as_deref(),
                city.as_deref(),
                &options,
                &normalizer,
            )
        }
        Commands::Labels { rules } => cmd_labels(normalizer.dictionary(), rules),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    });

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_normalizer(labels: Option<&Path>) -> Result<FieldNormalizer, Box<dyn std::error::Error>> {
    match labels {
        Some(path) => {
            let dictionary = LabelDictionary::from_path(path)?;
            log::debug!(
                "Loaded label dictionary v{} ({}) from {}",
                dictionary.version,
                dictionary.locale,
                path.display()
            );
            Ok(FieldNormalizer::with_dictionary(dictionary))
        }
        None => Ok(FieldNormalizer::new()),
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn cmd_tables(input: &Path, page: Option<u32>, compact: bool) -> CliResult {
    let extractor = ContentExtractor::open(input)?;
    let table = match page {
        Some(page) => extractor.page_table(page)?,
        None => extractor.extract_tables(),
    };

    if table.is_empty() {
        eprintln!("{}", "No table found".yellow());
    }
    println!("{}", to_json(&table, json_format(compact))?);
    Ok(())
}

fn cmd_images(input: &Path, output: Option<&Path>, encoding: &ImageArgs) -> CliResult {
    let extractor = ContentExtractor::open_with_options(input, encoding.options())?;
    let images = extractor.extract_images()?;
    extractor.close();

    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;

    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    for (i, blob) in images.iter().enumerate() {
        let filename = format!("{}_{}.{}", stem, i, images.extension());
        fs::write(output_dir.join(&filename), blob)?;
        println!("{} {}", "Extracted".green(), filename);
    }

    println!("\n{} {} images extracted", "Done!".green().bold(), images.len());
    Ok(())
}

fn cmd_normalize(
    input: &Path,
    link: Option<String>,
    id: Option<String>,
    compact: bool,
    normalizer: &FieldNormalizer,
) -> CliResult {
    let listing = rentsheet::process_file(input, &ExtractOptions::default(), normalizer)?
        .ok_or("no table found in document")?;

    print_report(input, listing.report());
    if !listing.is_valid() {
        eprintln!("{} record has no price", "Warning:".yellow().bold());
    }

    let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let property = listing.into_property(id, link);
    println!("{}", to_json(&property, json_format(compact))?);
    Ok(())
}

fn cmd_batch(
    inputs: &[PathBuf],
    output: &Path,
    image_dir: Option<&Path>,
    city: Option<&str>,
    options: &ExtractOptions,
    normalizer: &FieldNormalizer,
) -> CliResult {
    if let Some(dir) = image_dir {
        fs::create_dir_all(dir)?;
    }

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let sink = BatchSink::new(pb.clone(), image_dir, city);
    rentsheet::for_each_file(inputs, options, normalizer, |index, item| {
        sink.accept(index, item)
    });
    pb.finish_and_clear();

    let (records, skipped) = sink.finish();
    let file = fs::File::create(output)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &records)?;

    println!(
        "{} {} records written to {} ({} skipped)",
        "Done!".green().bold(),
        records.len(),
        output.display(),
        skipped
    );
    Ok(())
}

/// Collects batch records as documents finish.
///
/// Images are written and dropped per document. Any failure, including an
/// image write, skips that one document only.
struct BatchSink<'a> {
    pb: ProgressBar,
    image_dir: Option<&'a Path>,
    city: Option<&'a str>,
    records: Mutex<Vec<(usize, RentalProperty)>>,
    skipped: AtomicUsize,
}

impl<'a> BatchSink<'a> {
    fn new(pb: ProgressBar, image_dir: Option<&'a Path>, city: Option<&'a str>) -> Self {
        Self {
            pb,
            image_dir,
            city,
            records: Mutex::new(Vec::new()),
            skipped: AtomicUsize::new(0),
        }
    }

    fn accept(&self, index: usize, item: BatchItem) {
        self.pb.set_message(item.path.display().to_string());
        let outcome = match item.result {
            Ok(Some(listing)) => {
                self.pb.suspend(|| print_report(&item.path, listing.report()));
                finish_record(listing, self.city, self.image_dir).map(Some)
            }
            Ok(None) => {
                log::info!("{}: no table, skipping", item.path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(Some(property)) => self
                .records
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push((index, property)),
            Ok(None) => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.pb
                    .println(format!("{} {}: {}", "Skipped".red(), item.path.display(), e));
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.pb.inc(1);
    }

    /// Records in input order, and the number of skipped documents.
    fn finish(self) -> (Vec<RentalProperty>, usize) {
        let mut records = self
            .records
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.sort_by_key(|(index, _)| *index);
        let records = records.into_iter().map(|(_, property)| property).collect();
        (records, self.skipped.into_inner())
    }
}

/// Assign an id, store the images and build the record.
fn finish_record(
    listing: ProcessedListing,
    city: Option<&str>,
    image_dir: Option<&Path>,
) -> Result<RentalProperty, Box<dyn std::error::Error>> {
    let id = uuid::Uuid::new_v4().to_string();
    let mut builder = listing.into_builder(id);
    if let Some(city) = city {
        builder = builder.with_city(city);
    }
    let property = builder.build();

    if let (Some(dir), Some(images)) = (image_dir, property.images.as_ref()) {
        for (name, blob) in images.files() {
            fs::write(dir.join(name), blob)?;
        }
    }
    Ok(property)
}

fn print_report(path: &Path, report: &NormalizationReport) {
    for d in report.iter() {
        eprintln!(
            "{} {}: {} ({:?} = {:?}): {}",
            "Warning:".yellow(),
            path.display(),
            d.field,
            d.label,
            d.value.as_deref().unwrap_or_default(),
            d.error
        );
    }
}

fn cmd_labels(dictionary: &LabelDictionary, rules: bool) -> CliResult {
    if !rules {
        println!("{}", dictionary.to_json()?);
        return Ok(());
    }

    println!(
        "{} v{} ({}), affirmative {:?}",
        "Label dictionary".cyan().bold(),
        dictionary.version,
        dictionary.locale,
        dictionary.affirmative
    );
    println!("{}", "─".repeat(60).dimmed());
    for field in FieldId::ALL {
        let label = match dictionary.label(field) {
            Some(label) => label.normal(),
            None => "(unmapped)".dimmed(),
        };
        println!(
            "{:<16} {:<26} {}",
            field.as_str().bold(),
            label,
            field.rule().as_str().dimmed()
        );
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "rentsheet".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Rental presentation-sheet extraction tool");
    println!();
    println!("License: MIT");
}
