//! laptrace CLI - timing sheet extraction tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use laptrace::{parse_file, report, EntrantAliases, Report, ReportKind};

#[derive(Parser)]
#[command(name = "laptrace")]
#[command(version)]
#[command(about = "Extract race timing data from FIA PDF timing sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every report for one event from a directory of timing PDFs
    ///
    /// PDFs are matched by report kind from their file stem, e.g.
    /// "2024_05_monaco_race_classification.pdf". One report failing does
    /// not stop the others.
    Event {
        /// Directory holding the event's timing PDFs
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Output directory (defaults to DIR)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,

        /// Entrant alias table (JSON), overriding the bundled one
        #[arg(long, value_name = "FILE", env = "LAPTRACE_ALIASES")]
        aliases: Option<PathBuf>,
    },

    /// Qualifying classification
    Quali {
        /// Qualifying classification PDF
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
    },

    /// Race classification and per-event constructor results
    Race {
        /// Race classification PDF
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Lap chart PDF (source of the starting grid)
        #[arg(long, value_name = "FILE")]
        lap_chart: PathBuf,

        /// Entrant alias table (JSON), overriding the bundled one
        #[arg(long, value_name = "FILE", env = "LAPTRACE_ALIASES")]
        aliases: Option<PathBuf>,

        /// Output directory (current directory if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
    },

    /// Lap-by-lap analysis joined with the lap chart
    Laps {
        /// Lap analysis PDF
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Lap chart PDF
        #[arg(long, value_name = "FILE")]
        lap_chart: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
    },

    /// Pit stop summary
    Pits {
        /// Pit stop summary PDF
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
    },

    /// Championship standings
    Standings {
        /// Championship standings PDF
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Which championship the sheet holds
        #[arg(long, value_enum)]
        table: StandingsTable,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
    },

    /// Show document information
    Info {
        /// Timing sheet PDF
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Comma-separated values
    Csv,
    /// JSON array of row objects
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StandingsTable {
    /// Drivers' championship
    Drivers,
    /// Constructors' championship
    Constructors,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Event {
            dir,
            output,
            format,
            aliases,
        } => cmd_event(&dir, output.as_deref(), format, aliases.as_deref()),
        Commands::Quali {
            input,
            output,
            format,
        } => cmd_quali(&input, output.as_deref(), format),
        Commands::Race {
            input,
            lap_chart,
            aliases,
            output,
            format,
        } => cmd_race(
            &input,
            &lap_chart,
            aliases.as_deref(),
            output.as_deref(),
            format,
        ),
        Commands::Laps {
            input,
            lap_chart,
            output,
            format,
        } => cmd_laps(&input, &lap_chart, output.as_deref(), format),
        Commands::Pits {
            input,
            output,
            format,
        } => cmd_pits(&input, output.as_deref(), format),
        Commands::Standings {
            input,
            table,
            output,
            format,
        } => cmd_standings(&input, table, output.as_deref(), format),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_aliases(path: Option<&Path>) -> Result<EntrantAliases, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(EntrantAliases::from_json_str(&json)?)
        }
        None => Ok(EntrantAliases::bundled()),
    }
}

/// Print to stdout or write to the given file.
fn emit(report: &Report, output: Option<&Path>, format: Format) -> CliResult {
    let content = match format {
        Format::Csv => report.to_csv_string(),
        Format::Json => report.to_json_string()?,
    };
    match output {
        Some(path) => {
            fs::write(path, content)?;
            println!("{} {}", "Wrote".green().bold(), path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

/// Write into a directory under the report's own name.
fn write_into(report: &Report, dir: &Path, format: Format) -> CliResult {
    let ext = match format {
        Format::Csv => "csv",
        Format::Json => "json",
    };
    let path = dir.join(format!("{}.{ext}", report.name));
    let content = match format {
        Format::Csv => report.to_csv_string(),
        Format::Json => report.to_json_string()?,
    };
    fs::write(&path, content)?;
    println!("{} {}", "Wrote".green().bold(), path.display());
    Ok(())
}

fn cmd_quali(input: &Path, output: Option<&Path>, format: Format) -> CliResult {
    let doc = parse_file(ReportKind::QualiClassification, input)?;
    let built = report::build_quali_classification(&doc)?;
    emit(&built, output, format)
}

fn cmd_race(
    input: &Path,
    lap_chart: &Path,
    aliases: Option<&Path>,
    output: Option<&Path>,
    format: Format,
) -> CliResult {
    let race = parse_file(ReportKind::RaceClassification, input)?;
    let chart = parse_file(ReportKind::RaceLapChart, lap_chart)?;
    let aliases = load_aliases(aliases)?;
    let built = report::build_race_classification(&race, &chart, &aliases)?;

    let dir = output.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    write_into(&built.drivers, dir, format)?;
    write_into(&built.constructors, dir, format)?;
    Ok(())
}

fn cmd_laps(input: &Path, lap_chart: &Path, output: Option<&Path>, format: Format) -> CliResult {
    let analysis = parse_file(ReportKind::RaceLapAnalysis, input)?;
    let chart = parse_file(ReportKind::RaceLapChart, lap_chart)?;
    let built = report::build_lap_analysis(&analysis, &chart)?;
    emit(&built, output, format)
}

fn cmd_pits(input: &Path, output: Option<&Path>, format: Format) -> CliResult {
    let doc = parse_file(ReportKind::RacePitStops, input)?;
    let built = report::build_pit_stops(&doc)?;
    emit(&built, output, format)
}

fn cmd_standings(
    input: &Path,
    table: StandingsTable,
    output: Option<&Path>,
    format: Format,
) -> CliResult {
    let built = match table {
        StandingsTable::Drivers => {
            let doc = parse_file(ReportKind::DriversChampionship, input)?;
            report::build_drivers_championship(&doc)?
        }
        StandingsTable::Constructors => {
            let doc = parse_file(ReportKind::ConstructorsChampionship, input)?;
            report::build_constructors_championship(&doc)?
        }
    };
    emit(&built, output, format)
}

fn cmd_info(input: &Path) -> CliResult {
    let kind = kind_from_stem(input).unwrap_or(ReportKind::RaceClassification);
    let doc = parse_file(kind, input)?;
    let meta = &doc.metadata;

    println!("{}", "Document information".green().bold());
    println!("  kind:        {}", doc.kind);
    println!("  pages:       {}", doc.page_count());
    println!("  pdf version: {}", meta.pdf_version);
    if let Some(page) = doc.get_page(1) {
        println!("  page size:   {:.0} x {:.0} pt", page.width, page.height);
    }
    if let Some(title) = &meta.title {
        println!("  title:       {title}");
    }
    if let Some(creator) = &meta.creator {
        println!("  creator:     {creator}");
    }
    if let Some(producer) = &meta.producer {
        println!("  producer:    {producer}");
    }
    if let Some(created) = &meta.created {
        println!("  created:     {created}");
    }
    if let Some(modified) = &meta.modified {
        println!("  modified:    {modified}");
    }
    Ok(())
}

/// Longest report kind whose name ends the file stem, or the kind whose
/// FIA publication stem the file carries.
///
/// "sprint_quali_classification" must win over "quali_classification" when
/// both match. FIA stems end in a version suffix that changes on
/// republication, so only the prefix is compared.
fn kind_from_stem(path: &Path) -> Option<ReportKind> {
    let stem = path.file_stem()?.to_str()?.to_ascii_lowercase();
    ReportKind::ALL
        .iter()
        .copied()
        .filter(|k| {
            stem.ends_with(k.as_str()) || stem.starts_with(k.slug().trim_end_matches("v01"))
        })
        .max_by_key(|k| k.as_str().len())
}

fn find_document(dir: &Path, kind: ReportKind) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pdf") {
            continue;
        }
        if kind_from_stem(&path) == Some(kind) {
            log::debug!("{kind}: using {}", path.display());
            return Some(path);
        }
    }
    None
}

/// Build every report the directory has documents for.
///
/// Builders are isolated: a failure is reported and the remaining reports
/// are still attempted.
fn cmd_event(
    dir: &Path,
    output: Option<&Path>,
    format: Format,
    aliases: Option<&Path>,
) -> CliResult {
    let out_dir = output.unwrap_or(dir);
    fs::create_dir_all(out_dir)?;
    let aliases = load_aliases(aliases)?;

    let chart = match find_document(dir, ReportKind::RaceLapChart) {
        Some(path) => match parse_file(ReportKind::RaceLapChart, &path) {
            Ok(doc) => Some(doc),
            Err(e) => {
                eprintln!("{} race_lap_chart: {e}", "failed".red().bold());
                None
            }
        },
        None => None,
    };

    let mut built = 0usize;
    let mut failed = 0usize;
    let mut run = |name: &str, result: Result<Vec<Report>, Box<dyn std::error::Error>>| match result
    {
        Ok(reports) => {
            for report in &reports {
                match write_into(report, out_dir, format) {
                    Ok(()) => built += 1,
                    Err(e) => {
                        eprintln!("{} {name}: {e}", "failed".red().bold());
                        failed += 1;
                    }
                }
            }
        }
        Err(e) => {
            eprintln!("{} {name}: {e}", "failed".red().bold());
            failed += 1;
        }
    };

    if let Some(path) = find_document(dir, ReportKind::QualiClassification) {
        run("quali_classification", build_quali(&path));
    }
    if let (Some(path), Some(chart)) =
        (find_document(dir, ReportKind::RaceClassification), &chart)
    {
        run("race_classification", build_race(&path, chart, &aliases));
    }
    if let (Some(path), Some(chart)) = (find_document(dir, ReportKind::RaceLapAnalysis), &chart) {
        run("laps_analysis", build_laps(&path, chart));
    }
    if let Some(path) = find_document(dir, ReportKind::RacePitStops) {
        run("race_pit_stops", build_pits(&path));
    }
    if let Some(path) = find_document(dir, ReportKind::DriversChampionship) {
        run("drivers_championship", build_drivers(&path));
    }
    if let Some(path) = find_document(dir, ReportKind::ConstructorsChampionship) {
        run("constructors_championship", build_constructors(&path));
    }

    println!(
        "\n{} {built} report(s) written, {failed} failed",
        "Done:".green().bold()
    );
    if failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}

fn build_quali(path: &Path) -> Result<Vec<Report>, Box<dyn std::error::Error>> {
    let doc = parse_file(ReportKind::QualiClassification, path)?;
    Ok(vec![report::build_quali_classification(&doc)?])
}

fn build_race(
    path: &Path,
    chart: &laptrace::TimingDocument,
    aliases: &EntrantAliases,
) -> Result<Vec<Report>, Box<dyn std::error::Error>> {
    let doc = parse_file(ReportKind::RaceClassification, path)?;
    let built = report::build_race_classification(&doc, chart, aliases)?;
    Ok(vec![built.drivers, built.constructors])
}

fn build_laps(
    path: &Path,
    chart: &laptrace::TimingDocument,
) -> Result<Vec<Report>, Box<dyn std::error::Error>> {
    let doc = parse_file(ReportKind::RaceLapAnalysis, path)?;
    Ok(vec![report::build_lap_analysis(&doc, chart)?])
}

fn build_pits(path: &Path) -> Result<Vec<Report>, Box<dyn std::error::Error>> {
    let doc = parse_file(ReportKind::RacePitStops, path)?;
    Ok(vec![report::build_pit_stops(&doc)?])
}

fn build_drivers(path: &Path) -> Result<Vec<Report>, Box<dyn std::error::Error>> {
    let doc = parse_file(ReportKind::DriversChampionship, path)?;
    Ok(vec![report::build_drivers_championship(&doc)?])
}

fn build_constructors(path: &Path) -> Result<Vec<Report>, Box<dyn std::error::Error>> {
    let doc = parse_file(ReportKind::ConstructorsChampionship, path)?;
    Ok(vec![report::build_constructors_championship(&doc)?])
}
