use clap::{Parser, Subcommand};
use crumb::config::{self, Config};
use crumb::imaging::RustBackend;
use crumb::remote::DirectorySource;
use crumb::sync::{self, SyncOptions};
use crumb::{catalog, generate, output, render};
use std::path::PathBuf;
use std::process::ExitCode;

/// Shared flags for commands that sync photos.
#[derive(clap::Args, Clone)]
struct ForceArgs {
    /// Re-encode every photo, even when unchanged since the last sync
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
#[command(name = "crumb")]
#[command(version)]
#[command(about = "Keeps a bakery's site in sync with its menu sheet and photos")]
#[command(long_about = "\
Keeps a bakery's site in sync with its menu sheet and photos

The shared folder holds the menu catalog exported as CSV plus one photo per
product. crumb copies both locally, keeps web-sized photos up to date, and
writes the site pages.

Shared folder:

  drive/
  ├── menu.csv                     # name,category,description,price,weight_unit,image,testimonials,show
  ├── IMG_2041.jpg                 # Photos, referenced by the image column
  └── web/                         # Published web photos (optional)
      └── chocolate-truffle.jpg

Project:

  config.toml                      # Optional, see 'crumb gen-config'
  data/menu.csv                    # Local catalog copy
  data/images_raw/                 # Original photos
  data/images_web/                 # Web photos, named by item slug
  data/images_manifest.json        # Fingerprints for incremental syncs
  content/                         # 'generate' output
  public/                          # 'render' output

Run 'crumb gen-config' to generate a documented config.toml.")]
struct Cli {
    /// Project root holding config.toml and the data directories
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Shared folder to sync from (overrides source.folder)
    #[arg(long, global = true)]
    folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the catalog and photos, refresh web photos
    Sync(ForceArgs),
    /// Write markdown content from the local catalog
    Generate,
    /// Write a static HTML site from the local catalog
    Render,
    /// Run the full pipeline: sync → generate
    Build(ForceArgs),
    /// Validate the local catalog without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if matches!(cli.command, Command::GenConfig) {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = config::load_config(&cli.root)?;
    if let Some(folder) = &cli.folder {
        config.source.folder = std::path::absolute(folder)?.to_string_lossy().into_owned();
    }

    let status = match cli.command {
        Command::Sync(force_args) => {
            run_sync(&config, force_args.force)?;
            ExitCode::SUCCESS
        }
        Command::Generate => run_generate(&config)?,
        Command::Render => {
            let report = render::render_site(&config.catalog_path(), &config)?;
            output::print_generate_report(&report);
            exit_status(report.has_errors())
        }
        Command::Build(force_args) => {
            println!("==> Stage 1: Syncing from {}", config.source_folder()?.display());
            run_sync(&config, force_args.force)?;
            println!("==> Stage 2: Generating content → {}", config.content_dir().display());
            let status = run_generate(&config)?;
            println!("==> Build complete");
            status
        }
        Command::Check => {
            let catalog_path = config.catalog_path();
            println!("==> Checking {}", catalog_path.display());
            let catalog = catalog::load_catalog(&catalog_path, &config.catalog)?;
            output::print_catalog_check(&catalog);
            exit_status(!catalog.errors.is_empty())
        }
        Command::GenConfig => ExitCode::SUCCESS,
    };

    Ok(status)
}

fn run_sync(config: &Config, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let remote = DirectorySource::new(config.source_folder()?);
    let backend = RustBackend::new();
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_sync_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = sync::sync(&remote, &backend, config, &SyncOptions { force }, Some(tx));
    printer.join().ok();
    let report = result?;
    output::print_sync_report(&report);
    Ok(())
}

fn run_generate(config: &Config) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let report = generate::generate_content(&config.catalog_path(), config)?;
    output::print_generate_report(&report);
    if report.has_errors() {
        println!("Site generation completed with errors.");
    } else {
        println!("Site generated successfully.");
    }
    Ok(exit_status(report.has_errors()))
}

fn exit_status(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
