use brand_gallery::config::{self, ConfigSource, GalleryConfig, Overrides};
use brand_gallery::watch::{Rebuilder, WatchVariant};
use brand_gallery::{build, clean, output, serve, watch};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(clap::Args, Clone)]
struct ServeArgs {
    /// Port to listen on (overrides $PORT and gallery.toml)
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
#[command(name = "brand-gallery")]
#[command(about = "Build, serve, and watch a single-page image gallery")]
#[command(long_about = "\
Build, serve, and watch a single-page image gallery

Images in the source directory are listed on one generated page and copied
next to it. Every build is a full rebuild.

Project layout:

  .
  ├── gallery.toml            # Optional config (see `gen-config`)
  ├── index.template.html     # Optional, must contain /* IMAGE_FILES_PLACEHOLDER */
  ├── images/                 # jpg, jpeg, png, gif, svg, webp (top level only)
  │   ├── a.jpg
  │   └── b.png
  └── dist/                   # Output, owned by the build
      ├── index.html
      └── images/

Without a template file a built-in page is used.

Run 'brand-gallery gen-config' to print a documented gallery.toml.")]
#[command(version)]
struct Cli {
    /// Image directory (overrides gallery.toml)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// HTML template (overrides gallery.toml)
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    /// Output directory (overrides gallery.toml)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Config file; missing is fine
    #[arg(long, default_value = "gallery.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the gallery once, or keep rebuilding with --watch
    Build {
        /// Rebuild whenever images or the template change
        #[arg(long)]
        watch: bool,
    },
    /// Delete the output directory
    Clean,
    /// Build, then serve the output and rebuild on change
    Serve(ServeArgs),
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let source = ConfigSource::new(&cli.config, overrides(&cli));
    let config = source.resolve()?;

    match cli.command {
        Command::Build { watch: false } => {
            run_build(&config)?;
        }
        Command::Build { watch: true } => {
            exit_on_interrupt();
            run_build(&config)?;
            watch::watch(Rebuilder::new(config, None), WatchVariant::Standalone)?;
        }
        Command::Clean => {
            println!("==> Cleaning {}", config.output.display());
            let report = clean::clean(&config.output)?;
            output::print_clean_report(&config.output, &report);
        }
        Command::Serve(_) => {
            exit_on_interrupt();
            // A failed initial build exits non-zero before the server starts
            run_build(&config)?;

            let server = serve::DevServer::bind(&config.serve, &config.output)?;

            let rebuilder = Rebuilder::new(config.clone(), Some(source));
            std::thread::spawn(move || {
                if let Err(e) = watch::watch(rebuilder, WatchVariant::DevServer) {
                    error!("Watcher stopped: {e}");
                }
            });

            output::print_serve_banner(server.local_addr(), server.root());
            server.run();
        }
        Command::GenConfig => unreachable!("handled before config loading"),
    }

    Ok(())
}

fn overrides(cli: &Cli) -> Overrides {
    let port = match &cli.command {
        Command::Serve(args) => args.port,
        _ => None,
    };
    Overrides {
        source: cli.source.clone(),
        template: cli.template.clone(),
        output: cli.output.clone(),
        port,
    }
}

fn run_build(config: &GalleryConfig) -> Result<(), build::BuildError> {
    println!("==> Building gallery from {}", config.source.display());
    let report = build::build(config)?;
    output::print_build_report(&report, &config.images_output_dir());
    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Ctrl+C / SIGTERM exit immediately; the OS tears down sockets and watches.
fn exit_on_interrupt() {
    if let Err(e) = ctrlc::set_handler(|| {
        println!("\nShutting down...");
        std::process::exit(0);
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }
}
