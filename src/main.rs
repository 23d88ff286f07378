use clap::Parser;
use iconmill::alias::AliasDef;
use iconmill::config::{self, CliOverrides};
use iconmill::imaging::MagickBackend;
use iconmill::{output, resolve, runner};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iconmill")]
#[command(about = "Batch image resizer for platform icon and asset sets")]
#[command(long_about = "\
Batch image resizer for platform icon and asset sets

A JSON config describes source images, target paths and resolutions;
iconmill expands aliases and glob patterns into concrete resize tasks and
runs them through ImageMagick, optionally optimizing the results with
optipng/jpegtran.

Config structure:

  {
    \"tags\": \"ios,android\",
    \"aliases\": [
      { \"name\": \"<lang>\", \"value\": [\"en\", \"de\"] }
    ],
    \"images\": [
      {
        \"sourcePath\": \"art/<lang>/icon-*.png\",
        \"targetPath\": \"ios/<lang>/*.png\",
        \"resolution\": \"57x57\",
        \"tags\": \"ios\"
      }
    ]
  }

Relative paths are anchored at the config file's directory (override with
\"basePath\", typically from config-local.json). Requires ImageMagick's
`convert` on PATH; `optipng`/`jpegtran` only when the optimize step is
configured.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Local override file (default: config-local.json next to --config)
    #[arg(long)]
    config_local: Option<PathBuf>,

    /// Active tags as a comma-separated list (overrides config tags)
    #[arg(long)]
    tags: Option<String>,

    /// Extra alias: a name and its comma-separated values (repeatable)
    #[arg(long, num_args = 2, value_names = ["NAME", "VALUES"], action = clap::ArgAction::Append)]
    alias: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        tags: cli
            .tags
            .map(|tags| tags.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
        aliases: cli
            .alias
            .chunks_exact(2)
            .map(|pair| AliasDef {
                name: pair[0].clone(),
                values: pair[1].split(',').map(str::to_string).collect(),
            })
            .collect(),
    };

    let config = config::load(&cli.config, cli.config_local.as_deref(), &overrides)?;
    println!("==> Config: {}", cli.config.display());
    println!("    Base dir: {}", config.base_path.display());
    let tags: Vec<&str> = config.active_tags.iter().map(String::as_str).collect();
    println!("    Tags: {}", tags.join(","));

    println!("==> Resolving image paths");
    let batch = resolve::resolve_tasks(&config);
    output::print_resolve_summary(&batch, &config.active_tags);

    println!("==> Resizing images");
    let backend = MagickBackend::new();
    let report = runner::run_batch(&batch.tasks, &config, &backend)?;
    output::print_batch_report(&report);

    Ok(())
}
