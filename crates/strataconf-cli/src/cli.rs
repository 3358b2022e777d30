//! strataconf CLI - inspect layered application configuration
//!
//! Usage:
//!   strataconf get parent.string --app myapp --app-path /opt/myapp
//!   strataconf dump --app myapp --defaults defaults.yml --override local.yml
//!   strataconf paths --app myapp --app-path /opt/myapp
//!   strataconf check defaults.yml local.yml

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use strataconf_core::source::{self, Format, LocalFiles};
use strataconf_core::{Config, ConfigOptions, Loader, Value, CONFIG_FLAG};

/// strataconf - Layered configuration with a locked shape
#[derive(Parser)]
#[command(name = "strataconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get a specific value from the configuration
    Get {
        /// Dotted key of the value (e.g., database.host)
        key: String,

        #[command(flatten)]
        load: LoadArgs,

        /// Output format: text, json, yaml
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Value to print if the key is not found
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Export the merged configuration
    Dump {
        #[command(flatten)]
        load: LoadArgs,

        /// Output format: yaml, json
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show source files instead of values
        #[arg(long)]
        sources: bool,
    },

    /// List the candidate files in merge order
    Paths {
        #[command(flatten)]
        load: LoadArgs,
    },

    /// Quick syntax check of YAML or JSON files
    Check {
        /// Configuration file(s) to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Where the configuration comes from
#[derive(Args)]
struct LoadArgs {
    /// Application name, used for /etc/<app>/config.yml
    #[arg(long)]
    app: String,

    /// Application directory holding config/defaults.yml
    #[arg(long, required_unless_present = "defaults")]
    app_path: Option<PathBuf>,

    /// Defaults file, instead of <app-path>/config/defaults.yml
    #[arg(long)]
    defaults: Option<PathBuf>,

    /// Override file, in increasing precedence; replaces the conventional locations
    #[arg(long = "override", value_name = "FILE")]
    overrides: Vec<PathBuf>,

    /// Config file that must exist and wins over every other file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fail on override keys the defaults do not declare
    #[arg(long)]
    strict: bool,
}

impl LoadArgs {
    fn loader(&self) -> Result<Loader, String> {
        let mut options = ConfigOptions::new().with_strict(self.strict);
        if let Some(app_path) = &self.app_path {
            options = options.with_app_path(app_path);
        }
        if let Some(defaults) = &self.defaults {
            options = options.with_defaults_path(defaults);
        }
        if !self.overrides.is_empty() {
            options = options.with_paths(self.overrides.iter().cloned());
        }

        let mut args = HashMap::new();
        if let Some(config) = &self.config {
            args.insert(CONFIG_FLAG.to_string(), config.display().to_string());
        }

        Loader::new(self.app.as_str(), options)
            .map(|loader| loader.with_cli_args(&args))
            .map_err(|e| e.to_string())
    }

    fn load(&self) -> Result<Config, String> {
        self.loader()?
            .load()
            .map_err(|e| format!("Failed to load configuration for {}: {}", self.app, e))
    }
}

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Get {
            key,
            load,
            format,
            default,
        } => cmd_get(&load, &key, &format, default),

        Commands::Dump {
            load,
            format,
            output,
            sources,
        } => cmd_dump(&load, &format, output, sources),

        Commands::Paths { load } => cmd_paths(&load),

        Commands::Check { files } => cmd_check(files),
    }
}

fn cmd_get(load: &LoadArgs, key: &str, format: &str, default: Option<String>) -> ExitCode {
    let config = match load.load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    match config.get(key) {
        Ok(value) => {
            match format {
                "json" => println!("{}", to_json(&value)),
                "yaml" => print!("{}", to_yaml(&value)),
                _ => match &value {
                    Value::Mapping(_) | Value::Sequence(_) => print!("{}", to_yaml(&value)),
                    scalar => println!("{}", scalar),
                },
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(default_val) = default {
                println!("{}", default_val);
                ExitCode::SUCCESS
            } else {
                eprintln!("{}: {}", "Error".red(), e);
                ExitCode::from(1)
            }
        }
    }
}

fn cmd_dump(load: &LoadArgs, format: &str, output: Option<PathBuf>, sources: bool) -> ExitCode {
    let config = match load.load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let result = if sources {
        let source_map = config.dump_sources();
        let mut keys: Vec<_> = source_map.keys().collect();
        keys.sort();

        if format == "json" {
            Ok(serde_json::to_string_pretty(&source_map).unwrap_or_else(|_| "{}".to_string()) + "\n")
        } else {
            Ok(keys
                .iter()
                .map(|k| format!("{}: {}\n", k, source_map[*k]))
                .collect::<String>())
        }
    } else {
        match format {
            "json" => config.to_json().map(|s| s + "\n"),
            _ => config.to_yaml(),
        }
    };

    match result {
        Ok(content) => {
            if let Some(output_path) = output {
                if let Err(e) = std::fs::write(&output_path, &content) {
                    eprintln!("{}: {}", "Error writing file".red(), e);
                    return ExitCode::from(2);
                }
                eprintln!("{} Wrote to {}", "✓".green(), output_path.display());
            } else {
                print!("{}", content);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_paths(load: &LoadArgs) -> ExitCode {
    let loader = match load.loader() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    for file in &loader.path_spec() {
        let marker = if file.path().is_file() {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("{} {:<8} {}", marker, file.role(), file.path().display());
    }
    ExitCode::SUCCESS
}

fn cmd_check(files: Vec<PathBuf>) -> ExitCode {
    let mut all_valid = true;

    for file in files {
        let format = Format::from_path(&file);
        match source::load_document(&LocalFiles, &file) {
            Ok(_) => {
                println!(
                    "{} {}: valid {}",
                    "✓".green(),
                    file.display(),
                    match format {
                        Format::Json => "JSON",
                        Format::Yaml => "YAML",
                    }
                );
            }
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                all_valid = false;
            }
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn to_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn to_yaml(value: &Value) -> String {
    serde_yaml::to_string(value).unwrap_or_else(|_| format!("{}\n", value))
}
