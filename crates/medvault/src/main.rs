// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Medvault - appointment and medication reminder service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod tick;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use medvault_config::MedvaultConfig;
use medvault_engine::PassKind;

/// Medvault - appointment and medication reminder service.
#[derive(Parser, Debug)]
#[command(name = "medvault", version, about, long_about = None)]
struct Cli {
    /// Read this file instead of the standard config locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scheduler and the HTTP gateway until interrupted.
    Serve,
    /// Run one pass immediately and print its report.
    Tick {
        #[arg(value_enum, default_value_t = TickTarget::All)]
        target: TickTarget,
        /// Print reports as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration and print the resolved values.
    CheckConfig,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TickTarget {
    Appointments,
    Medications,
    All,
}

impl TickTarget {
    fn kinds(self) -> Vec<PassKind> {
        match self {
            TickTarget::Appointments => vec![PassKind::Appointments],
            TickTarget::Medications => vec![PassKind::Medications],
            TickTarget::All => vec![PassKind::Appointments, PassKind::Medications],
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> MedvaultConfig {
    let loaded = match path {
        Some(path) => medvault_config::load_and_validate_path(path),
        None => medvault_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            medvault_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Tick { target, json }) => tick::run_tick(config, &target.kinds(), json).await,
        Some(Commands::CheckConfig) => {
            check_config(&config);
            Ok(())
        }
        None => {
            println!("medvault: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("medvault: {e}");
        std::process::exit(1);
    }
}

fn check_config(config: &MedvaultConfig) {
    println!("medvault: configuration is valid");
    match toml::to_string_pretty(config) {
        Ok(rendered) => print!("{}", redact(&rendered)),
        Err(e) => eprintln!("medvault: could not render configuration: {e}"),
    }
}

/// Blank out credentials before printing.
fn redact(rendered: &str) -> String {
    rendered
        .lines()
        .map(|line| {
            if line.trim_start().starts_with("smtp_password") {
                "smtp_password = \"********\"".to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn tick_defaults_to_all() {
        let cli = Cli::try_parse_from(["medvault", "tick"]).unwrap();
        match cli.command {
            Some(Commands::Tick { target, json }) => {
                assert_eq!(target, TickTarget::All);
                assert!(!json);
                assert_eq!(
                    target.kinds(),
                    vec![PassKind::Appointments, PassKind::Medications]
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn tick_accepts_a_single_pass() {
        let cli =
            Cli::try_parse_from(["medvault", "tick", "medications", "--json", "-c", "x.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Tick {
                target: TickTarget::Medications,
                json: true
            })
        ));
    }

    #[test]
    fn check_config_subcommand_parses() {
        let cli = Cli::try_parse_from(["medvault", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert!(Cli::try_parse_from(["medvault", "tick", "everything"]).is_err());
    }

    #[test]
    fn redact_hides_password() {
        let out = redact("[notifier]\nsmtp_password = \"hunter2\"\nsmtp_port = 465");
        assert!(!out.contains("hunter2"));
        assert!(out.contains("smtp_port = 465"));
    }

    #[test]
    fn check_config_output_hides_smtp_password() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[notifier]\nbackend = \"smtp\"\nsmtp_host = \"mail.example.org\"\n\
             from_address = \"care@example.org\"\nsmtp_username = \"care\"\n\
             smtp_password = \"hunter2\""
        )
        .unwrap();

        let config = medvault_config::load_and_validate_path(file.path()).unwrap();
        let rendered = redact(&toml::to_string_pretty(&config).unwrap());
        assert!(rendered.contains("mail.example.org"));
        assert!(rendered.contains("smtp_password = \"********\""));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = medvault_config::load_and_validate_str("").expect("defaults should be valid");
        assert_eq!(config.service.name, "medvault");
    }
}
