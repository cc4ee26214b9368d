//! Hausset CLI
//!
//! Content API server, contact relay and deploy helper for the Hausset site.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;
use hausset_core::Environment;

/// Command-line interface for Hausset.
#[derive(Parser)]
#[command(
    name = "hausset",
    version,
    about = "Content API, contact relay and deploy helper for the Hausset site"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "hausset.toml", global = true)]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Serve the content API, contact relay and built front-end
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Watch the content directory and stream changes
        #[arg(long)]
        watch: bool,
        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },
    /// Watch the content directory and print changes
    Watch,
    /// Validate configuration and content
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Resolve page content through the source chain
    Resolve {
        /// Deployment environment (local or deployed)
        #[arg(short, long)]
        environment: Option<Environment>,
        /// Content API base URL (overrides source.api_base)
        #[arg(long)]
        api_base: Option<String>,
        /// Print the resolved content as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate content, build the client and serve
    Deploy {
        /// Rebuild the client when content changes
        #[arg(long)]
        watch: bool,
        /// Serve without building the client first
        #[arg(long)]
        skip_build: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    hausset::init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve { port, watch, open } => {
            hausset::cmd::serve::run(&cli.config, port, watch, open).await?;
        }
        Commands::Watch => {
            hausset::cmd::watch::run(&cli.config).await?;
        }
        Commands::Check { strict } => {
            hausset::cmd::check::run(&cli.config, strict)?;
        }
        Commands::Resolve {
            environment,
            api_base,
            json,
        } => {
            hausset::cmd::resolve::run(&cli.config, environment, api_base, json).await?;
        }
        Commands::Deploy { watch, skip_build } => {
            hausset::cmd::deploy::run(&cli.config, watch, skip_build).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_serve_command_parsing() {
        let args = ["hausset", "serve", "--port", "8080"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, std::path::PathBuf::from("hausset.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Serve { port, watch, open } => {
                assert_eq!(port, Some(8080));
                assert!(!watch);
                assert!(!open);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_serve_defaults_port_to_config() {
        let args = ["hausset", "serve", "--watch", "--open"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Serve { port, watch, open } => {
                assert!(port.is_none());
                assert!(watch);
                assert!(open);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_watch_command() {
        let args = ["hausset", "watch"];
        let cli = Cli::parse_from(args);

        assert!(matches!(cli.command, Commands::Watch));
    }

    #[test]
    fn test_cli_check_strict() {
        let args = ["hausset", "check", "--strict"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Check { strict } => {
                assert!(strict);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_resolve_overrides() {
        let args = [
            "hausset",
            "resolve",
            "--environment",
            "production",
            "--api-base",
            "https://hausset.com/api",
        ];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Resolve {
                environment,
                api_base,
                json,
            } => {
                assert_eq!(environment, Some(Environment::Deployed));
                assert_eq!(api_base.as_deref(), Some("https://hausset.com/api"));
                assert!(!json);
            }
            _ => panic!("Expected Resolve command"),
        }
    }

    #[test]
    fn test_cli_resolve_rejects_unknown_environment() {
        let args = ["hausset", "resolve", "--environment", "staging"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_deploy_flags() {
        let args = ["hausset", "deploy", "--watch", "--skip-build"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Deploy { watch, skip_build } => {
                assert!(watch);
                assert!(skip_build);
            }
            _ => panic!("Expected Deploy command"),
        }
    }

    #[test]
    fn test_cli_global_options() {
        let args = ["hausset", "check", "-c", "site.toml", "-vv"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, std::path::PathBuf::from("site.toml"));
        assert_eq!(cli.verbose, 2);
    }
}
