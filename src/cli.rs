//! Command-line argument parsing for opendata-glance.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::query::QueryParameter;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text tables.
    #[default]
    Text,
    /// JSON array of row objects.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Browse public gaming datasets in a hosted data warehouse.
#[derive(Parser, Debug)]
#[command(name = "opendata")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// JSON token file with access_token and expires_at
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Project to run queries in (default: first accessible project)
    #[arg(short = 'p', long, value_name = "ID")]
    pub project: Option<String>,

    /// Query engine REST endpoint
    #[arg(long, value_name = "URL")]
    pub engine_url: Option<String>,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the top 100 Steam curators by followers
    Top,

    /// Search Steam curators by name (at least 3 characters)
    Search {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Show one Steam curator's details and history
    Curator {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Run an arbitrary query
    Query {
        #[arg(value_name = "SQL")]
        sql: String,

        /// Query parameter as name:TYPE:value (repeatable)
        #[arg(long = "param", value_name = "NAME:TYPE:VALUE")]
        params: Vec<String>,
    },

    /// Reddit mentions dataset
    Reddit,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Overrides config values with those given on the command line.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.engine_url {
            config.engine.base_url = url.clone();
        }
        if let Some(project) = &self.project {
            config.engine.project_id = Some(project.clone());
        }
        if let Some(path) = &self.token_file {
            config.auth.token_file = Some(path.clone());
        }
    }

    /// Parses the --param values of a `query` command.
    pub fn query_parameters(&self) -> Result<Vec<QueryParameter>> {
        match &self.command {
            Command::Query { params, .. } => params.iter().map(|p| p.parse()).collect(),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_parse_top() {
        let cli = parse_args(&["opendata", "top"]);
        assert_eq!(cli.command, Command::Top);
        assert_eq!(cli.parse_output_format().unwrap(), OutputFormat::Text);
    }

    #[test]
    fn test_parse_search() {
        let cli = parse_args(&["opendata", "search", "rock paper"]);
        assert_eq!(
            cli.command,
            Command::Search {
                name: "rock paper".to_string()
            }
        );
    }

    #[test]
    fn test_parse_curator() {
        let cli = parse_args(&["opendata", "curator", "33058"]);
        assert_eq!(cli.command, Command::Curator { id: 33058 });
    }

    #[test]
    fn test_parse_curator_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["opendata", "curator", "abc"]).is_err());
    }

    #[test]
    fn test_parse_query_with_params() {
        let cli = parse_args(&[
            "opendata",
            "query",
            "SELECT @id, @name",
            "--param",
            "id:INTEGER:5",
            "--param",
            "name:STRING:x",
        ]);
        let params = cli.query_parameters().unwrap();
        assert_eq!(
            params,
            vec![
                QueryParameter::integer("id", 5),
                QueryParameter::string("name", "x")
            ]
        );
    }

    #[test]
    fn test_bad_param_is_error() {
        let cli = parse_args(&["opendata", "query", "SELECT 1", "--param", "oops"]);
        assert!(cli.query_parameters().is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = parse_args(&[
            "opendata",
            "--project",
            "hivemp",
            "--engine-url",
            "http://localhost:9050",
            "--token-file",
            "/tmp/token.json",
            "--output",
            "json",
            "-vv",
            "top",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.parse_output_format().unwrap(), OutputFormat::Json);

        let mut config = Config::default();
        cli.apply_to(&mut config);
        assert_eq!(config.engine.project_id, Some("hivemp".to_string()));
        assert_eq!(config.engine.base_url, "http://localhost:9050");
        assert_eq!(config.auth.token_file, Some(PathBuf::from("/tmp/token.json")));
    }

    #[test]
    fn test_invalid_output_format() {
        let cli = parse_args(&["opendata", "--output", "xml", "top"]);
        assert!(cli.parse_output_format().is_err());
    }

    #[test]
    fn test_parse_config_path() {
        let cli = parse_args(&["opendata", "--config", "/path/to/config.toml", "reddit"]);
        assert_eq!(cli.config_path(), PathBuf::from("/path/to/config.toml"));
    }
}
