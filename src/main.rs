//! opendata-glance - browse public gaming datasets in a hosted data warehouse.

use chrono::Local;
use tracing::{error, info};

use opendata_glance::auth::{self, AuthToken};
use opendata_glance::cli::{Cli, Command, OutputFormat};
use opendata_glance::config::Config;
use opendata_glance::curators;
use opendata_glance::engine;
use opendata_glance::error::{OpenDataError, Result};
use opendata_glance::logging;
use opendata_glance::query::{ExecutionOutcome, ProjectSelector, Query, QueryExecutor};
use opendata_glance::render;

/// Exit code when no usable token is available.
const EXIT_UNAUTHENTICATED: i32 = 2;

const REDDIT_NOTICE: &str = "Finding mentions of Steam games on Reddit is coming soon. In the \
meantime, you can query this data in BigQuery directly: \
https://bigquery.cloud.google.com/dataset/hivemp:public";

const NOT_LOGGED_IN: &str =
    "Not logged in: supply a valid access token (OPENDATA_ACCESS_TOKEN or --token-file).";

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(logging::directive_for_verbosity(cli.verbose));

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e.message());
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let format = cli
        .parse_output_format()
        .map_err(OpenDataError::config)?;

    if cli.command == Command::Reddit {
        println!("{REDDIT_NOTICE}");
        return Ok(0);
    }

    // Precedence: CLI arguments, then environment, then config file.
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_overrides();
    cli.apply_to(&mut config);

    let token = resolve_token(&config)?;
    let engine = engine::connect(&config.engine)?;
    let executor = QueryExecutor::new(
        engine.as_ref(),
        ProjectSelector::from(config.engine.project_id.clone()),
    );

    let printed = match &cli.command {
        Command::Top => curators::top_curators(&executor, token.as_ref())
            .await?
            .map(|list| print_curators(&list, true, format)),
        Command::Search { name } => curators::search_curators(&executor, token.as_ref(), name)
            .await?
            .map(|list| print_curators(&list, false, format)),
        Command::Curator { id } => curators::curator_detail(&executor, token.as_ref(), *id)
            .await?
            .map(|detail| match detail {
                Some(detail) => print!("{}", render::render_curator_detail(&detail, &Local)),
                None => println!("The specified curator does not exist!"),
            }),
        Command::Query { sql, .. } => {
            let query = Query::new(sql.as_str()).with_parameters(cli.query_parameters()?);
            executor
                .execute(&query, token.as_ref())
                .await?
                .map(|output| match format {
                    OutputFormat::Text => print!("{}", render::render_output(&output)),
                    OutputFormat::Json => println!("{}", render::render_json(&output)),
                })
        }
        Command::Reddit => ExecutionOutcome::Completed(()),
    };

    if printed.is_unauthenticated() {
        eprintln!("{NOT_LOGGED_IN}");
        return Ok(EXIT_UNAUTHENTICATED);
    }
    Ok(0)
}

/// Loads the bearer token from the configured token file, falling back to
/// the environment.
fn resolve_token(config: &Config) -> Result<Option<AuthToken>> {
    if let Some(path) = &config.auth.token_file {
        if let Some(token) = auth::load_token_file(path)? {
            return Ok(Some(token));
        }
    }
    Ok(auth::token_from_env())
}

fn print_curators(list: &[curators::CuratorSummary], is_top: bool, format: OutputFormat) {
    match format {
        OutputFormat::Text => print!("{}", render::render_curator_list(list, is_top, &Local)),
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = list
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "id": c.id,
                        "name": c.name,
                        "followers": c.followers,
                        "totalReviews": c.total_reviews,
                        "percentFavourable": c.percent_favourable,
                        "lastReviewDate": c.last_review.map(|d| d.timestamp_millis()),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
    }
}
