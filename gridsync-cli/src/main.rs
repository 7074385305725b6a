//! Command-line front end for a gridsync collection.
//!
//! Drives the same grid controller a UI would, one action per invocation.

mod args;
mod error;

use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use gridsync_lib::GridClient;
use gridsync_lib::GridConfig;
use gridsync_lib::GridController;
use gridsync_lib::api::query::DateRange;
use gridsync_lib::api::query::QuerySpec;
use gridsync_lib::api::query::TotalScope;
use gridsync_lib::grid::CreateOutcome;
use gridsync_lib::grid::DeleteOutcome;
use gridsync_lib::grid::EditOutcome;
use gridsync_lib::grid::GridView;
use gridsync_lib::model::Actor;
use gridsync_lib::model::RowId;
use gridsync_lib::model::RowPatch;
use gridsync_lib::validate::Schema;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use self::args::Cli;
use self::args::Command;
use self::args::SchemaChoice;
use self::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    // Loaded before parsing so `.env` values act as env fallbacks.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let url = cli.url.clone();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_transport() {
                eprintln!("Is the backend running at {}?", url);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) -> Result<(), CliError> {
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    match &cli.log_file {
        Some(path) => WriteLogger::init(level, Config::default(), File::create(path)?)?,
        None => TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?,
    }
    Ok(())
}

fn build_grid(cli: &Cli) -> Result<(GridClient, GridController), CliError> {
    let client = GridClient::builder()
        .url(&cli.url)
        .resource(&cli.resource)
        .timeout(cli.timeout())
        .build()?;

    let mut config = GridConfig::default()
        .with_page_size(cli.page_size)
        .with_mutation_timeout(cli.timeout());
    if cli.schema == SchemaChoice::Users {
        config = config.with_schema(Schema::users());
    }
    if let Some(id) = &cli.actor_id {
        let email = cli.actor_email.clone().unwrap_or_default();
        config = config.with_actor(Actor::new(id, email));
    }

    let grid = GridController::new(Arc::new(client.clone()), config);
    Ok((client, grid))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let (client, grid) = build_grid(&cli)?;

    match cli.command {
        Command::List {
            page,
            filters,
            sort,
            since,
            until,
        } => {
            let mut query = QuerySpec::new().page(page);
            for (field, value) in filters {
                query = query.filter(field, value);
            }
            if let Some(sort) = sort {
                query = query.sort(sort);
            }
            if let (Some(start), Some(end)) = (since, until) {
                query = query.date_range(DateRange::new(start, end));
            }
            grid.set_query(query).await?;
            print_page(&grid.view())?;
        }

        Command::Edit { id, fields } => {
            let id = RowId::new(id);
            focus(&grid, &id).await?;
            grid.start_edit(&id).await?;

            let patch: RowPatch = fields.into_iter().collect();
            if let EditOutcome::Saved(row) = grid.save_edit(&id, patch).await? {
                println!("{}", serde_json::to_string(&row)?);
            }
        }

        Command::Create { fields } => {
            let fields: RowPatch = fields.into_iter().collect();
            if let CreateOutcome::Created(row) = grid.create(fields).await? {
                println!("{}", serde_json::to_string(&row)?);
            }
        }

        Command::Delete { ids } if ids.len() == 1 => {
            let id = RowId::new(&ids[0]);
            focus(&grid, &id).await?;
            match grid.delete_one(&id).await? {
                DeleteOutcome::Removed => println!("Deleted {}", id),
                DeleteOutcome::NotPresent => return Err(CliError::NotFound(id)),
                DeleteOutcome::Unmounted => {}
            }
        }

        Command::Delete { ids } => {
            for id in &ids {
                grid.toggle_select(&RowId::new(id)).await;
            }
            let report = grid.delete_selected().await?;
            for id in &report.succeeded {
                println!("Deleted {}", id);
            }
            for (id, e) in &report.failed {
                eprintln!("Failed {}: {}", id, e.user_message());
            }
            if !report.is_success() {
                return Err(CliError::PartialDelete {
                    failed: report.failed.len(),
                    total: ids.len(),
                });
            }
        }
    }

    grid.unmount();
    client.shutdown();
    Ok(())
}

/// Loads the page holding one row by filtering on its id.
async fn focus(grid: &GridController, id: &RowId) -> Result<(), CliError> {
    grid.set_filter("id", id.as_str()).await?;
    if grid.view().row(id).is_none() {
        return Err(CliError::NotFound(id.clone()));
    }
    Ok(())
}

fn print_page(view: &GridView) -> Result<(), CliError> {
    let scope = match view.total_scope {
        TotalScope::Server => "",
        TotalScope::PageLocal => " on this page",
    };
    println!(
        "Page {}/{} - {} rows{}",
        view.pagination.current_page, view.pagination.total_pages, view.apparent_total, scope
    );
    for row in &view.rows {
        println!("{}", serde_json::to_string(&row.row)?);
    }
    Ok(())
}
