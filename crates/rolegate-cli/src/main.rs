use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use rolegate_cli::adapter::StoreRepository;
use rolegate_cli::admin::AclAdminCheck;
use rolegate_cli::cli::{Cli, Command};
use rolegate_cli::config::{AppConfig, LogFormat, StoreBackend};
use rolegate_cli::error::ApiError;
use rolegate_cli::registry::EntityTypeRegistry;
use rolegate_cli::service::{CheckInput, DecisionService};
use rolegate_core::auth_config::{InertGrant, detect_inert_grants};
use rolegate_core::entity::{Entity, SubjectId};
use rolegate_storage::{InMemoryRoleStore, PostgresRoleStore, RoleSeed, RoleStore};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    // Output goes to stderr; stdout carries command results.
    let registry = tracing_subscriber::registry().with(filter);

    match config.log.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, client_error = e.is_client_error(), "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, ApiError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    let registry = EntityTypeRegistry::load(&config.entity_types)?;
    tracing::info!(entity_types = registry.len(), "entity types loaded");

    match cli.command {
        Command::Validate => Ok(run_validate(&registry)),
        Command::ListTypes => {
            for object_type in registry.object_types() {
                println!("{object_type}");
            }
            Ok(ExitCode::SUCCESS)
        }
        command => match config.store.backend {
            StoreBackend::Memory => {
                let store = match &config.store.seed_file {
                    Some(path) => InMemoryRoleStore::from_seed(&RoleSeed::load(path)?)?,
                    None => InMemoryRoleStore::new(),
                };
                run_decision(store, &config, registry, command).await
            }
            StoreBackend::Postgres => {
                let store = PostgresRoleStore::connect(
                    &config.database.url,
                    config.database.max_connections,
                    config.to_permission_tables(),
                )
                .await?;
                run_decision(store, &config, registry, command).await
            }
        },
    }
}

fn run_validate(registry: &EntityTypeRegistry) -> ExitCode {
    let mut warnings = 0;
    for config in registry.iter() {
        for inert in detect_inert_grants(config) {
            warnings += 1;
            match inert {
                InertGrant::UnmatchedParentKey { path, key } => {
                    println!("warning: {path}: parent key '{key}' has no parent chain node");
                }
                InertGrant::NestedChainWithoutChildren { path, key } => {
                    println!(
                        "warning: {path}: nested grants under '{key}' but the chain node has no children"
                    );
                }
            }
        }
    }
    println!(
        "{} entity types valid, {warnings} warning(s)",
        registry.len()
    );
    ExitCode::SUCCESS
}

async fn run_decision<S: RoleStore + 'static>(
    store: S,
    config: &AppConfig,
    registry: EntityTypeRegistry,
    command: Command,
) -> Result<ExitCode, ApiError> {
    let service = DecisionService::new(
        Arc::new(StoreRepository::new(Arc::new(store))),
        Arc::new(AclAdminCheck::new(config.acl.clone())),
        Arc::new(registry),
        config.to_engine_config(),
    );

    match command {
        Command::Check(args) => {
            let decision = service
                .check(CheckInput {
                    entity_type: args.target.entity_type.clone(),
                    subject: SubjectId::new(args.target.subject),
                    operation: args.operation,
                    entity: args.target.entity(),
                })
                .await?;
            println!("{}", serde_json::to_string(&decision)?);
            Ok(if decision.is_granted() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::FilterUpdate { target, updates } => {
            let current = target.entity().unwrap_or_default();
            let update: Entity = updates.into_iter().collect();
            match service
                .filter_update(
                    &target.entity_type,
                    SubjectId::new(target.subject),
                    current,
                    &update,
                )
                .await
            {
                Ok(filtered) => {
                    println!("{}", serde_json::to_string(&filtered)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) if e.is_client_error() => {
                    eprintln!("Error: {e}");
                    Ok(ExitCode::FAILURE)
                }
                Err(e) => Err(e.into()),
            }
        }
        Command::Validate | Command::ListTypes => Ok(ExitCode::SUCCESS),
    }
}
