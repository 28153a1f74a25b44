use std::{fmt, io, sync::OnceLock};

use application::{args, Args, Config, Service};
use serde::Serialize;
use service::{
    command::{
        Checkout, CreateCart, DeactivateCart, FindOrCreateCart,
        ReplaceCartItems,
    },
    domain::order,
    infra::{postgres, Postgres},
    query, Command as _,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .init();

    if start().await.is_err() {
        std::process::exit(1);
    }
}

async fn start() -> Result<(), ()> {
    let Args { config, command } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        catalog,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let query_timeout = postgres.query_timeout;
    let postgres_config = postgres.into();
    let mut postgres = Postgres::new(&postgres_config, query_timeout)
        .map_err(|e| {
            log::error!("failed to initialize `Postgres` client: {e}");
        })?;

    let report = migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;
    for m in report.applied_migrations() {
        log::info!("applied migration `{m}`");
    }

    let service = Service::new(postgres, catalog.into());

    execute(&service, command).await
}

/// Executes the provided [`args::Command`] and prints its result.
async fn execute(svc: &Service, command: args::Command) -> Result<(), ()> {
    use args::{Cart, Command, Order};

    match command {
        Command::Migrate => Ok(()),
        Command::Cart(Cart::Get { user }) => {
            print(svc.execute(query::cart::Active::of(user)).await)
        }
        Command::Cart(Cart::Create { user }) => {
            print(svc.execute(CreateCart { user_id: user }).await)
        }
        Command::Cart(Cart::FindOrCreate { user }) => {
            print(svc.execute(FindOrCreateCart { user_id: user }).await)
        }
        Command::Cart(Cart::Replace { user, items }) => print(
            svc.execute(ReplaceCartItems {
                user_id: user,
                items,
            })
            .await,
        ),
        Command::Cart(Cart::Deactivate { user }) => {
            print(svc.execute(DeactivateCart { user_id: user }).await)
        }
        Command::Checkout {
            user,
            payment_method,
            address,
            comments,
        } => print(
            svc.execute(Checkout {
                user_id: user,
                payment: order::Payment {
                    method: order::PaymentMethod::new(payment_method),
                },
                delivery: order::Delivery {
                    address: order::Address::new(address),
                },
                comments: order::Comments::new(comments),
            })
            .await,
        ),
        Command::Order(Order::Get { id }) => {
            print(svc.execute(query::order::ById::by(id)).await)
        }
        Command::Order(Order::List { user }) => {
            print(svc.execute(query::order::OfUser::by(user)).await)
        }
    }
}

/// Prints the provided operation result as JSON to stdout.
fn print<T, E>(result: Result<T, E>) -> Result<(), ()>
where
    T: Serialize,
    E: fmt::Display,
{
    let output = result.map_err(|e| {
        log::error!("operation failed: {e}");
    })?;
    let json = serde_json::to_string_pretty(&output).map_err(|e| {
        log::error!("failed to serialize output: {e}");
    })?;
    println!("{json}");
    Ok(())
}
