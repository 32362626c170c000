use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod check;

#[derive(Debug, Parser)]
#[command(name = "patrimonio_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report the state of every snapshot the API serves.
    Check {
        /// Only check this dataset (e.g. btp-yields).
        #[arg(long)]
        dataset: Option<String>,

        /// Exit non-zero when any dataset is stale or served from its fallback.
        #[arg(long)]
        fail_on_stale: bool,
    },

    /// Print sitemap.xml to stdout.
    Sitemap {
        /// Date written into <lastmod> (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        lastmod: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = patrimonio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::Check {
            dataset,
            fail_on_stale,
        } => check::run(&settings, dataset.as_deref(), fail_on_stale).await,
        Command::Sitemap { lastmod } => print_sitemap(&settings, lastmod.as_deref()),
    };

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "worker run failed");
    }
    result
}

fn print_sitemap(
    settings: &patrimonio_core::config::Settings,
    lastmod: Option<&str>,
) -> anyhow::Result<()> {
    let lastmod = match lastmod {
        Some(s) => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")?,
        None => chrono::Utc::now().date_naive(),
    };
    print!(
        "{}",
        patrimonio_core::site::render_sitemap(&settings.site_base_url, lastmod)
    );
    Ok(())
}

fn init_sentry(settings: &patrimonio_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
