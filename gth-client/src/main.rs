use anyhow::Result;
use clap::Parser;
use gth_client::{run, Cli};
use gth_protocol::{DialectKind, PairedSquare, SingleSquare};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings();

    // 初始化日志（输出到 stderr，stdout 留给对局）
    let level = settings.log_level.as_directive();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("gth_protocol={}", level).parse()?)
                .add_directive(format!("gth_client={}", level).parse()?),
        )
        .init();

    if cli.save {
        match &cli.config {
            Some(path) => settings.save_to(path)?,
            None => {
                settings.save()?;
            }
        }
    }

    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    let winner = match settings.dialect {
        DialectKind::Single => run(SingleSquare, &settings, input, &mut out).await?,
        DialectKind::Paired => run(PairedSquare, &settings, input, &mut out).await?,
    };

    info!("Winner: {}", winner);
    Ok(())
}
