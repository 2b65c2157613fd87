use anyhow::Result;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(clap::Args, Debug, Clone)]
#[group()]
pub struct LoggingArgs {
    /// Enable debug mode.
    #[arg(long, default_value_t = false)]
    debug: bool,
}

impl LoggingArgs {
    pub fn init(&self) -> Result<()> {
        init_logging(self.debug)
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` selects debug output for
/// this tool and the repository library.
pub fn init_logging(debug_mode: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level = if debug_mode {
                LevelFilter::DEBUG
            } else {
                LevelFilter::INFO
            };
            EnvFilter::default()
                .add_directive(LevelFilter::WARN.into())
                .add_directive(format!("mvn_repo={}", level).parse()?)
                .add_directive(format!("maven_repository={}", level).parse()?)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug_mode),
        )
        .init();
    Ok(())
}
