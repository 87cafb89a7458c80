use profinet::analyzer::{Analyzer, Policy};
use profinet::capture::Capture;
use profinet::config::{Config, DEFAULT_CHANNEL};
use std::error::Error;
use std::io;
use tracing_subscriber::EnvFilter;

/// decode PROFINET-over-TCP traffic from a pcap or pcapng file
#[derive(argh::FromArgs, Debug)]
struct Args {
    /// path of the capture file to decode
    #[argh(positional)]
    path: String,

    /// channel id every inner block header must carry (default 7)
    #[argh(option, default = "DEFAULT_CHANNEL")]
    channel: u16,

    /// stop at the first malformed frame instead of skipping it
    #[argh(switch)]
    fail_fast: bool,

    /// log skipped frames and other details to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = argh::from_env::<Args>();

    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();

    let policy = if args.fail_fast {
        Policy::FailFast
    } else {
        Policy::Continue
    };

    tracing::info!(path = %args.path, channel = args.channel, ?policy, "opening capture");
    let mut capture = Capture::open(&args.path)?;

    let stdout = io::stdout();
    let mut analyzer = Analyzer::new(Config::new(args.channel), policy, stdout.lock());
    let result = capture.for_each(|record| analyzer.process(record));

    let (summary, _) = analyzer.finish()?;
    tracing::info!(?summary, "capture done");
    result?;

    Ok(())
}
