use clap::Parser;
use fronius_bridge::bridge::Bridge;
use fronius_bridge::settings::{read_settings, Settings};
use fronius_bridge::sink::InfluxSink;
use fronius_bridge::Error;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about = "Polls a Fronius inverter and writes its data to InfluxDB")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "./config/sample_config.yaml")]
    config: PathBuf,
}

fn influx_sink(settings: &Settings) -> Result<InfluxSink, Error> {
    let influx = &settings.influxdb;
    let location = settings.location.to_location()?;

    InfluxSink::new(
        influx.url.clone(),
        influx.org.clone(),
        influx.auth()?,
        influx.verify_ssl,
        location.timezone,
    )
}

async fn run(args: Args) -> Result<(), Error> {
    let settings = read_settings(&args.config)?;
    let sink = influx_sink(&settings)?;
    let mut bridge = Bridge::new(&settings, sink)?;

    let result = tokio::select! {
        result = bridge.run() => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted");
            Ok(())
        }
    };

    bridge.close();
    result
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
