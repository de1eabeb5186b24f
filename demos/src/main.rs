use std::error::Error;
use std::io;

use clap::Parser;
use fw_demos::{Demo, DemoOptions};
use fw_qf::{FaultPolicy, FwConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the FW demo component tree on the hosted kernel")]
struct Opts {
    /// Simulated time to run before shutting down
    #[arg(long, default_value_t = 5000, value_name = "MS")]
    run_ms: u32,

    #[arg(long, default_value_t = 10, value_name = "MS")]
    ms_per_tick: u32,

    #[arg(long, default_value_t = 1000, value_name = "MS")]
    heartbeat_ms: u32,

    /// Framework trace verbosity, 0 (off) to 5 (trace)
    #[arg(long, default_value_t = 3)]
    verbosity: u8,

    /// Record faults and keep running instead of panicking
    #[arg(long)]
    record_faults: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let opts = Opts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = FwConfig::builder()
        .name("FW-DEMO")
        .ms_per_tick(opts.ms_per_tick)
        .verbosity(opts.verbosity)
        .fault_policy(if opts.record_faults {
            FaultPolicy::Record
        } else {
            FaultPolicy::Panic
        })
        .build();
    let options = DemoOptions {
        heartbeat_ms: opts.heartbeat_ms,
        ..DemoOptions::default()
    };

    let demo = Demo::new(config, &options, Box::new(io::stdout()))?;
    info!("running for {} ms", opts.run_ms);
    demo.run_for(opts.run_ms);
    demo.shutdown()?;

    for (name, state) in demo.states() {
        info!("{:<14} {}", name, state);
    }
    let faults = demo.kernel().framework().faults();
    if !faults.is_empty() {
        for fault in &faults {
            tracing::error!("{}", fault);
        }
        return Err(format!("{} faults recorded", faults.len()).into());
    }
    Ok(())
}
