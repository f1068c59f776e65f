//! # ADAS Control Supervisor binary
//!
//! Wires the supervisor to the simulated vehicle adapter and runs the
//! 100 Hz loop. Production deployments replace the adapter with the
//! platform bus daemon; this binary is the bring-up/simulation entry.

use std::error::Error;
use std::path::PathBuf;

use adas_supervisor::config::SupervisorConfig;
use adas_supervisor::cruise::NoRoadLimits;
use adas_supervisor::cycle::rt_setup;
use adas_supervisor::params::ParamStore;
use adas_supervisor::supervisor::Supervisor;
use adas_supervisor::vehicle::SimVehicle;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "ADAS 100 Hz control supervisor")]
struct Args {
    /// Persistent parameter directory.
    #[arg(long, default_value = "/var/lib/adas/params")]
    params_dir: PathBuf,

    /// Live tuning file (TOML); missing file means defaults.
    #[arg(long, default_value = "/etc/adas/tuning.toml")]
    tuning: PathBuf,

    /// CPU core to pin the loop to (rt builds).
    #[arg(long, default_value_t = 3)]
    rt_core: usize,

    /// SCHED_FIFO priority (rt builds).
    #[arg(long, default_value_t = 53)]
    rt_priority: i32,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    info!(?args.params_dir, ?args.tuning, "ADAS supervisor starting");

    rt_setup(args.rt_core, args.rt_priority)?;

    let params = ParamStore::open(&args.params_dir)?;
    let cfg = SupervisorConfig::load(&params, &args.tuning)?;

    let (car, _handle) = SimVehicle::new(Default::default());
    let (mut supervisor, _senders) =
        Supervisor::new(Box::new(car), Box::new(NoRoadLimits), params, cfg)?;

    info!("entering control loop");
    supervisor.run()
}
