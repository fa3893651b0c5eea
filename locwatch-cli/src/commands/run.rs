//! Run command - drive the activation flow and print readings.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use locwatch::broadcast::LocationBroadcast;
use locwatch::bus::{EventBus, LifecycleEvent, LocationEvent};
use locwatch::config::ConfigFile;
use locwatch::connectivity::{ConnectivityProbe, StaticConnectivity};
use locwatch::flow::{FlowConfig, FlowController, FlowHandle};
use locwatch::gate::{Availability, StaticCapability};
use locwatch::permission::PermissionBroker;
use locwatch::session::{AcquisitionConfig, AcquisitionSession, KeepAliveConfig};
use locwatch::sim::{SimConfig, SimulatedPermissions, SimulatedProvider};

use super::common::{ConsoleSink, PermissionChoice};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Delay before the simulated user answers a permission prompt.
const PROMPT_RESPONSE_DELAY: Duration = Duration::from_millis(300);

/// Delay before the console answers Retry on the user's behalf.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Arguments for the run command.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub count: Option<u64>,
    pub lat: f64,
    pub lon: f64,
    pub step_lat: f64,
    pub step_lon: f64,
    pub interval_ms: Option<u64>,
    pub fail_connects: u32,
    pub permission: PermissionChoice,
    pub keep_alive: bool,
    pub assume_online: bool,
    pub retries: u32,
    pub log_stdout: bool,
}

/// Run the command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.log_stdout)?;
    runner.log_startup("run");

    let flow_config = resolve_flow_config(&args, runner.config())?;
    let connectivity: Arc<dyn ConnectivityProbe> = if args.assume_online {
        Arc::new(StaticConnectivity::new(true))
    } else {
        Arc::new(runner.config().connectivity_probe())
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let delivered = runtime.block_on(run_flow(&args, flow_config, connectivity))?;
    eprintln!("Delivered {} reading(s)", delivered);
    Ok(())
}

/// Merge command-line overrides into the file configuration.
fn resolve_flow_config(args: &RunArgs, config: &ConfigFile) -> Result<FlowConfig, CliError> {
    let mut flow = config.flow_config()?;

    if let Some(interval_ms) = args.interval_ms {
        let fastest_ms = config.acquisition.fastest_interval_ms.min(interval_ms);
        flow.acquisition = AcquisitionConfig::builder()
            .intervals_ms(interval_ms, fastest_ms)
            .priority(config.acquisition.priority)
            .build()
            .map_err(|e| CliError::Config(format!("--interval-ms {}: {}", interval_ms, e)))?;
    }

    if args.keep_alive && flow.keep_alive.is_none() {
        flow.keep_alive = Some(
            KeepAliveConfig::default()
                .with_initial_delay(Duration::from_millis(config.keep_alive.initial_delay_ms))
                .with_interval(Duration::from_millis(config.keep_alive.interval_ms))
                .with_connect_timeout(Duration::from_millis(config.keep_alive.connect_timeout_ms)),
        );
    }

    Ok(flow)
}

async fn run_flow(
    args: &RunArgs,
    flow_config: FlowConfig,
    connectivity: Arc<dyn ConnectivityProbe>,
) -> Result<u64, CliError> {
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || signal.cancel())
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let bus = EventBus::new();
    let sim = SimConfig::default()
        .with_start(args.lat, args.lon)
        .with_step(args.step_lat, args.step_lon)
        .with_failed_connects(args.fail_connects);
    let provider = SimulatedProvider::new(sim);
    let session = AcquisitionSession::new(provider, bus.clone());

    let permissions =
        SimulatedPermissions::auto_responding(args.permission.into(), PROMPT_RESPONSE_DELAY);
    let broker = Arc::new(PermissionBroker::new(permissions.clone(), permissions.clone()));
    permissions.attach(&broker);

    let (handle, events) = FlowHandle::channel();
    broker.set_listener(Arc::new(handle.clone()));
    let sink = Arc::new(ConsoleSink::new(
        handle.clone(),
        args.retries,
        RETRY_DELAY,
        shutdown.clone(),
    ));

    let controller = FlowController::new(
        Arc::new(StaticCapability::new(Availability::Available)),
        connectivity,
        broker,
        session.clone(),
        sink,
        flow_config,
    );

    let mut subscription = bus.subscribe(None);
    let flow_task = tokio::spawn(controller.run(events, shutdown.clone()));
    handle.activate();

    let mut delivered = 0u64;
    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!("Shutdown requested");
                break;
            }

            event = subscription.recv() => match event {
                Some(LocationEvent::Location(reading)) => {
                    let json = LocationBroadcast::from_reading(&reading)
                        .to_json()
                        .map_err(|e| CliError::Output(e.to_string()))?;
                    println!("{}", json);
                    delivered += 1;

                    if args.count.is_some_and(|count| delivered >= count) {
                        info!(delivered, "Reading count reached");
                        break;
                    }
                }
                Some(LocationEvent::Lifecycle(event)) => report_lifecycle(&event),
                None => break,
            },
        }
    }

    shutdown.cancel();
    if let Err(e) = flow_task.await {
        warn!(error = %e, "Flow controller task failed");
        return Err(CliError::Runtime(e.to_string()));
    }

    let stats = session.stats();
    info!(
        delivered,
        connect_attempts = stats.connect_attempts,
        failures = stats.failures,
        reassertions = stats.reassertions,
        "Run finished"
    );
    Ok(delivered)
}

fn report_lifecycle(event: &LifecycleEvent) {
    match event {
        LifecycleEvent::Connecting => eprintln!("[session] connecting"),
        LifecycleEvent::Connected => eprintln!("[session] connected"),
        LifecycleEvent::Suspended { cause } => eprintln!("[session] suspended: {}", cause),
        LifecycleEvent::Failed { error } => eprintln!("[session] failed: {}", error),
        LifecycleEvent::Stopped => eprintln!("[session] stopped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_args() -> RunArgs {
        RunArgs {
            count: None,
            lat: 0.0,
            lon: 0.0,
            step_lat: 0.0,
            step_lon: 0.0,
            interval_ms: None,
            fail_connects: 0,
            permission: PermissionChoice::Grant,
            keep_alive: false,
            assume_online: true,
            retries: 0,
            log_stdout: false,
        }
    }

    #[test]
    fn test_interval_override_clamps_fastest() {
        let mut args = create_test_args();
        args.interval_ms = Some(500);

        let flow = resolve_flow_config(&args, &ConfigFile::default()).unwrap();
        assert_eq!(flow.acquisition.update_interval, Duration::from_millis(500));
        assert_eq!(flow.acquisition.fastest_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_keep_alive_flag_uses_file_timings() {
        let mut args = create_test_args();
        args.keep_alive = true;
        let mut config = ConfigFile::default();
        config.keep_alive.interval_ms = 750;

        let flow = resolve_flow_config(&args, &config).unwrap();
        assert_eq!(
            flow.keep_alive.map(|k| k.interval),
            Some(Duration::from_millis(750))
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut args = create_test_args();
        args.interval_ms = Some(0);
        assert!(matches!(
            resolve_flow_config(&args, &ConfigFile::default()),
            Err(CliError::Config(_))
        ));
    }
}
