mod command;
mod config;
mod flow;
mod identity;
mod logging;
mod transport;

#[cfg(test)]
mod testing;

use command::ShellExecutor;
use config::{ConfigError, SignalConfig};
use flow::SignalFlow;
use identity::{IdentityError, IdentityResolver, ImdsConfig, ImdsResolver, StaticResolver};
use std::process::ExitCode;
use std::sync::Arc;
use tcsignal_shared::exit_code;
use tokio_util::sync::CancellationToken;
use transport::SqsPublisher;

use tracing::{debug, error, info, info_span, warn, Instrument};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match SignalConfig::try_from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(e) => return report_config_error(e),
    };

    if let Err(e) = logging::init(config.log_format, config.log_level) {
        eprintln!("Error: failed to initialize logging: {:#}", e);
        return exit(exit_code::INFRA_FAILURE);
    }

    let span = info_span!("tcsignal", component = "tcsignal-aws", signal_id = %config.signal_id);
    let code = run(config).instrument(span).await;
    exit(code)
}

async fn run(config: SignalConfig) -> i32 {
    info!("tcsignal-aws starting, queue: {}", config.queue_url);

    let resolver = match build_resolver(&config) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("Error: {}", e);
            return exit_code::INFRA_FAILURE;
        }
    };

    let flow = SignalFlow::new(
        Arc::new(ShellExecutor::new()),
        resolver,
        Arc::new(SqsPublisher::new()),
    );

    // Overall timeout scope; everything below observes it
    let cancel = CancellationToken::new();
    let timer = {
        let cancel = cancel.clone();
        let overall = config.overall_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(overall).await;
            warn!("Overall timeout of {:?} elapsed", overall);
            cancel.cancel();
        })
    };

    let result = flow.run(&config, &cancel).await;
    timer.abort();

    match result {
        Ok(outcome) => {
            debug!(
                "Signal published: instance_id={} region={:?}",
                outcome.instance_id, outcome.region
            );
            if outcome.should_exit_early {
                warn!("Command failed, {} signal sent", outcome.status);
            }
            outcome.exit_code
        }
        Err(e) => {
            error!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// Only talk to instance metadata when some identity value is still unknown
fn build_resolver(config: &SignalConfig) -> Result<Arc<dyn IdentityResolver>, IdentityError> {
    match (&config.instance_id_override, &config.region_override) {
        (Some(instance_id), Some(region)) => Ok(Arc::new(StaticResolver::new(
            Some(instance_id.clone()),
            Some(region.clone()),
        ))),
        _ => Ok(Arc::new(ImdsResolver::new(ImdsConfig::from_env())?)),
    }
}

fn report_config_error(err: ConfigError) -> ExitCode {
    match &err {
        ConfigError::Parse(e) => {
            let _ = e.print();
        }
        other => eprintln!("Error: {}", other),
    }
    exit(config_exit_code(&err))
}

/// `--help` and `--version` succeed; every other configuration error is fatal
fn config_exit_code(err: &ConfigError) -> i32 {
    if err.is_informational() {
        exit_code::OK
    } else {
        exit_code::INFRA_FAILURE
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(exit_byte(code))
}

fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(exit_code::INFRA_FAILURE as u8)
}
