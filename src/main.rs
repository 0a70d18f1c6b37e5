use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use sway_dispatch::settings::bootstrap;
use sway_dispatch::{
    DaemonConfig, ExecLoader, LogWriter, Resolver, RuntimeError, StdioConnector, Subscribe,
    Supervisor, telemetry,
};

fn main() -> ExitCode {
    if let Err(err) = telemetry::init(telemetry::DEFAULT_FILTER) {
        eprintln!("sway-dispatch: {err}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(DaemonConfig::default())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(label = err.as_label(), error = %err, "daemon stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: DaemonConfig) -> Result<(), RuntimeError> {
    let layout = bootstrap::prepare(&cfg)?;
    info!(root = %layout.root.display(), "config directory ready");

    let resolver = Resolver::new(&layout.plugins, Arc::new(ExecLoader::new()));
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sup = Supervisor::builder(cfg).with_subscribers(subs).build();

    sup.run_from_path(&layout.settings, &resolver, &StdioConnector)
        .await
}
