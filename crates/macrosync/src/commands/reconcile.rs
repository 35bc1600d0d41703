//! `reconcile`: run one device through the driver outside the webhook path.

use tracing::debug;

use macrosync_config::Config;

use crate::bootstrap;
use crate::cli::ReconcileArgs;
use crate::commands::print_json;
use crate::error::CliError;

pub async fn handle(args: &ReconcileArgs, config: &Config) -> Result<(), CliError> {
    let services = bootstrap::connect(config).await?;

    if args.dry_run {
        debug!(device_id = args.device_id, "planning without write-back");
        let plan = services.driver.plan(args.device_id).await?;
        return print_json(&plan);
    }

    let outcome = services.driver.reconcile_device(args.device_id).await?;
    print_json(&outcome)
}
