//! Privilege inspection command.

use crate::cli::{AppContext, PrivilegeArgs};
use crate::error::{CliResult, EXIT_OK, EXIT_PARTIAL};
use crate::output::render_privilege;

pub(crate) async fn handle_privilege(ctx: &AppContext, args: PrivilegeArgs) -> CliResult<i32> {
    let gate = ctx.manager.privilege();
    if args.refresh {
        gate.refresh().await?;
    }
    let allowed = gate.check_allowed().await;
    render_privilege(allowed, ctx.output)?;
    Ok(if allowed { EXIT_OK } else { EXIT_PARTIAL })
}
