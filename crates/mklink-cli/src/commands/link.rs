//! Link creation commands.

use mklink_core::{BatchResult, LinkOutcome};

use crate::cli::{AppContext, BatchArgs, FileArgs};
use crate::error::{CliResult, EXIT_CANCELLED, EXIT_OK, EXIT_PARTIAL};
use crate::output::render_batch;

pub(crate) async fn handle_file(ctx: &AppContext, args: FileArgs) -> CliResult<i32> {
    let outcome = ctx
        .manager
        .create_file_link(&args.source, &args.destination, &ctx.cancel)
        .await?;
    let sources = [args.source];
    let outcomes = [outcome];
    render_batch(&sources, &outcomes, ctx.output)?;
    Ok(exit_code(&outcomes, ctx.cancel.is_cancelled()))
}

pub(crate) async fn handle_files(ctx: &AppContext, args: BatchArgs) -> CliResult<i32> {
    let batch = ctx
        .manager
        .create_file_links(&args.sources, &args.destination, &ctx.cancel)
        .await?;
    finish_batch(ctx, &args, &batch)
}

pub(crate) async fn handle_dirs(ctx: &AppContext, args: BatchArgs) -> CliResult<i32> {
    let batch: BatchResult = ctx
        .manager
        .create_directory_links(&args.sources, &args.destination, &ctx.cancel)
        .await?;
    finish_batch(ctx, &args, &batch)
}

fn finish_batch(ctx: &AppContext, args: &BatchArgs, batch: &BatchResult) -> CliResult<i32> {
    render_batch(&args.sources, batch.outcomes(), ctx.output)?;
    Ok(exit_code(batch.outcomes(), ctx.cancel.is_cancelled()))
}

fn exit_code(outcomes: &[LinkOutcome], cancelled: bool) -> i32 {
    if cancelled {
        EXIT_CANCELLED
    } else if outcomes.iter().all(LinkOutcome::is_success) {
        EXIT_OK
    } else {
        EXIT_PARTIAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mklink_core::ErrorCode;

    #[test]
    fn exit_code_reflects_outcomes() {
        let ok = LinkOutcome::succeeded("/dest/a");
        let failed = LinkOutcome::failed_with(ErrorCode::AlreadyExists);
        assert_eq!(exit_code(&[ok.clone()], false), EXIT_OK);
        assert_eq!(exit_code(&[ok.clone(), failed], false), EXIT_PARTIAL);
        assert_eq!(exit_code(&[ok], true), EXIT_CANCELLED);
    }
}
