use cartsync::{CartSynchronizer, RemoveOutcome};
use clap::Args;
use tracing::{debug, info};

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Line item to remove
    #[arg(long)]
    line_id: String,
}

pub(crate) async fn run(sync: &CartSynchronizer, args: RemoveArgs) {
    match sync.optimistic_remove(args.line_id.as_str()).await {
        Ok(RemoveOutcome::Removed) => info!(line_id = %args.line_id, "removed from cart"),
        Ok(outcome) => debug!(line_id = %args.line_id, ?outcome, "remove did not go through"),
        Err(error) => debug!("remove settled with error: {error}"),
    }
}
