use crate::cli::actions::{Action, auth, dna, monolith};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Auth(args) => auth::execute(args).await,
        Action::Dna(args) => dna::execute(args).await,
        Action::Monolith(args) => monolith::execute(args).await,
    }
}
