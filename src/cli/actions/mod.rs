pub mod auth;
pub mod dna;
pub mod monolith;
pub mod run;
pub mod server;

#[derive(Debug)]
pub enum Action {
    Auth(auth::Args),
    Dna(dna::Args),
    Monolith(monolith::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
