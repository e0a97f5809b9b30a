mod cli;
mod infra;
mod routes;
mod server;
mod terminal;

use rating_prompt::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
