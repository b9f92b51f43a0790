mod cli;
mod infra;
mod report;
mod routes;
mod server;

use housing_shortfall::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
