mod cli;
mod evaluate;
mod infra;
mod routes;
mod server;

use cnes_eligibility::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
