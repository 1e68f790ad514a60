use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use leavekeeper::database::{
    init_database,
    repositories::{EmployeeRepository, LeaveRepository},
};
use leavekeeper::services::LogNotifier;
use leavekeeper::shared::ApiResponse;
use leavekeeper::{AppError, Config, LeaveService};

const USAGE: &str = "usage:
  leavekeeper migrate
  leavekeeper balance <employee> [year]
  leavekeeper pending <manager>
  leavekeeper bank-holiday <organization-id> <country> <yyyy-mm-dd> <description>";

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    log::info!("Configuration loaded (environment: {})", config.environment);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let pool = init_database(&config).await?;
    let service = LeaveService::new(
        EmployeeRepository::new(pool.clone()),
        LeaveRepository::new(pool),
        LogNotifier::new(config.notification_sender.clone()),
        &config,
    );

    match (command.as_str(), &args[1..]) {
        ("migrate", []) => {}
        ("balance", [employee, rest @ ..]) => {
            let year = match rest.first() {
                Some(year) => year.parse()?,
                None => Utc::now().year(),
            };
            report(service.balance_summary(employee, year).await)?;
        }
        ("pending", [manager]) => {
            report(service.pending_reviews(manager).await)?;
        }
        ("bank-holiday", [organization_id, country, date, description]) => {
            let organization_id: Uuid = organization_id.parse()?;
            let date: NaiveDate = date.parse()?;
            report(
                service
                    .record_bank_holiday(organization_id, country, date, description)
                    .await,
            )?;
        }
        _ => return Err(anyhow!("unrecognized arguments\n{}", USAGE)),
    }

    Ok(())
}

/// Prints the outcome in the `ApiResponse` envelope.
fn report<T: Serialize>(result: Result<T, AppError>) -> Result<()> {
    match result {
        Ok(data) => {
            println!("{}", serde_json::to_string_pretty(&ApiResponse::success(data))?);
            Ok(())
        }
        Err(err) => {
            if err.is_client_error() {
                log::warn!("Request refused: {}", err);
            } else {
                log::error!("Request failed: {}", err);
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&ApiResponse::<()>::error(&err.to_string()))?
            );
            Err(err.into())
        }
    }
}
