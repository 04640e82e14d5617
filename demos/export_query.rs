//! Bulk API 2.0 query export
//!
//! Builds an injection-safe SOQL query matching a name fragment, runs it as a bulk query job and
//! writes every result page to its own CSV file under the system temp
//! directory.
//!
//! Needs `SF_INSTANCE_URL` and `SF_ACCESS_TOKEN`.
//!
//! Run with: cargo run --example export_query -- "Acme"

use std::time::Duration;

use sfdc::bulk::{QueryBuilder, QueryJobResource, QueryOptions};
use sfdc::client::SalesforceClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let prefix = std::env::args().nth(1).unwrap_or_else(|| "A".to_string());
    let query = QueryBuilder::new("Account")?
        .select(&["Id", "Name", "Industry"])
        .where_like("Name", &prefix)?;

    let client = SalesforceClient::from_env()?;
    let queries = QueryJobResource::new(client).await?;
    let mut job = queries.create_job(QueryOptions::from_formatter(&query)?).await?;
    println!("Created query job {}", job.id());

    loop {
        let info = job.info().await?;
        if info.job.state.is_terminal() {
            if !info.job.state.is_success() {
                println!("Job ended in {:?}: {:?}", info.job.state, info.error_message);
                return Ok(());
            }
            break;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    let dir = std::env::temp_dir();
    let mut locator: Option<String> = None;
    let mut page = 0;
    loop {
        page += 1;
        let path = dir.join(format!("{}-{page}.csv", job.id()));
        locator = job
            .export_results(&path, Some(50_000), locator.as_deref())
            .await?;
        println!("  wrote {}", path.display());
        if locator.is_none() {
            break;
        }
    }

    job.delete().await?;
    Ok(())
}
