//! Bulk API 2.0 ingest walkthrough
//!
//! Upserts a handful of accounts by external id, waits for the job to
//! finish, then prints the successful and failed rows.
//!
//! Needs `SF_USERNAME`, `SF_PASSWORD`, `SF_CLIENT_ID` and `SF_CLIENT_SECRET`
//! (plus `SF_LOGIN_URL` for sandboxes). The org must have an
//! `External_Id__c` text field on Account.
//!
//! Run with: cargo run --example ingest_accounts

use std::time::Duration;

use sfdc::auth::{Credentials, OAuthSession, PasswordCredentials};
use sfdc::bulk::{IngestOptions, IngestResource, Operation};
use tracing_subscriber::EnvFilter;

const ACCOUNTS: &str = "External_Id__c,Name,Industry
ACME-001,Acme Corp,Technology
GLOBEX-001,Globex,Manufacturing
INITECH-001,Initech,Finance
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let credentials = Credentials::password(PasswordCredentials::from_env()?)?;
    let session = OAuthSession::new(credentials)?;
    let ingest = IngestResource::new(session).await?;

    let mut job = ingest
        .create_job(
            IngestOptions::new("Account", Operation::Upsert).with_external_id_field("External_Id__c"),
        )
        .await?;
    println!("Created job {}", job.id());

    job.upload(ACCOUNTS).await?;
    job.close().await?;

    let info = loop {
        let info = job.info().await?;
        println!("  {:?}: {} processed", info.job.state, info.number_records_processed);
        if info.job.state.is_terminal() {
            break info;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    };

    if let Some(message) = &info.error_message {
        println!("Job failed: {message}");
        return Ok(());
    }

    for record in job.successful_records().await? {
        let verb = if record.created { "created" } else { "updated" };
        println!("  {} {verb} ({:?})", record.id(), record.fields().get("Name"));
    }
    for record in job.failed_records().await? {
        println!("  failed {:?}: {}", record.fields().get("External_Id__c"), record.error);
    }

    job.delete().await?;
    Ok(())
}
