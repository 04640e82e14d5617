//! End-to-end lifecycles against a mock org.
//!
//! The token endpoint and the org share one mock server: the OAuth grant
//! answers with the server's own URL as `instance_url`.

use std::sync::Arc;

use sfdc::auth::{Credentials, OAuthSession, PasswordCredentials};
use sfdc::bulk::{
    BulkV1Resource, ColumnDelimiter, HeaderOptions, IngestOptions, IngestResource, JobState,
    Operation, QueryJobResource, QueryOptions, V1Options,
};
use sfdc::soql::{QueryBuilder, QueryResult, Resource};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn login(server: &MockServer) -> Arc<OAuthSession> {
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "00Dxx!session",
            "instance_url": server.uri(),
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;

    let credentials = Credentials::password(PasswordCredentials {
        url: server.uri(),
        username: "integration@example.com".to_string(),
        password: "hunter2".to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
    })
    .unwrap();

    Arc::new(OAuthSession::new(credentials).unwrap())
}

fn ingest_job(state: &str, delimiter: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "7505e000001",
        "state": state,
        "object": "Account",
        "operation": "upsert",
        "externalIdFieldName": "External_Id__c",
        "columnDelimiter": delimiter,
        "lineEnding": "LF",
        "contentType": "CSV",
        "apiVersion": 62.0
    })
}

#[tokio::test]
async fn ingest_job_full_lifecycle() {
    let server = MockServer::start().await;
    let session = login(&server).await;
    let jobs = "/services/data/v62.0/jobs/ingest";

    Mock::given(method("POST"))
        .and(path(jobs))
        .and(header("Authorization", "Bearer 00Dxx!session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ingest_job("Open", "PIPE")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("{jobs}/7505e000001/batches")))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("{jobs}/7505e000001")))
        .respond_with(ResponseTemplate::new(200).set_body_json(ingest_job("UploadComplete", "PIPE")))
        .expect(1)
        .mount(&server)
        .await;

    let mut complete = ingest_job("JobComplete", "PIPE");
    complete["numberRecordsProcessed"] = 3.into();
    complete["numberRecordsFailed"] = 1.into();

    Mock::given(method("GET"))
        .and(path(format!("{jobs}/7505e000001")))
        .respond_with(ResponseTemplate::new(200).set_body_json(complete))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{jobs}/7505e000001/successfulResults/")))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "sf__Id|sf__Created|External_Id__c|Name\n001A|true|A-1|Acme\n001B|false|A-2|Globex\n",
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{jobs}/7505e000001/failedResults/")))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "sf__Id|sf__Error|External_Id__c|Name\n|DUPLICATE_VALUE:duplicate value found|A-3|Initech\n",
        ))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{jobs}/7505e000001")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ingest = IngestResource::<OAuthSession>::new(session).await.unwrap();
    let mut job = ingest
        .create_job(
            IngestOptions::new("Account", Operation::Upsert)
                .with_external_id_field("External_Id__c")
                .with_column_delimiter(ColumnDelimiter::Pipe),
        )
        .await
        .unwrap();
    assert_eq!(job.delimiter(), ColumnDelimiter::Pipe);

    job.upload("External_Id__c|Name\nA-1|Acme\nA-2|Globex\nA-3|Initech\n")
        .await
        .unwrap();
    assert_eq!(job.close().await.unwrap().state, JobState::UploadComplete);

    let info = job.info().await.unwrap();
    assert!(info.job.state.is_terminal());
    assert_eq!(info.number_records_processed, 3);

    let successful = job.successful_records().await.unwrap();
    assert_eq!(successful.len(), 2);
    assert!(successful[0].created);
    assert_eq!(successful[1].fields().get("Name"), Some("Globex"));

    let failed = job.failed_records().await.unwrap();
    assert_eq!(failed[0].id(), "");
    assert!(failed[0].error.starts_with("DUPLICATE_VALUE"));
    assert_eq!(failed[0].fields().get("External_Id__c"), Some("A-3"));

    job.delete().await.unwrap();
}

#[tokio::test]
async fn query_job_exports_every_page() {
    let server = MockServer::start().await;
    let session = login(&server).await;
    let jobs = "/services/data/v62.0/jobs/query";

    Mock::given(method("POST"))
        .and(path(jobs))
        .and(body_string_contains("\"query\":\"SELECT Id, Name FROM Account\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "750Q000001",
            "state": "UploadComplete",
            "operation": "query",
            "columnDelimiter": "COMMA",
            "lineEnding": "LF"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{jobs}/750Q000001/results")))
        .and(query_param("locator", "cGFnZTI"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Id,Name\n001C,Initech\n"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{jobs}/750Q000001/results")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Sforce-Locator", "cGFnZTI")
                .set_body_string("Id,Name\n001A,Acme\n001B,Globex\n"),
        )
        .mount(&server)
        .await;

    let query = QueryBuilder::new("Account").unwrap().select(&["Id", "Name"]);
    let queries = QueryJobResource::<OAuthSession>::new(session).await.unwrap();
    let job = queries
        .create_job(QueryOptions::from_formatter(&query).unwrap())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut files = Vec::new();
    let mut locator: Option<String> = None;
    loop {
        let file = dir.path().join(format!("page-{}.csv", files.len() + 1));
        locator = job
            .export_results(&file, Some(50_000), locator.as_deref())
            .await
            .unwrap();
        files.push(file);
        if locator.is_none() {
            break;
        }
    }

    assert_eq!(files.len(), 2);
    assert_eq!(
        std::fs::read_to_string(&files[1]).unwrap(),
        "Id,Name\n001C,Initech\n"
    );
}

#[tokio::test]
async fn soql_pages_through_next_records_url() {
    let server = MockServer::start().await;
    let session = login(&server).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v62.0/query/"))
        .and(query_param("q", "SELECT Id, Name FROM Contact WHERE LastName = 'O\\'Brien'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "totalSize": 2,
            "done": false,
            "nextRecordsUrl": "/services/data/v62.0/query/01gxx-1",
            "records": [{"attributes": {"type": "Contact"}, "Id": "003A", "Name": "Pat O'Brien"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/data/v62.0/query/01gxx-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "totalSize": 2,
            "done": true,
            "records": [{"attributes": {"type": "Contact"}, "Id": "003B", "Name": "Sam O'Brien"}]
        })))
        .mount(&server)
        .await;

    let query = QueryBuilder::new("Contact")
        .unwrap()
        .select(&["Id", "Name"])
        .where_eq("LastName", "O'Brien")
        .unwrap();

    let soql = Resource::<OAuthSession>::new(session).await.unwrap();
    let mut page: QueryResult<_> = soql.query(&query, false).await.unwrap();
    let mut names = Vec::new();
    loop {
        names.extend(page.records().iter().filter_map(|r| r.string("Name").map(str::to_string)));
        match page.next().await.unwrap() {
            Some(next) => page = next,
            None => break,
        }
    }

    assert_eq!(names, ["Pat O'Brien", "Sam O'Brien"]);
}

#[tokio::test]
async fn bulk_v1_job_with_batches() {
    let server = MockServer::start().await;
    let session = login(&server).await;
    let jobs = "/services/async/62.0/job";

    let job = |state: &str| {
        serde_json::json!({
            "id": "750V000001",
            "state": state,
            "object": "Contact",
            "operation": "insert",
            "contentType": "CSV"
        })
    };
    let batch = |state: &str| {
        serde_json::json!({"id": "751B000001", "jobId": "750V000001", "state": state})
    };

    Mock::given(method("POST"))
        .and(path(jobs))
        .and(header("Sforce-Enable-PKChunking", "TRUE"))
        .respond_with(ResponseTemplate::new(201).set_body_json(job("Open")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{jobs}/750V000001/batch")))
        .respond_with(ResponseTemplate::new(201).set_body_json(batch("Queued")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{jobs}/750V000001")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("Closed")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{jobs}/750V000001/batch/751B000001")))
        .respond_with(ResponseTemplate::new(200).set_body_json(batch("Completed")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{jobs}/750V000001/batch/751B000001/result")))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"Id\",\"Success\"\n\"003A\",\"true\"\n"))
        .mount(&server)
        .await;

    let v1 = BulkV1Resource::<OAuthSession>::new(session).await.unwrap();
    let mut job = v1
        .create_job(V1Options::new("Contact", Operation::Insert), HeaderOptions::default())
        .await
        .unwrap();

    let submitted = job.create_batch("LastName\nSmith\n").await.unwrap();
    job.close().await.unwrap();

    let finished = job.batch_info(&submitted).await.unwrap();
    assert!(finished.state.is_terminal());

    let file = tempfile::NamedTempFile::new().unwrap();
    let written = job.export_results(file.path(), &finished).await.unwrap();
    assert!(written > 0);
}

#[tokio::test]
async fn failed_login_surfaces_oauth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "authentication failure"
        })))
        .mount(&server)
        .await;

    let credentials = Credentials::password(PasswordCredentials {
        url: server.uri(),
        username: "integration@example.com".to_string(),
        password: "wrong".to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
    })
    .unwrap();

    let session = OAuthSession::new(credentials).unwrap();
    let err = IngestResource::new(session).await.unwrap_err();
    assert!(err.client_error().is_some_and(|e| e.is_auth_error()));
}
