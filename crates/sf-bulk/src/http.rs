//! Request plumbing shared by the job handles.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sfdc_client::{RequestBuilder, Response, Session};
use tracing::{debug, info};

use crate::error::{Error, ErrorKind, Result};

/// Append an escaped path segment such as a job or batch ID.
pub(crate) fn join(base: &str, segment: &str) -> String {
    format!("{}/{}", base, urlencoding::encode(segment))
}

/// Send a request and decode its JSON body.
pub(crate) async fn fetch_json<S, T>(session: &S, request: RequestBuilder) -> Result<T>
where
    S: Session,
    T: DeserializeOwned,
{
    let response = session.execute(request.accept("application/json")).await?;
    Ok(response.json().await?)
}

#[derive(Serialize)]
struct StateRequest<'a> {
    state: &'a str,
}

/// Ask the server to move a job to `state`; the job record it answers with
/// is the new truth.
pub(crate) async fn request_state<S, T>(session: &S, request: RequestBuilder, state: &str) -> Result<T>
where
    S: Session,
    T: DeserializeOwned,
{
    info!(state, "Requesting job state");
    let request = request.json(&StateRequest { state })?;
    fetch_json(session, request).await
}

/// Delete a job. Only `204 No Content` counts as deleted.
pub(crate) async fn delete<S: Session>(session: &S, url: &str) -> Result<()> {
    let response = session.execute(session.delete(url)?).await?;
    if response.status() != 204 {
        return Err(Error::new(ErrorKind::Job(format!(
            "unable to delete job: status {}",
            response.status()
        ))));
    }
    Ok(())
}

/// GET a CSV result set, requiring `200 OK`.
pub(crate) async fn fetch_csv<S: Session>(session: &S, request: RequestBuilder) -> Result<Response> {
    let response = session.execute(request.accept("text/csv")).await?;
    if response.status() != 200 {
        return Err(Error::new(ErrorKind::Job(format!(
            "unexpected status {} fetching results",
            response.status()
        ))));
    }
    Ok(response)
}

/// Require `201 Created` from an upload or batch submission.
pub(crate) fn expect_created(response: &Response) -> Result<()> {
    if response.status() != 201 {
        return Err(Error::new(ErrorKind::Upload(format!(
            "expected status 201, got {}",
            response.status()
        ))));
    }
    Ok(())
}

/// Stream a response body into a new file at `path`, byte for byte.
pub(crate) async fn export(response: Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let written = response.write_to(&mut file).await?;
    debug!(path = %path.display(), bytes = written, "Exported results");
    Ok(written)
}
