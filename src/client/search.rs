//! Event and attribute search dispatch

use reqwest::Method;

use crate::client::Connection;
use crate::error::Result;
use crate::query::Query;
use crate::response::{self, AttributeResponse, EventResponse, Response};

impl Connection {
    /// Issue a search and decode the envelope matching the query kind.
    ///
    /// A decode failure carries the partially decoded response, see
    /// [`MispError::into_response`](crate::MispError::into_response).
    pub async fn search(&self, query: &Query) -> Result<Response> {
        let url = self.build_url([query.endpoint()])?;
        tracing::debug!(kind = query.kind(), %url, "Sending MISP search");

        let request = self.build_authenticated_request(Method::POST, url, Some(query.prepare()));
        let body = self.execute(request).await?.bytes().await?;

        let response = match query {
            Query::Event(_) => response::decode::<EventResponse>(&body),
            Query::Attribute(_) => response::decode::<AttributeResponse>(&body),
        };

        match &response {
            Ok(r) => tracing::info!(kind = query.kind(), results = r.len(), "MISP search complete"),
            Err(e) => tracing::warn!(
                kind = query.kind(),
                decoded = e.partial_response().map(Response::len).unwrap_or(0),
                error = %e,
                "MISP search returned an unexpected body"
            ),
        }

        response
    }
}
