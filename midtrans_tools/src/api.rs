use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{config::MidtransConfig, helpers::basic_auth_header, MidtransApiError, SnapTransaction, SnapTransactionRequest};

#[derive(Clone)]
pub struct MidtransApi {
    config: MidtransConfig,
    client: Arc<Client>,
}

impl MidtransApi {
    pub fn new(config: MidtransConfig) -> Result<Self, MidtransApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let val = HeaderValue::from_str(&basic_auth_header(config.server_key.reveal()))
            .map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MidtransConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, MidtransApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| MidtransApiError::RestRequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MidtransApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MidtransApiError::RestResponseError(e.to_string()))?;
            Err(MidtransApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }

    /// Creates a Snap transaction and returns the hosted payment page details.
    pub async fn create_transaction(
        &self,
        request: &SnapTransactionRequest,
    ) -> Result<SnapTransaction, MidtransApiError> {
        let order_id = request.transaction_details.order_id.as_str();
        debug!("Creating Snap transaction for {order_id} ({})", request.transaction_details.gross_amount);
        let result =
            self.rest_query::<SnapTransaction, &SnapTransactionRequest>(Method::POST, "/snap/v1/transactions", Some(request)).await?;
        if result.reference().is_none() {
            return Err(MidtransApiError::MissingField("transaction_id or token"));
        }
        info!("Snap transaction created for {order_id}");
        Ok(result)
    }
}
