//! Store API cart gateway.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use cartsync::{AddLineItem, CartGateway, CartSnapshot, GatewayError};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    config::{ConfigError, GatewayConfig},
    gateway::dto::{AddLineItemBody, CartResponse, CreateCartBody, ErrorBody},
};

pub mod dto;

pub use dto::CartConversionError;

const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";
const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Errors raised by the HTTP cart gateway.
#[derive(Debug, Error)]
pub enum HttpGatewayError {
    /// Invalid gateway settings.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store API answered with a non-2xx status.
    #[error("{message}")]
    Status {
        /// HTTP status code
        status: u16,

        /// Message from the error body, or the raw body
        message: String,
    },

    /// The store API returned a cart that cannot be represented.
    #[error("invalid cart: {0}")]
    InvalidCart(#[from] CartConversionError),
}

impl From<HttpGatewayError> for GatewayError {
    fn from(error: HttpGatewayError) -> Self {
        match error {
            HttpGatewayError::Http(source) if source.is_decode() => {
                Self::UnexpectedResponse(source.to_string())
            }
            HttpGatewayError::Http(source) => Self::Unavailable(source.to_string()),
            HttpGatewayError::Status { status, message } => Self::Rejected {
                status: Some(status),
                message,
            },
            HttpGatewayError::InvalidCart(source) => Self::UnexpectedResponse(source.to_string()),
            HttpGatewayError::Config(source) => Self::Unavailable(source.to_string()),
        }
    }
}

/// Cart gateway backed by the store REST API.
///
/// Remembers the cart id it operates on; when none is configured the first
/// add creates a cart.
#[derive(Debug)]
pub struct HttpCartGateway {
    base_url: Url,
    publishable_key: Option<String>,
    http: Client,
    cart_id: Mutex<Option<String>>,
}

impl HttpCartGateway {
    /// Create a gateway from connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid URL or timeout, or if the HTTP client
    /// cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, HttpGatewayError> {
        let raw = config.base_url()?;

        let base_url = Url::parse(raw)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::InvalidApiUrl(config.api_url.clone()))?;

        let http = Client::builder().timeout(config.timeout()?).build()?;

        Ok(Self {
            base_url,
            publishable_key: config.publishable_key.clone(),
            http,
            cart_id: Mutex::new(config.cart_id.clone().filter(|id| !id.is_empty())),
        })
    }

    /// Cart this gateway currently operates on.
    pub fn cart_id(&self) -> Option<String> {
        self.cart_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn remember_cart(&self, cart_id: &str) {
        *self.cart_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(cart_id.to_string());
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();

        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let request = self.http.request(method, self.url(segments));

        match &self.publishable_key {
            Some(key) => request.header(PUBLISHABLE_KEY_HEADER, key),
            None => request,
        }
    }

    /// Fetch the remembered cart; `None` without a cart id or on 404.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or an invalid cart.
    pub async fn retrieve_cart(&self) -> Result<Option<CartSnapshot>, HttpGatewayError> {
        let Some(cart_id) = self.cart_id() else {
            debug!("no cart id, nothing to fetch");

            return Ok(None);
        };

        let response = self
            .request(Method::GET, &["store", "carts", cart_id.as_str()])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%cart_id, "cart not found");

            return Ok(None);
        }

        read_cart(response).await.map(Some)
    }

    async fn create_cart(&self, country_code: &str) -> Result<String, HttpGatewayError> {
        let response = self
            .request(Method::POST, &["store", "carts"])
            .json(&CreateCartBody { country_code })
            .send()
            .await?;

        let cart = read_cart(response).await?;

        debug!(cart_id = %cart.id, "created cart");
        self.remember_cart(&cart.id);

        Ok(cart.id)
    }

    /// Add a line item, creating the cart first if none is known.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or an invalid cart.
    pub async fn create_line_item(
        &self,
        request: &AddLineItem,
    ) -> Result<CartSnapshot, HttpGatewayError> {
        let cart_id = match self.cart_id() {
            Some(cart_id) => cart_id,
            None => self.create_cart(&request.country_code).await?,
        };

        let response = self
            .request(Method::POST, &["store", "carts", cart_id.as_str(), "line-items"])
            .header(IDEMPOTENCY_KEY_HEADER, request.idempotency_key.as_str())
            .json(&AddLineItemBody {
                variant_id: &request.variant_id,
                quantity: request.quantity,
                metadata: &request.metadata,
            })
            .send()
            .await?;

        read_cart(response).await
    }

    /// Delete a line item; a line that is already gone counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status other than 404.
    pub async fn delete_line_item(&self, line_id: &str) -> Result<(), HttpGatewayError> {
        let Some(cart_id) = self.cart_id() else {
            debug!(%line_id, "no cart id, nothing to remove");

            return Ok(());
        };

        let response = self
            .request(
                Method::DELETE,
                &["store", "carts", cart_id.as_str(), "line-items", line_id],
            )
            .send()
            .await?;

        let status = response.status();

        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Err(rejection(response).await)
    }
}

async fn read_cart(response: Response) -> Result<CartSnapshot, HttpGatewayError> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }

    let body: CartResponse = response.json().await?;

    Ok(CartSnapshot::try_from(body.cart)?)
}

async fn rejection(response: Response) -> HttpGatewayError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                format!("request failed with status {status}")
            } else {
                text
            }
        });

    HttpGatewayError::Status {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CartGateway for HttpCartGateway {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Option<CartSnapshot>, GatewayError> {
        Ok(self.retrieve_cart().await?)
    }

    #[instrument(skip_all, fields(variant_id = %request.variant_id))]
    async fn add_line_item(
        &self,
        request: AddLineItem,
    ) -> Result<Option<CartSnapshot>, GatewayError> {
        Ok(Some(self.create_line_item(&request).await?))
    }

    #[instrument(skip(self))]
    async fn remove_line_item(&self, line_id: String) -> Result<(), GatewayError> {
        Ok(self.delete_line_item(&line_id).await?)
    }
}
