//! reqwest-backed catalog client

use super::decode::{decode_categories, decode_deals, decode_product_page};
use super::CatalogApi;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::models::{Category, CategoryQuery, Deal, ProductPage};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

/// HTTP implementation of [`CatalogApi`]
#[derive(Debug, Clone)]
pub struct HttpCatalogApi {
    client: Client,
    base_url: Url,
}

impl HttpCatalogApi {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(config.base_url()).map_err(|e| CatalogError::InvalidConfig {
            message: format!("api_base_url: {}", e),
        })?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("soundstore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| CatalogError::Http {
                endpoint: base_url.to_string(),
                source,
            })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn url_for(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidConfig {
                message: format!("api_base_url cannot be a base: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, endpoint: &str, url: Url, query: &[(&str, String)]) -> Result<Value> {
        tracing::debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| CatalogError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|source| CatalogError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| CatalogError::Decode {
            endpoint: endpoint.to_string(),
            message: "body is not valid JSON".to_string(),
            source: Some(source),
        })
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn fetch_products(&self, query: &CategoryQuery) -> Result<ProductPage> {
        let endpoint = "/products";
        let url = self.url_for(&["products"])?;
        let body = self.get_json(endpoint, url, &query.to_pairs()).await?;
        decode_product_page(endpoint, body)
    }

    async fn fetch_deals(&self) -> Result<Vec<Deal>> {
        let endpoint = "/products/deals";
        let url = self.url_for(&["products", "deals"])?;
        let body = self.get_json(endpoint, url, &[]).await?;
        decode_deals(endpoint, body)
    }

    async fn fetch_category_products(
        &self,
        category_id: &str,
        query: &CategoryQuery,
    ) -> Result<ProductPage> {
        let endpoint = format!("/categories/{}/products", category_id);
        let url = self.url_for(&["categories", category_id, "products"])?;
        let body = self.get_json(&endpoint, url, &query.to_pairs()).await?;
        decode_product_page(&endpoint, body)
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let endpoint = "/categories";
        let url = self.url_for(&["categories"])?;
        let body = self.get_json(endpoint, url, &[]).await?;
        decode_categories(endpoint, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_keeps_base_path() {
        let config = CatalogConfig {
            api_base_url: "https://shop.example.com/api/".to_string(),
            ..Default::default()
        };
        let api = HttpCatalogApi::new(&config).unwrap();
        let url = api.url_for(&["categories", "in ear", "products"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://shop.example.com/api/categories/in%20ear/products"
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = CatalogConfig {
            api_base_url: String::new(),
            ..Default::default()
        };
        assert!(HttpCatalogApi::new(&config).is_err());
    }
}
