use crate::api::endpoints;
use crate::api::transport::{ApiResponse, Transport};
use crate::errors::Result;
use crate::models::{CartItem, WishlistItem};
use serde_json::{Value, json};
use std::sync::Arc;

/// Typed access to the storefront endpoints over any [`Transport`].
///
/// Reads return decoded snapshots; writes return `Ok(())` on success and an
/// [`Error`](crate::errors::Error) classified by [`ApiResponse::ensure_success`].
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Wraps a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Raw `/account-details` response. The session store needs the status
    /// code itself (401 has its own meaning there), so no classification here.
    pub async fn account_details(&self) -> Result<ApiResponse> {
        self.transport.get(endpoints::ACCOUNT_DETAILS).await
    }

    /// Invalidates the server session.
    pub async fn logout(&self) -> Result<()> {
        self.transport
            .get(endpoints::LOGOUT)
            .await?
            .ensure_success("Something went wrong")?;
        Ok(())
    }

    /// Number of items in the cart.
    pub async fn cart_count(&self) -> Result<u32> {
        self.read(endpoints::COUNT_CART, "Failed to fetch cart count")
            .await
            .map(|r| r.count())
    }

    /// Full cart snapshot.
    pub async fn cart_items(&self) -> Result<Vec<CartItem>> {
        self.read(endpoints::FETCH_CART, "Failed to fetch cart items")
            .await?
            .data_list()
    }

    /// Number of items on the wishlist.
    pub async fn wishlist_count(&self) -> Result<u32> {
        self.read(endpoints::COUNT_WISHLIST, "Failed to fetch wishlist count")
            .await
            .map(|r| r.count())
    }

    /// Full wishlist snapshot.
    pub async fn wishlist_items(&self) -> Result<Vec<WishlistItem>> {
        self.read(endpoints::FETCH_WISHLIST, "Failed to fetch wishlist items")
            .await?
            .data_list()
    }

    /// `POST { productId }` to one of the membership endpoints.
    pub async fn post_product(&self, path: &str, product_id: &str, fallback: &str) -> Result<()> {
        self.write(path, &json!({ "productId": product_id }), fallback)
            .await
    }

    /// `POST /update-cart { productId, quantity_present }`.
    pub async fn update_cart(&self, product_id: &str, quantity: u32, fallback: &str) -> Result<()> {
        self.write(
            endpoints::UPDATE_CART,
            &json!({ "productId": product_id, "quantity_present": quantity }),
            fallback,
        )
        .await
    }

    async fn read(&self, path: &str, fallback: &str) -> Result<ApiResponse> {
        self.transport.get(path).await?.ensure_success(fallback)
    }

    async fn write(&self, path: &str, body: &Value, fallback: &str) -> Result<()> {
        self.transport
            .post(path, body)
            .await?
            .ensure_success(fallback)?;
        Ok(())
    }
}
