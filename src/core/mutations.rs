//! Cart and wishlist mutations - stateless requests with outcome classification.
//!
//! Each call issues at most one request and never touches local state; keeping the
//! mirrors in step is the shopping context's job.

use crate::{
    api::{ApiClient, endpoints},
    core::notice::Notice,
    errors::Error,
};
use tracing::{debug, instrument, warn};

/// Which mirror a mutation changes on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Cart items and cart count
    Cart,
    /// Wishlist items and wishlist count
    Wishlist,
}

/// A server-side change to cart or wishlist membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// `/add-to-cart`
    AddToCart,
    /// `/remove-from-cart`
    RemoveFromCart,
    /// `/update-cart`
    UpdateCart,
    /// `/add-to-wishlist`
    AddToWishlist,
    /// `/remove-from-wishlist`
    RemoveFromWishlist,
}

impl Mutation {
    /// Endpoint path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::AddToCart => endpoints::ADD_TO_CART,
            Self::RemoveFromCart => endpoints::REMOVE_FROM_CART,
            Self::UpdateCart => endpoints::UPDATE_CART,
            Self::AddToWishlist => endpoints::ADD_TO_WISHLIST,
            Self::RemoveFromWishlist => endpoints::REMOVE_FROM_WISHLIST,
        }
    }

    /// The collection to refetch afterwards.
    #[must_use]
    pub const fn collection(self) -> Collection {
        match self {
            Self::AddToCart | Self::RemoveFromCart | Self::UpdateCart => Collection::Cart,
            Self::AddToWishlist | Self::RemoveFromWishlist => Collection::Wishlist,
        }
    }

    /// Message used when the server gives none.
    #[must_use]
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::AddToCart => "Error adding product to cart",
            Self::RemoveFromCart => "Error removing product from cart",
            Self::UpdateCart => "Failed to update product quantity",
            Self::AddToWishlist => "Error adding product to wishlist",
            Self::RemoveFromWishlist => "Error removing product from wishlist",
        }
    }

    /// Confirmation shown on success, if the storefront shows one.
    #[must_use]
    pub const fn success_message(self) -> Option<&'static str> {
        match self {
            Self::AddToCart => Some("Item added to cart!"),
            Self::AddToWishlist => Some("Item added to wishlist!"),
            Self::RemoveFromWishlist => Some("Item removed from wishlist!"),
            Self::RemoveFromCart | Self::UpdateCart => None,
        }
    }

    /// Prompt shown when the user has no session.
    #[must_use]
    pub const fn login_prompt(self) -> &'static str {
        match self {
            Self::AddToCart => "Kindly login to add products to your cart",
            Self::RemoveFromCart => "Kindly login to manage your cart",
            Self::UpdateCart => "Kindly login to update your cart",
            Self::AddToWishlist => "Kindly login to add products to your wishlist",
            Self::RemoveFromWishlist => "Kindly login to manage your wishlist",
        }
    }
}

/// How a mutation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// 2xx from the server
    Applied,
    /// 401 from the server
    AuthenticationRequired,
    /// Other non-2xx, or no response at all
    Failed {
        /// Server message or the mutation's fallback text
        message: String,
    },
    /// Invalid input; no request was sent
    Rejected {
        /// What was wrong with the input
        message: String,
    },
}

impl MutationOutcome {
    /// Whether the server may have changed state, so a refetch is worthwhile.
    #[must_use]
    pub fn reached_server(&self) -> bool {
        matches!(self, Self::Applied | Self::Failed { .. })
    }

    /// Whether the mutation was applied.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// The notice to show for this outcome, if any.
    #[must_use]
    pub fn notice(&self, mutation: Mutation) -> Option<Notice> {
        match self {
            Self::Applied => mutation.success_message().map(Notice::success),
            Self::AuthenticationRequired => Some(Notice::warning(mutation.login_prompt())),
            Self::Failed { message } | Self::Rejected { message } => {
                Some(Notice::error(message.clone()))
            }
        }
    }

    fn from_result(mutation: Mutation, result: crate::errors::Result<()>) -> Self {
        match result {
            Ok(()) => Self::Applied,
            Err(Error::AuthenticationRequired) => Self::AuthenticationRequired,
            Err(Error::Api { status, message }) => {
                warn!(status, path = mutation.path(), "{message}");
                Self::Failed { message }
            }
            Err(e) => {
                warn!(path = mutation.path(), "Request failed: {e}");
                Self::Failed {
                    message: mutation.fallback_message().to_string(),
                }
            }
        }
    }
}

fn rejected(error: &Error) -> MutationOutcome {
    MutationOutcome::Rejected {
        message: error.to_string(),
    }
}

async fn post_membership(api: &ApiClient, mutation: Mutation, product_id: &str) -> MutationOutcome {
    if product_id.trim().is_empty() {
        return rejected(&Error::InvalidProductId);
    }
    let result = api
        .post_product(mutation.path(), product_id, mutation.fallback_message())
        .await;
    let outcome = MutationOutcome::from_result(mutation, result);
    debug!(?mutation, product_id, ?outcome, "mutation finished");
    outcome
}

/// `POST /add-to-cart`.
#[instrument(skip(api))]
pub async fn add_to_cart(api: &ApiClient, product_id: &str) -> MutationOutcome {
    post_membership(api, Mutation::AddToCart, product_id).await
}

/// `POST /remove-from-cart`.
#[instrument(skip(api))]
pub async fn remove_from_cart(api: &ApiClient, product_id: &str) -> MutationOutcome {
    post_membership(api, Mutation::RemoveFromCart, product_id).await
}

/// `POST /add-to-wishlist`.
#[instrument(skip(api))]
pub async fn add_to_wishlist(api: &ApiClient, product_id: &str) -> MutationOutcome {
    post_membership(api, Mutation::AddToWishlist, product_id).await
}

/// `POST /remove-from-wishlist`.
#[instrument(skip(api))]
pub async fn remove_from_wishlist(api: &ApiClient, product_id: &str) -> MutationOutcome {
    post_membership(api, Mutation::RemoveFromWishlist, product_id).await
}

/// `POST /update-cart` with an absolute quantity. Stock bounds are checked by the
/// caller against its snapshot and again by the server.
#[instrument(skip(api))]
pub async fn update_cart_quantity(
    api: &ApiClient,
    product_id: &str,
    quantity: u32,
) -> MutationOutcome {
    if product_id.trim().is_empty() {
        return rejected(&Error::InvalidProductId);
    }
    if quantity == 0 {
        return MutationOutcome::Rejected {
            message: "Quantity must be at least 1".to_string(),
        };
    }
    let mutation = Mutation::UpdateCart;
    let result = api
        .update_cart(product_id, quantity, mutation.fallback_message())
        .await;
    MutationOutcome::from_result(mutation, result)
}
