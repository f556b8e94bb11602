//! Global shopping context - in-memory mirrors of the server-side cart and wishlist.
//!
//! The four `fetch_*` operations are the only writers of the mirrors; each replaces
//! its mirror wholesale on success and leaves it alone on failure. Mutations go
//! through [`mutations`] and are followed by a refetch of the affected collection.
//!
//! Every fetch remembers the context epoch from before its request and drops the
//! response if [`ShopContext::clear`] ran in the meantime, so a slow response from
//! before a logout or resync cannot repopulate the mirrors.

use crate::{
    api::ApiClient,
    core::{
        mutations::{self, Collection, Mutation, MutationOutcome},
        notice::Notifier,
    },
    errors::Result,
    models::{CartItem, CartTotals, QuantityChange, WishlistItem, WishlistQuery},
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, trace, warn};

/// Result of an increment/decrement request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// Already at the bound, or the item is not in the rendered cart; nothing sent
    Unchanged,
    /// `/update-cart` was attempted
    Sent(MutationOutcome),
}

#[derive(Debug, Default)]
struct Mirror {
    cart_items: Vec<CartItem>,
    cart_ids: HashSet<String>,
    cart_count: u32,
    wishlist_items: Vec<WishlistItem>,
    wishlist_ids: HashSet<String>,
    wishlist_count: u32,
}

impl Mirror {
    fn replace_cart_items(&mut self, items: Vec<CartItem>) {
        self.cart_ids = items.iter().map(|i| i.product_id.clone()).collect();
        self.cart_items = items;
    }

    fn replace_wishlist_items(&mut self, items: Vec<WishlistItem>) {
        self.wishlist_ids = items.iter().map(|i| i.product_id.clone()).collect();
        self.wishlist_items = items;
    }
}

/// Shared cart/wishlist state for every consumer of the storefront.
pub struct ShopContext {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    mirror: RwLock<Mirror>,
    epoch: AtomicU64,
}

impl ShopContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            mirror: RwLock::new(Mirror::default()),
            epoch: AtomicU64::new(0),
        }
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Applies a fetch result to the mirror unless the context was cleared since
    /// `epoch`. Returns whether the mirror was updated.
    async fn apply<T>(
        &self,
        what: &str,
        epoch: u64,
        result: Result<T>,
        update: impl FnOnce(&mut Mirror, T),
    ) -> bool {
        let value = match result {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to fetch {what}: {e}");
                return false;
            }
        };
        let mut mirror = self.mirror.write().await;
        if self.epoch() != epoch {
            debug!("Dropping stale {what} response");
            return false;
        }
        update(&mut mirror, value);
        trace!("{what} refreshed");
        true
    }

    /// Refreshes the cart count.
    #[instrument(skip(self))]
    pub async fn fetch_cart_count(&self) -> bool {
        let epoch = self.epoch();
        let result = self.api.cart_count().await;
        self.apply("cart count", epoch, result, |m, count| m.cart_count = count)
            .await
    }

    /// Refreshes the cart items.
    #[instrument(skip(self))]
    pub async fn fetch_cart_items(&self) -> bool {
        let epoch = self.epoch();
        let result = self.api.cart_items().await;
        self.apply("cart items", epoch, result, Mirror::replace_cart_items)
            .await
    }

    /// Refreshes the wishlist count.
    #[instrument(skip(self))]
    pub async fn fetch_wishlist_count(&self) -> bool {
        let epoch = self.epoch();
        let result = self.api.wishlist_count().await;
        self.apply("wishlist count", epoch, result, |m, count| {
            m.wishlist_count = count;
        })
        .await
    }

    /// Refreshes the wishlist items.
    #[instrument(skip(self))]
    pub async fn fetch_wishlist_items(&self) -> bool {
        let epoch = self.epoch();
        let result = self.api.wishlist_items().await;
        self.apply("wishlist items", epoch, result, Mirror::replace_wishlist_items)
            .await
    }

    /// Cart items and count. True when both were refreshed.
    pub async fn refresh_cart(&self) -> bool {
        let (items, count) = tokio::join!(self.fetch_cart_items(), self.fetch_cart_count());
        items && count
    }

    /// Wishlist items and count. True when both were refreshed.
    pub async fn refresh_wishlist(&self) -> bool {
        let (items, count) =
            tokio::join!(self.fetch_wishlist_items(), self.fetch_wishlist_count());
        items && count
    }

    /// Every mirror. True when all four fetches succeeded.
    pub async fn refresh_all(&self) -> bool {
        let (cart, wishlist) = tokio::join!(self.refresh_cart(), self.refresh_wishlist());
        info!(cart, wishlist, "Shopping context refreshed");
        cart && wishlist
    }

    async fn refresh(&self, collection: Collection) -> bool {
        match collection {
            Collection::Cart => self.refresh_cart().await,
            Collection::Wishlist => self.refresh_wishlist().await,
        }
    }

    /// Empties every mirror and invalidates in-flight fetches.
    pub async fn clear(&self) {
        let mut mirror = self.mirror.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *mirror = Mirror::default();
        debug!("Shopping context cleared");
    }

    /// Whether `product_id` is in the current cart snapshot.
    pub async fn is_in_cart(&self, product_id: &str) -> bool {
        self.mirror.read().await.cart_ids.contains(product_id)
    }

    /// Whether `product_id` is in the current wishlist snapshot.
    pub async fn is_in_wishlist(&self, product_id: &str) -> bool {
        self.mirror.read().await.wishlist_ids.contains(product_id)
    }

    /// Cart snapshot, including items that ran out of stock.
    pub async fn cart_items(&self) -> Vec<CartItem> {
        self.mirror.read().await.cart_items.clone()
    }

    /// Cart items to render: those with stock left.
    pub async fn visible_cart_items(&self) -> Vec<CartItem> {
        self.mirror
            .read()
            .await
            .cart_items
            .iter()
            .filter(|item| item.in_stock())
            .cloned()
            .collect()
    }

    /// One cart line.
    pub async fn cart_item(&self, product_id: &str) -> Option<CartItem> {
        self.mirror
            .read()
            .await
            .cart_items
            .iter()
            .find(|item| item.product_id == product_id)
            .cloned()
    }

    /// Totals over the rendered cart.
    pub async fn cart_totals(&self) -> CartTotals {
        CartTotals::from_items(&self.mirror.read().await.cart_items)
    }

    /// Server-reported cart count.
    pub async fn cart_count(&self) -> u32 {
        self.mirror.read().await.cart_count
    }

    /// Wishlist snapshot.
    pub async fn wishlist_items(&self) -> Vec<WishlistItem> {
        self.mirror.read().await.wishlist_items.clone()
    }

    /// Server-reported wishlist count.
    pub async fn wishlist_count(&self) -> u32 {
        self.mirror.read().await.wishlist_count
    }

    /// Wishlist filtered and sorted for the wishlist page.
    pub async fn browse_wishlist(&self, query: &WishlistQuery) -> Vec<WishlistItem> {
        query.apply(&self.mirror.read().await.wishlist_items)
    }

    /// Notifies the user and refetches what the mutation may have changed.
    async fn settle(&self, mutation: Mutation, outcome: &MutationOutcome) {
        if let Some(notice) = outcome.notice(mutation) {
            self.notifier.notify(notice);
        }
        if outcome.reached_server() {
            self.refresh(mutation.collection()).await;
        }
    }

    /// Adds a product to the cart.
    pub async fn add_to_cart(&self, product_id: &str) -> MutationOutcome {
        let outcome = mutations::add_to_cart(&self.api, product_id).await;
        self.settle(Mutation::AddToCart, &outcome).await;
        outcome
    }

    /// Removes a product from the cart.
    pub async fn remove_from_cart(&self, product_id: &str) -> MutationOutcome {
        let outcome = mutations::remove_from_cart(&self.api, product_id).await;
        self.settle(Mutation::RemoveFromCart, &outcome).await;
        outcome
    }

    /// Adds a product to the wishlist.
    pub async fn add_to_wishlist(&self, product_id: &str) -> MutationOutcome {
        let outcome = mutations::add_to_wishlist(&self.api, product_id).await;
        self.settle(Mutation::AddToWishlist, &outcome).await;
        outcome
    }

    /// Removes a product from the wishlist.
    pub async fn remove_from_wishlist(&self, product_id: &str) -> MutationOutcome {
        let outcome = mutations::remove_from_wishlist(&self.api, product_id).await;
        self.settle(Mutation::RemoveFromWishlist, &outcome).await;
        outcome
    }

    /// Adds the product to the wishlist if absent from the snapshot, removes it otherwise.
    pub async fn toggle_wishlist(&self, product_id: &str) -> MutationOutcome {
        if self.is_in_wishlist(product_id).await {
            self.remove_from_wishlist(product_id).await
        } else {
            self.add_to_wishlist(product_id).await
        }
    }

    /// One more unit, unless the item is already at its stock limit.
    pub async fn increment_quantity(&self, product_id: &str) -> QuantityUpdate {
        self.change_quantity(product_id, QuantityChange::Increase)
            .await
    }

    /// One fewer unit, unless the item is already at one.
    pub async fn decrement_quantity(&self, product_id: &str) -> QuantityUpdate {
        self.change_quantity(product_id, QuantityChange::Decrease)
            .await
    }

    async fn change_quantity(&self, product_id: &str, change: QuantityChange) -> QuantityUpdate {
        let next = self
            .cart_item(product_id)
            .await
            .filter(CartItem::in_stock)
            .and_then(|item| item.next_quantity(change));
        let Some(quantity) = next else {
            trace!(product_id, ?change, "quantity at bound; nothing sent");
            return QuantityUpdate::Unchanged;
        };

        let outcome = mutations::update_cart_quantity(&self.api, product_id, quantity).await;
        self.settle(Mutation::UpdateCart, &outcome).await;
        QuantityUpdate::Sent(outcome)
    }
}
