//! Checkout hand-off: the selected delivery address and the readiness check run
//! before handing over to payment.

use crate::{
    core::storage,
    errors::{Error, Result},
    models::{Address, CartItem, CartTotals},
};
use sea_orm::ConnectionTrait;
use tracing::{info, warn};

/// Selecting the address that is already selected clears the selection.
/// Returns the selection after the toggle.
pub async fn select_address<C>(db: &C, address: &Address) -> Result<Option<Address>>
where
    C: ConnectionTrait,
{
    let current = match storage::selected_address(db).await {
        Ok(current) => current,
        Err(e @ Error::Storage { .. }) => {
            warn!("{e}; replacing the selection");
            None
        }
        Err(e) => return Err(e),
    };
    if current.is_some_and(|c| c.same_selection(address)) {
        storage::remove_value(db, storage::SELECTED_ADDRESS_KEY).await?;
        info!("Address deselected");
        return Ok(None);
    }
    storage::set_selected_address(db, address).await?;
    info!(address = %address.address_name, "Address selected");
    Ok(Some(address.clone()))
}

/// The address chosen for delivery, if any.
pub async fn selected_address<C>(db: &C) -> Result<Option<Address>>
where
    C: ConnectionTrait,
{
    storage::selected_address(db).await
}

/// Everything the payment step needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSummary {
    /// Delivery address
    pub address: Address,
    /// Rendered cart lines
    pub items: Vec<CartItem>,
    /// Totals over `items`
    pub totals: CartTotals,
}

/// Checks that the order can go to payment.
///
/// # Errors
/// [`Error::Checkout`] when the rendered cart is empty or no address is selected.
pub fn prepare(selected: Option<Address>, items: &[CartItem]) -> Result<CheckoutSummary> {
    let items: Vec<CartItem> = items.iter().filter(|i| i.in_stock()).cloned().collect();
    if items.is_empty() {
        return Err(Error::Checkout {
            message: "Your cart is empty.".to_string(),
        });
    }
    let Some(address) = selected else {
        return Err(Error::Checkout {
            message: "Please select an address before proceeding to payment.".to_string(),
        });
    };
    let totals = CartTotals::from_items(&items);
    Ok(CheckoutSummary {
        address,
        items,
        totals,
    })
}
