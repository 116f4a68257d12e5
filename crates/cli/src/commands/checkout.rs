//! Order submission.

use fusion_storefront::checkout::{ContactDetails, SubmitError};
use fusion_storefront::error::AppError;

use super::Shop;

/// Open checkout and submit the cart with the given contact details.
///
/// # Errors
///
/// Returns `Checkout` errors for an empty cart, missing fields or a failed
/// submission. The cart is kept on failure.
#[allow(clippy::print_stdout)]
pub async fn submit(shop: &mut Shop, details: &ContactDetails) -> Result<(), AppError> {
    if !shop.open_checkout() {
        return Err(SubmitError::EmptyCart.into());
    }

    let receipt = shop.submit_checkout(details).await?;
    println!("{}", receipt.user_message());
    println!("Order reference: {} ({} lines)", receipt.order_ref, receipt.rows);
    Ok(())
}
