//! Cart commands.

use fusion_storefront::cart::QuantityChange;
use fusion_storefront::error::AppError;
use fusion_storefront::i18n::keys;

use super::{CartAction, Shop, parse_id, parse_key, selection};

/// Run a cart action; no action shows the cart.
///
/// # Errors
///
/// Returns an error for unknown products, malformed keys or render failures.
#[allow(clippy::print_stdout)]
pub fn run(shop: &mut Shop, action: Option<CartAction>) -> Result<(), AppError> {
    match action.unwrap_or(CartAction::Show) {
        CartAction::Show => show(shop),
        CartAction::Add { id, qty, variants } => {
            let key = shop.add_to_cart(&parse_id(&id)?, qty, selection(variants))?;
            println!("Added {key}");
            show(shop);
        }
        CartAction::Inc { key } => {
            let change = apply_delta(shop, &key, 1)?;
            report(shop, change);
        }
        CartAction::Dec { key } => {
            let change = apply_delta(shop, &key, -1)?;
            report(shop, change);
        }
        CartAction::Remove { key } => {
            let key = parse_key(&key)?;
            if !shop.remove_from_cart(&key) {
                return Err(AppError::NotFound(format!("cart line {key}")));
            }
            show(shop);
        }
        CartAction::Clear => {
            shop.clear_cart();
            println!("Cart cleared");
        }
        CartAction::Html => println!("{}", shop.render_cart()?),
    }
    Ok(())
}

fn apply_delta(shop: &mut Shop, raw: &str, delta: i64) -> Result<QuantityChange, AppError> {
    let key = parse_key(raw)?;
    match shop.change_quantity(&key, delta) {
        QuantityChange::Missing => Err(AppError::NotFound(format!("cart line {key}"))),
        change => Ok(change),
    }
}

#[allow(clippy::print_stdout)]
fn report(shop: &Shop, change: QuantityChange) {
    match change {
        QuantityChange::Updated(qty) => println!("Quantity now {qty}"),
        QuantityChange::Removed => println!("Line removed"),
        QuantityChange::Missing => {}
    }
    show(shop);
}

#[allow(clippy::print_stdout)]
fn show(shop: &Shop) {
    let cart = shop.cart();
    if cart.is_empty() {
        let empty = shop.renderer().translator().text(keys::CART_EMPTY, "Your cart is empty");
        println!("{empty}");
        return;
    }

    let format = shop.renderer().format();
    for item in cart.items() {
        let label = item.variants.label();
        println!(
            "{}\t{}\t{}\tx{}\t{}",
            item.key(),
            item.title,
            if label.is_empty() { "-" } else { label.as_str() },
            item.quantity(),
            format.format(item.line_total()),
        );
    }
    println!("Total: {} ({} items)", format.format(cart.total()), cart.item_count());
}
