//! Wishlist commands.

use fusion_storefront::error::AppError;
use fusion_storefront::i18n::keys;

use super::{Shop, WishlistAction, parse_id, parse_key, selection};

/// Run a wishlist action; no action shows the wishlist.
///
/// # Errors
///
/// Returns an error for unknown products or keys.
#[allow(clippy::print_stdout)]
pub fn run(shop: &mut Shop, action: Option<WishlistAction>) -> Result<(), AppError> {
    match action.unwrap_or(WishlistAction::Show) {
        WishlistAction::Show => {}
        WishlistAction::Add { id, variants } => {
            if !shop.add_to_wishlist(&parse_id(&id)?, selection(variants))? {
                println!("Already saved");
            }
        }
        WishlistAction::Remove { key } => {
            let key = parse_key(&key)?;
            if !shop.remove_from_wishlist(&key) {
                return Err(AppError::NotFound(format!("wishlist item {key}")));
            }
        }
        WishlistAction::Move { key } => {
            shop.move_to_cart(&parse_key(&key)?)?;
            println!("Moved to cart ({} items)", shop.cart().item_count());
        }
    }

    let wishlist = shop.wishlist();
    if wishlist.is_empty() {
        let empty = shop.renderer().translator().text(keys::WISHLIST_EMPTY, "Your wishlist is empty");
        println!("{empty}");
    }
    let format = shop.renderer().format();
    for item in wishlist.items() {
        println!("{}\t{}\t{}", item.key(), item.title, format.format(item.unit_price));
    }
    Ok(())
}
