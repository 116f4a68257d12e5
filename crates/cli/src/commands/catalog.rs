//! Settings and catalog listing.

use super::Shop;

/// Print every loaded setting as `key = value`.
#[allow(clippy::print_stdout)]
pub fn settings(shop: &Shop) {
    for (key, value) in shop.settings().iter() {
        println!("{key} = {value}");
    }
}

/// Print the catalog, filtered by `term` when given.
#[allow(clippy::print_stdout)]
pub async fn products(shop: &Shop, term: Option<&str>) {
    let format = shop.renderer().format();

    let products = match term {
        Some(term) => {
            let outcome = shop.search(term).await;
            if let Some(status) = outcome.status.text() {
                println!("{status}");
            }
            outcome.products
        }
        None => shop.catalog().products().iter().collect(),
    };

    for product in products {
        let price = format.format(product.price);
        println!("{}\t{}\t{price}", product.id, product.title);
    }
}
