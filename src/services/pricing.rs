use crate::entity::{product_variants::Model as VariantModel, products::Model as ProductModel};

/// Tax on a subtotal in basis points, rounded half up to the minor unit.
pub fn tax_for(subtotal: i64, rate_bps: i64) -> i64 {
    (subtotal * rate_bps + 5_000) / 10_000
}

pub fn unit_price(product: &ProductModel, variant: Option<&VariantModel>) -> i64 {
    product.price + variant.map(|v| v.price_adjustment).unwrap_or(0)
}

/// Shipping is charged once per line unless the product ships free.
pub fn line_shipping(product: &ProductModel) -> i64 {
    if product.free_shipping {
        0
    } else {
        product.shipping_cost
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: i64,
    pub shipping: i64,
    pub tax: i64,
    pub total: i64,
}

impl Totals {
    pub fn compute(subtotal: i64, shipping: i64, rate_bps: i64) -> Self {
        let tax = tax_for(subtotal, rate_bps);
        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}
