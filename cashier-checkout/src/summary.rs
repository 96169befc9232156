use cashier_core::Order;

/// Item names sorted and comma-joined. Repeated items appear once per line.
pub fn order_summary(order: &Order) -> String {
    let mut names: Vec<&str> = order.items.iter().map(|item| item.product_name.as_str()).collect();
    names.sort_unstable();
    names.join(", ")
}

/// `"<email>: <summary>: <shipping address>"`, the text shown on the charge
/// in the processor dashboard.
pub fn charge_description(buyer_email: &str, summary: &str, shipping_address: Option<&str>) -> String {
    [buyer_email, summary, shipping_address.unwrap_or_default()].join(": ")
}
