//! Contract pricing: pure functions over minor-unit amounts
//!
//! Every derived figure is recomputed from the current field values on each
//! mutation; nothing downstream ever trusts a client-supplied total.

use super::types::PricingMode;

/// Total contract price.
///
/// `Simple` mode ignores itemized fees (land-type sales typically fold them
/// into the price); `Full` mode adds them on top of the discounted base.
/// Floors at zero.
pub fn total_contract_price(
    pricing_mode: PricingMode,
    base_price: i64,
    discount_amount: i64,
    fees_amount: i64,
) -> i64 {
    let tcp = match pricing_mode {
        PricingMode::Simple => base_price - discount_amount,
        PricingMode::Full => base_price - discount_amount + fees_amount,
    };
    tcp.max(0)
}

/// Balance still due after reservation and downpayment. Floors at zero.
pub fn balance_due(tcp: i64, reservation_amount: i64, downpayment_amount: i64) -> i64 {
    (tcp - reservation_amount - downpayment_amount).max(0)
}

/// Discount implied by a negotiated amount relative to the listing price.
///
/// No published list price means no implied discount.
pub fn implied_discount(list_price: Option<i64>, deal_amount: i64) -> i64 {
    match list_price {
        Some(price) => (price - deal_amount).max(0),
        None => 0,
    }
}
