//! Receipt analysis results - pure arithmetic over OCR output.
//!
//! Prices are whole yen. OCR emits line items in print order; a negative
//! price is a discount that belongs to the item printed directly above it,
//! and a printed total that exceeds the item sum means the itemized prices
//! were pre-tax, so a synthetic tax line reconciles the difference.

use crate::entities::ReceiptItem;
use chrono::NaiveDate;
use tracing::warn;

/// One parsed receipt, as produced by the OCR collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReceiptResult {
    pub items: Vec<ReceiptItem>,
    pub total: Option<i64>,
    pub date: Option<NaiveDate>,
    pub store: String,
}

impl ReceiptResult {
    /// Builds a receipt from raw OCR line items, folding discounts, noting
    /// the total on each item, and appending a tax line when needed.
    ///
    /// A discount with no preceding item has nothing to fold into and is
    /// dropped with a warning.
    pub fn from_parts(
        raw_items: Vec<(String, i64)>,
        total: Option<i64>,
        date: Option<NaiveDate>,
        store: String,
    ) -> Self {
        let mut items: Vec<ReceiptItem> = Vec::new();
        for (name, price) in raw_items {
            if price < 0 {
                match items.last_mut() {
                    Some(prev) => {
                        prev.price += price;
                        prev.remarks.push_str(&format!("{price} yen discount. "));
                    }
                    None => warn!("dropping leading discount item {name:?} ({price} yen)"),
                }
            } else {
                items.push(ReceiptItem {
                    name,
                    price,
                    ..ReceiptItem::default()
                });
            }
        }

        let mut receipt = Self {
            items,
            total: None,
            date,
            store,
        };
        receipt.set_total(total);
        receipt.append_tax();
        receipt
    }

    /// Records the printed total and notes it on every item's remarks.
    fn set_total(&mut self, total: Option<i64>) {
        if let Some(total) = total {
            self.total = Some(total);
            for item in &mut self.items {
                item.remarks.push_str(&format!("total {total} yen. "));
            }
        }
    }

    /// Appends a synthetic tax item when the printed total exceeds the item
    /// sum, so the displayed items add up to the printed total.
    fn append_tax(&mut self) {
        let sum = self.item_sum();
        if let Some(total) = self.total {
            if total > sum {
                let mut item = ReceiptItem {
                    name: "tax".to_string(),
                    price: total - sum,
                    ..ReceiptItem::default()
                };
                item.remarks.push_str(&format!("total {total} yen. "));
                self.items.push(item);
            }
        }
    }

    /// Sum of all item prices.
    pub fn item_sum(&self) -> i64 {
        self.items.iter().map(|item| item.price).sum()
    }

    /// A receipt with no items and no total carries nothing usable.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.total.is_none()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_discount_folds_into_preceding_item() {
        let receipt = ReceiptResult::from_parts(
            vec![
                ("Apple".to_string(), 150),
                ("discount".to_string(), -50),
                ("Bread".to_string(), 200),
            ],
            None,
            None,
            "Market".to_string(),
        );

        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.items[0].name, "Apple");
        assert_eq!(receipt.items[0].price, 100);
        assert!(receipt.items[0].remarks.contains("-50 yen discount."));
        assert_eq!(receipt.items[1].price, 200);
        // No negative item survives
        assert!(receipt.items.iter().all(|item| item.price >= 0));
    }

    #[test]
    fn test_leading_discount_is_dropped() {
        let receipt = ReceiptResult::from_parts(
            vec![("discount".to_string(), -30), ("Milk".to_string(), 180)],
            None,
            None,
            String::new(),
        );

        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].name, "Milk");
        assert_eq!(receipt.items[0].price, 180);
    }

    #[test]
    fn test_tax_appended_when_total_exceeds_item_sum() {
        // Apple 150 with a -50 discount folds to 100; the printed total of
        // 150 forces a 50 yen tax item.
        let receipt = ReceiptResult::from_parts(
            vec![("Apple".to_string(), 150), ("discount".to_string(), -50)],
            Some(150),
            Some(date("2024-05-01")),
            "Market".to_string(),
        );

        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.items[0].name, "Apple");
        assert_eq!(receipt.items[0].price, 100);
        assert_eq!(receipt.items[1].name, "tax");
        assert_eq!(receipt.items[1].price, 50);
        assert_eq!(receipt.item_sum(), 150);
        assert_eq!(receipt.total, Some(150));
    }

    #[test]
    fn test_no_tax_when_item_sum_reaches_total() {
        let receipt = ReceiptResult::from_parts(
            vec![("A".to_string(), 100), ("B".to_string(), 50)],
            Some(150),
            None,
            String::new(),
        );
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.item_sum(), 150);

        // Item sum above the total also adds nothing
        let receipt = ReceiptResult::from_parts(
            vec![("A".to_string(), 200)],
            Some(150),
            None,
            String::new(),
        );
        assert_eq!(receipt.items.len(), 1);
    }

    #[test]
    fn test_no_tax_without_total() {
        let receipt =
            ReceiptResult::from_parts(vec![("A".to_string(), 100)], None, None, String::new());
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.total, None);
    }

    #[test]
    fn test_is_empty() {
        assert!(ReceiptResult::default().is_empty());
        assert!(!ReceiptResult::from_parts(vec![], Some(100), None, String::new()).is_empty());
        assert!(
            !ReceiptResult::from_parts(vec![("A".to_string(), 1)], None, None, String::new())
                .is_empty()
        );
    }
}
