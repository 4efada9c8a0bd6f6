use serde::{Deserialize, Serialize};

/// Structured data extracted from a receipt image by the OCR vendor.
/// Only the fields of the vendor's output contract are modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptAnalysis {
    pub merchant_name: Option<String>,
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub description: String,
    pub total_price: Option<f64>,
    pub quantity: Option<f64>,
}
