use thiserror::Error;

pub const DEFAULT_QUANTITY: i64 = 1;

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub label: String,
    pub quantity: String,
}

impl Default for RecordDraft {
    fn default() -> Self {
        Self {
            label: String::new(),
            quantity: DEFAULT_QUANTITY.to_string(),
        }
    }
}

impl RecordDraft {
    pub fn new(label: impl Into<String>, quantity: impl ToString) -> Self {
        Self {
            label: label.into(),
            quantity: quantity.to_string(),
        }
    }

    pub fn validate(&self) -> Result<ValidRecord, ValidationError> {
        if self.label.trim().is_empty() {
            return Err(ValidationError::BlankLabel);
        }

        let quantity = self
            .quantity
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidQuantity(self.quantity.clone()))?;
        if quantity < 0 {
            return Err(ValidationError::NegativeQuantity(quantity));
        }

        Ok(ValidRecord {
            label: self.label.clone(),
            quantity,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRecord {
    pub label: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("請填寫姓名！")]
    BlankLabel,
    #[error("數量必須是整數：{0}")]
    InvalidQuantity(String),
    #[error("數量不可小於 0：{0}")]
    NegativeQuantity(i64),
}
