//! Create/edit form for a product.

use std::fmt;

use crate::models::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    NameRequired,
    NameTooShort,
    PriceTooLow,
    StockNegative,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::NameRequired => write!(f, "name is required"),
            FormError::NameTooShort => write!(
                f,
                "name must be at least {} characters",
                ProductForm::MIN_NAME_CHARS
            ),
            FormError::PriceTooLow => {
                write!(f, "price must be at least {}", ProductForm::MIN_PRICE)
            }
            FormError::StockNegative => write!(f, "stock cannot be negative"),
        }
    }
}

impl std::error::Error for FormError {}

/// Editable product fields. Defaults to an empty name, price 0 and stock 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

impl ProductForm {
    pub const MIN_NAME_CHARS: usize = 2;
    pub const MIN_PRICE: f64 = 0.01;

    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// All rule violations, in field order.
    pub fn errors(&self) -> Vec<FormError> {
        let mut errors = Vec::new();

        let name_chars = self.name.trim().chars().count();
        if name_chars == 0 {
            errors.push(FormError::NameRequired);
        } else if name_chars < Self::MIN_NAME_CHARS {
            errors.push(FormError::NameTooShort);
        }

        if !self.price.is_finite() || self.price < Self::MIN_PRICE {
            errors.push(FormError::PriceTooLow);
        }

        if self.stock < 0 {
            errors.push(FormError::StockNegative);
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    /// Builds the product to send, without an identifier.
    ///
    /// # Errors
    /// Returns every rule the form currently violates.
    pub fn validate(&self) -> Result<Product, Vec<FormError>> {
        let errors = self.errors();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Product::new(self.name.trim(), self.price, self.stock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, price: f64, stock: i64) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            price,
            stock,
        }
    }

    #[test]
    fn test_valid_form_builds_product() {
        let product = form("Producto Test", 10.0, 5).validate().unwrap();
        assert_eq!(product, Product::new("Producto Test", 10.0, 5));
    }

    #[test]
    fn test_single_char_name_is_invalid() {
        assert_eq!(form("P", 10.0, 5).errors(), vec![FormError::NameTooShort]);
    }

    #[test]
    fn test_blank_name_is_required() {
        assert_eq!(form("   ", 10.0, 5).errors(), vec![FormError::NameRequired]);
    }

    #[test]
    fn test_price_bounds() {
        assert_eq!(form("Pan", 0.0, 5).errors(), vec![FormError::PriceTooLow]);
        assert_eq!(form("Pan", f64::NAN, 5).errors(), vec![FormError::PriceTooLow]);
        assert!(form("Pan", 0.01, 5).is_valid());
    }

    #[test]
    fn test_negative_stock_is_invalid() {
        assert_eq!(form("Pan", 1.0, -1).errors(), vec![FormError::StockNegative]);
        assert!(form("Pan", 1.0, 0).is_valid());
    }

    #[test]
    fn test_default_form_reports_all_rules() {
        assert_eq!(
            ProductForm::default().errors(),
            vec![FormError::NameRequired, FormError::PriceTooLow]
        );
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut f = form("Pan", 3.0, 2);
        f.reset();
        assert_eq!(f, ProductForm::default());
    }
}
