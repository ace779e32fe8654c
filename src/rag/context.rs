//! Context assembly from retrieved products

use crate::catalog::Product;

/// Assembler for creating bounded context from products
pub struct ContextAssembler {
    max_context_chars: usize,
}

impl ContextAssembler {
    /// Create a new context assembler with a character budget
    pub const fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }

    /// Assemble context from products, in order
    ///
    /// Accumulates whole product summaries and stops before any addition
    /// would exceed the character budget. Partial summaries are never
    /// admitted.
    pub fn assemble(&self, products: &[Product]) -> String {
        let mut context = String::new();
        let mut total_length = 0;

        for product in products {
            let entry = format_product(product);

            if total_length + entry.len() > self.max_context_chars {
                break;
            }

            context.push_str(&entry);
            total_length += entry.len();
        }

        context
    }

    /// Configured character budget
    pub fn max_context_chars(&self) -> usize {
        self.max_context_chars
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(3500)
    }
}

/// Format a single product for context
fn format_product(product: &Product) -> String {
    format!(
        "product_id: {}\nname: {}\n{}\n\n",
        product.product_id, product.product_name, product.product_description
    )
}
