// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token pricing table and cost calculation for image generation.
//!
//! gpt-image-1 pricing in USD per million tokens:
//!   text input  = $5.00/MTok
//!   image input = $10.00/MTok
//!   image output = $40.00/MTok
//!
//! Costs are informational estimates shown alongside history entries; they are
//! never used for billing.

use retouch_core::{CostBreakdown, TokenUsage};

/// Per-token-type pricing in USD per million tokens.
#[derive(Debug, Clone, Copy)]
pub struct TokenRates {
    /// Cost per million prompt text tokens.
    pub text_input_per_mtok: f64,
    /// Cost per million source/mask image tokens.
    pub image_input_per_mtok: f64,
    /// Cost per million generated image tokens.
    pub image_output_per_mtok: f64,
}

impl Default for TokenRates {
    fn default() -> Self {
        Self {
            text_input_per_mtok: 5.0,
            image_input_per_mtok: 10.0,
            image_output_per_mtok: 40.0,
        }
    }
}

/// Calculate a cost breakdown for a given token usage and rate table.
///
/// Formula: (tokens / 1_000_000) * price_per_million for each token type,
/// summed into `total_cost`.
pub fn calculate_cost(usage: &TokenUsage, rates: &TokenRates) -> CostBreakdown {
    let text_input_cost =
        (usage.text_input_tokens as f64 / 1_000_000.0) * rates.text_input_per_mtok;
    let image_input_cost =
        (usage.image_input_tokens as f64 / 1_000_000.0) * rates.image_input_per_mtok;
    let image_output_cost =
        (usage.image_output_tokens as f64 / 1_000_000.0) * rates.image_output_per_mtok;

    CostBreakdown {
        text_input_cost,
        image_input_cost,
        image_output_cost,
        total_cost: text_input_cost + image_input_cost + image_output_cost,
    }
}
