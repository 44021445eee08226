//! Platform configuration
//!
//! An explicit settings struct with a named setter per field group. Callers
//! never mutate settings through string field paths.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Mobile-money numbers users deposit to, one per payout channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNumbers {
    pub bkash: String,
    pub nagad: String,
    pub rocket: String,
}

/// Community links shown across the product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramLinks {
    pub group: String,
    pub channel: String,
}

/// Moderator-tunable platform settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Deposit amount that activates account verification
    pub verification_fee: Decimal,
    /// Credited to the referrer's referral wallet at signup
    pub referral_bonus: Decimal,
    /// Default sale price for an approved gmail submission
    pub gmail_sell_price: Decimal,
    /// Maximum gmail submissions per user per calendar day
    pub gmail_daily_limit: u32,
    pub payment_numbers: PaymentNumbers,
    pub telegram_links: TelegramLinks,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            verification_fee: dec!(100),
            referral_bonus: dec!(25),
            gmail_sell_price: dec!(120),
            gmail_daily_limit: 5,
            payment_numbers: PaymentNumbers::default(),
            telegram_links: TelegramLinks::default(),
        }
    }
}

impl AppSettings {
    pub fn set_verification_fee(&mut self, fee: Decimal) {
        self.verification_fee = fee;
    }

    pub fn set_referral_bonus(&mut self, bonus: Decimal) {
        self.referral_bonus = bonus;
    }

    pub fn set_gmail_sell_price(&mut self, price: Decimal) {
        self.gmail_sell_price = price;
    }

    pub fn set_gmail_daily_limit(&mut self, limit: u32) {
        self.gmail_daily_limit = limit;
    }

    pub fn set_payment_numbers(&mut self, numbers: PaymentNumbers) {
        self.payment_numbers = numbers;
    }

    pub fn set_telegram_links(&mut self, links: TelegramLinks) {
        self.telegram_links = links;
    }
}
