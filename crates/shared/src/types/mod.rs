//! Common types used across the application.

pub mod money;

pub use money::{MAX_MONEY, MONEY_SCALE, fits_money_range, fits_money_scale};
