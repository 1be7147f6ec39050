//! Money module - fixed-point encoding of amounts, quantities and prices.

mod money_codec;

#[cfg(test)]
mod money_codec_tests;

pub use money_codec::{
    currency_minor_digits, from_minor_units, from_nano_units, to_minor_units, to_nano_units,
    DEFAULT_MINOR_DIGITS, NANO_DIGITS,
};
