//! Element-wise transcendental functions.

pub mod exp;
pub mod ln;

pub use exp::{exp_op, Exp};
pub use ln::{ln_op, Ln};
