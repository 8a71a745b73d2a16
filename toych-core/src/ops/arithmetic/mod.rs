//! Element-wise arithmetic with broadcasting.

pub mod add;
pub mod div;
pub mod mul;
pub mod neg;
pub mod pow;
pub mod sub;

pub use add::{add_op, Add};
pub use div::{div_op, Div};
pub use mul::{mul_op, Mul};
pub use neg::{neg_op, Neg};
pub use pow::{pow_op, Pow};
pub use sub::{sub_op, Sub};
