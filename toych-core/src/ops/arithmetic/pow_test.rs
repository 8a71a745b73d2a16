use crate::autograd::grad_check::check_grad;
use crate::autograd::Var;
use crate::error::ToychError;
use crate::ops::arithmetic::pow_op;
use crate::utils::testing::{check_tensor_near, create_test_param};

#[test]
fn test_pow_square() -> Result<(), ToychError> {
    let a = create_test_param(vec![1.0, 2.0, -3.0], vec![3]);
    let out = pow_op(&Var::param(&a), 2.0)?;
    check_tensor_near(out.value(), &[3], &[1.0, 4.0, 9.0], 1e-12);
    out.sum()?.backward()?;
    check_tensor_near(&a.grad(), &[3], &[2.0, 4.0, -6.0], 1e-12);
    Ok(())
}

#[test]
fn test_pow_fractional_grad_check() {
    let a = create_test_param(vec![0.5, 1.5, 4.0], vec![3]);
    let params = [a.clone()];
    check_grad(|| pow_op(&Var::param(&a), 1.5)?.sum(), &params, 1e-6, 1e-6).unwrap();
}
