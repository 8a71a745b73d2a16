use crate::autograd::Var;
use crate::error::ToychError;
use crate::ops::arithmetic::neg_op;
use crate::utils::testing::{check_tensor_near, create_test_param};

#[test]
fn test_neg() -> Result<(), ToychError> {
    let a = create_test_param(vec![1.0, -2.0], vec![2]);
    let out = neg_op(&Var::param(&a))?;
    check_tensor_near(out.value(), &[2], &[-1.0, 2.0], 1e-12);
    out.sum()?.backward()?;
    check_tensor_near(&a.grad(), &[2], &[-1.0, -1.0], 1e-12);
    Ok(())
}
