use crate::autograd::Var;
use crate::error::ToychError;
use crate::ops::reduction::sum_op;
use crate::utils::testing::{check_tensor_near, create_test_param};

#[test]
fn test_sum_to_scalar() -> Result<(), ToychError> {
    let a = create_test_param(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    let s = sum_op(&Var::param(&a))?;
    assert!(s.shape().is_empty());
    assert_eq!(s.item()?, 10.0);
    s.backward()?;
    check_tensor_near(&a.grad(), &[2, 2], &[1.0; 4], 1e-12);
    Ok(())
}
