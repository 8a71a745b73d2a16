use crate::autograd::Var;
use crate::error::ToychError;
use crate::ops::view::reshape_op;
use crate::utils::testing::{check_tensor_near, create_test_param, create_test_tensor};

#[test]
fn test_reshape_backward_restores_shape() -> Result<(), ToychError> {
    let a = create_test_param(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
    let r = reshape_op(&Var::param(&a), &[3, 2])?;
    assert_eq!(r.shape(), &[3, 2]);

    let weights = Var::constant(create_test_tensor(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![3, 2]));
    r.mul(&weights)?.sum()?.backward()?;
    check_tensor_near(&a.grad(), &[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 1e-12);
    Ok(())
}

#[test]
fn test_reshape_wrong_count() {
    let a = Var::constant(create_test_tensor(vec![1.0; 6], vec![2, 3]));
    assert!(matches!(
        reshape_op(&a, &[4]),
        Err(ToychError::ShapeMismatch { .. })
    ));
}
