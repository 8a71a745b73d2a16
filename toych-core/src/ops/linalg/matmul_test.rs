use crate::autograd::grad_check::check_grad;
use crate::autograd::Var;
use crate::error::ToychError;
use crate::ops::linalg::{matmul_op, transpose_op};
use crate::utils::testing::{check_tensor_near, create_test_param, create_test_tensor};

#[test]
fn test_matmul_forward_and_backward() -> Result<(), ToychError> {
    let a = create_test_param(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
    let b = create_test_param(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], vec![3, 2]);
    let c = matmul_op(&Var::param(&a), &Var::param(&b))?;
    check_tensor_near(c.value(), &[2, 2], &[58.0, 64.0, 139.0, 154.0], 1e-12);

    c.sum()?.backward()?;
    // dA = 1 @ Bᵀ: row sums of B per column of A
    check_tensor_near(&a.grad(), &[2, 3], &[15.0, 19.0, 23.0, 15.0, 19.0, 23.0], 1e-12);
    // dB = Aᵀ @ 1: column sums of A
    check_tensor_near(&b.grad(), &[3, 2], &[5.0, 5.0, 7.0, 7.0, 9.0, 9.0], 1e-12);
    Ok(())
}

#[test]
fn test_matmul_rejects_bad_inner_dims() {
    let a = Var::constant(create_test_tensor(vec![1.0; 6], vec![2, 3]));
    assert!(matches!(
        matmul_op(&a, &a),
        Err(ToychError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_matmul_transpose_grad_check() {
    let a = create_test_param(vec![0.3, -0.2, 0.5, 1.1, -0.7, 0.4], vec![2, 3]);
    let params = [a.clone()];
    check_grad(
        || {
            let x = Var::param(&a);
            matmul_op(&x, &transpose_op(&x)?)?.pow(2.0)?.sum()
        },
        &params,
        1e-6,
        1e-6,
    )
    .unwrap();
}
