use crate::autograd::Var;
use crate::error::ToychError;
use crate::ops::arithmetic::sub_op;
use crate::utils::testing::{check_tensor_near, create_test_param, create_test_tensor};

#[test]
fn test_sub_forward_and_backward() -> Result<(), ToychError> {
    let a = create_test_param(vec![5.0, 7.0], vec![2]);
    let b = create_test_param(vec![1.0], vec![1]);
    let out = sub_op(&Var::param(&a), &Var::param(&b))?;
    check_tensor_near(out.value(), &[2], &[4.0, 6.0], 1e-12);

    out.sum()?.backward()?;
    check_tensor_near(&a.grad(), &[2], &[1.0, 1.0], 1e-12);
    check_tensor_near(&b.grad(), &[1], &[-2.0], 1e-12);
    Ok(())
}

#[test]
fn test_sub_constant_operand_gets_no_gradient() -> Result<(), ToychError> {
    let a = create_test_param(vec![1.0, 2.0], vec![2]);
    let c = Var::constant(create_test_tensor(vec![3.0, 3.0], vec![2]));
    let params = sub_op(&c, &Var::param(&a))?.sum()?.backward()?;
    assert_eq!(params, vec![a.clone()]);
    check_tensor_near(&a.grad(), &[2], &[-1.0, -1.0], 1e-12);
    Ok(())
}
