use super::*;
use crate::autograd::{BackwardContext, Function, Operation};
use crate::tensor::Tensor;
use crate::utils::testing::create_test_param;

/// `x^2` with a deliberately wrong derivative (`x` instead of `2x`).
#[derive(Debug)]
struct WrongSquare;

impl Operation for WrongSquare {
    fn name(&self) -> &str {
        "wrong_square"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> crate::error::Result<Tensor> {
        Ok(inputs[0].map(|x| x * x))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> crate::error::Result<Vec<Option<Tensor>>> {
        Ok(vec![Some(grad_output.mul(ctx.input(0)?)?)])
    }
}

#[test]
fn test_correct_gradients_pass() {
    let p = create_test_param(vec![0.3, -0.7, 1.2], vec![3]);
    let params = [p.clone()];
    check_grad(|| Var::param(&p).pow(3.0)?.sum(), &params, 1e-6, 1e-6).unwrap();
    assert!(p.has_grad(), "analytic gradient is left in place");
    assert_eq!(p.value().data(), &[0.3, -0.7, 1.2], "values are restored");
}

#[test]
fn test_wrong_gradient_is_reported() {
    let p = create_test_param(vec![1.0, 2.0], vec![2]);
    let square = Function::new(WrongSquare);
    let params = [p.clone()];
    let err = check_grad(
        || square.call(&[Var::param(&p)])?.sum(),
        &params,
        1e-6,
        1e-4,
    )
    .unwrap_err();
    match err {
        GradCheckError::GradientMismatch {
            param_index,
            element_index,
            analytical,
            numerical,
            ..
        } => {
            assert_eq!((param_index, element_index), (0, 0));
            approx::assert_abs_diff_eq!(analytical, 1.0, epsilon = 1e-9);
            approx::assert_abs_diff_eq!(numerical, 2.0, epsilon = 1e-4);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_non_scalar_loss_is_rejected() {
    let p = create_test_param(vec![1.0, 2.0], vec![2]);
    let params = [p.clone()];
    let err = check_grad(|| Var::param(&p).exp(), &params, 1e-6, 1e-6).unwrap_err();
    assert_eq!(err, GradCheckError::NonScalarLoss(vec![2]));
}
