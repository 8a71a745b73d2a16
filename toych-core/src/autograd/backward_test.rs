use crate::autograd::{not_training, BackwardContext, Function, Operation, Var};
use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use crate::tensor::{scalar, Tensor};
use crate::utils::testing::{check_tensor_near, create_test_param, create_test_tensor};

/// Identity forward whose backward hands back a gradient of the wrong shape.
#[derive(Debug)]
struct BrokenBackward;

impl Operation for BrokenBackward {
    fn name(&self) -> &str {
        "broken_backward"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].clone())
    }

    fn backward(&self, _ctx: &mut BackwardContext<'_>, _grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![Some(scalar(1.0))])
    }
}

/// `x * s` where the scalar `s` is owned by the operation.
#[derive(Debug)]
struct OwnedScale {
    s: Parameter,
}

impl Operation for OwnedScale {
    fn name(&self) -> &str {
        "owned_scale"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].scale(self.s.value().item()?))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let x = ctx.input(0)?.clone();
        let ds = grad_output.mul(&x)?.sum();
        ctx.accumulate(&self.s, ds.reshape(&[1])?)?;
        Ok(vec![Some(grad_output.scale(self.s.value().item()?))])
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![self.s.clone()]
    }
}

fn c(v: f64) -> Var {
    Var::constant(scalar(v))
}

#[test]
fn test_fan_out_through_intermediate_node() -> Result<()> {
    // y = x * x with x = 3p, dy/dp = 18p
    let p = create_test_param(vec![1.0, 2.0], vec![2]);
    let x = Var::param(&p).mul(&c(3.0))?;
    let y = x.mul(&x)?.sum()?;
    let params = y.backward()?;
    assert_eq!(params, vec![p.clone()]);
    check_tensor_near(&p.grad(), &[2], &[18.0, 36.0], 1e-9);
    Ok(())
}

#[test]
fn test_fan_out_law_sums_every_use() -> Result<()> {
    let p = create_test_param(vec![0.5, -1.0, 2.0], vec![3]);
    let x = Var::param(&p);
    let a = x.mul(&c(2.0))?;
    let b = x.exp()?;
    let d = x.pow(2.0)?;
    a.add(&b)?.add(&d)?.sum()?.backward()?;

    let expected: Vec<f64> = p
        .value()
        .data()
        .iter()
        .map(|v| 2.0 + v.exp() + 2.0 * v)
        .collect();
    check_tensor_near(&p.grad(), &[3], &expected, 1e-9);
    Ok(())
}

#[test]
fn test_gradients_accumulate_across_passes() -> Result<()> {
    let p = create_test_param(vec![1.0], vec![1]);
    for _ in 0..3 {
        Var::param(&p).mul(&c(2.0))?.sum()?.backward()?;
    }
    check_tensor_near(&p.grad(), &[1], &[6.0], 1e-12);
    Ok(())
}

#[test]
fn test_second_backward_is_refused() -> Result<()> {
    let p = create_test_param(vec![1.0, 2.0], vec![2]);
    let loss = Var::param(&p).sum()?;
    loss.backward()?;
    assert!(loss.graph().map_or(false, |g| g.is_consumed()));
    assert!(matches!(loss.backward(), Err(ToychError::GraphConsumed)));
    check_tensor_near(&p.grad(), &[2], &[1.0, 1.0], 1e-12);
    Ok(())
}

#[test]
fn test_mutated_parameter_makes_graph_stale() -> Result<()> {
    let p = create_test_param(vec![1.0, 2.0], vec![2]);
    let q = create_test_param(vec![3.0], vec![1]);
    let loss = Var::param(&p).add(&Var::param(&q))?.sum()?;
    p.add_to_value(&create_test_tensor(vec![0.1, 0.1], vec![2]))?;

    let err = loss.backward().unwrap_err();
    assert!(matches!(err, ToychError::StaleGraph { .. }));
    assert!(!p.has_grad());
    assert!(!q.has_grad(), "nothing is committed when any leaf is stale");
    Ok(())
}

#[test]
fn test_failing_backward_leaves_parameters_untouched() -> Result<()> {
    let p = create_test_param(vec![1.0, 2.0], vec![2]);
    let q = create_test_param(vec![3.0, 4.0], vec![2]);
    let broken = Function::new(BrokenBackward).call(&[Var::param(&q)])?;
    let loss = Var::param(&p).mul(&c(2.0))?.add(&broken)?.sum()?;

    let err = loss.backward().unwrap_err();
    assert!(matches!(err, ToychError::ShapeMismatch { .. }));
    assert!(!p.has_grad());
    assert!(!q.has_grad());
    Ok(())
}

#[test]
fn test_backward_with_grad_checks_shape() -> Result<()> {
    let p = create_test_param(vec![1.0, 2.0], vec![2]);
    let y = Var::param(&p).mul(&c(3.0))?;
    assert!(matches!(y.backward(), Err(ToychError::BackwardNonScalar { .. })));
    assert!(matches!(
        y.backward_with_grad(scalar(1.0)),
        Err(ToychError::ShapeMismatch { .. })
    ));

    y.backward_with_grad(create_test_tensor(vec![1.0, -1.0], vec![2]))?;
    check_tensor_near(&p.grad(), &[2], &[3.0, -3.0], 1e-12);
    Ok(())
}

#[test]
fn test_backward_on_constant_and_bare_parameter() -> Result<()> {
    assert!(c(1.0).backward()?.is_empty());

    let p = create_test_param(vec![4.0], vec![1]);
    let params = Var::param(&p).backward()?;
    assert_eq!(params, vec![p.clone()]);
    check_tensor_near(&p.grad(), &[1], &[1.0], 1e-12);
    Ok(())
}

#[test]
fn test_operation_owned_parameter_receives_gradient() -> Result<()> {
    let s = create_test_param(vec![2.0], vec![1]);
    let x = create_test_param(vec![1.0, 3.0], vec![2]);
    let scale = Function::new(OwnedScale { s: s.clone() });

    // Constant input still records, the operation owns a parameter.
    let from_const = scale.call(&[Var::constant(create_test_tensor(vec![1.0, 1.0], vec![2]))])?;
    assert!(from_const.is_variable());
    from_const.sum()?.backward()?;
    check_tensor_near(&s.grad(), &[1], &[2.0], 1e-12);

    s.zero_grad();
    let y = scale.call(&[Var::param(&x)])?;
    let params = y.sum()?.backward()?;
    assert_eq!(params.len(), 2);
    check_tensor_near(&s.grad(), &[1], &[4.0], 1e-12);
    check_tensor_near(&x.grad(), &[2], &[2.0, 2.0], 1e-12);
    Ok(())
}

#[test]
fn test_operation_owned_parameter_goes_stale() -> Result<()> {
    let s = create_test_param(vec![2.0], vec![1]);
    let scale = Function::new(OwnedScale { s: s.clone() });
    let y = scale.call(&[Var::constant(create_test_tensor(vec![1.0], vec![1]))])?;
    s.set_value(create_test_tensor(vec![5.0], vec![1]))?;
    assert!(matches!(y.sum()?.backward(), Err(ToychError::StaleGraph { .. })));
    assert!(!s.has_grad());
    Ok(())
}

#[test]
fn test_not_training_scope_never_touches_gradients() -> Result<()> {
    let p = create_test_param(vec![1.0, 2.0], vec![2]);
    {
        let _guard = not_training();
        let loss = Var::param(&p).mul(&c(2.0))?.sum()?;
        assert!(!loss.is_variable());
        assert!(loss.backward()?.is_empty());
    }
    assert!(!p.has_grad());

    Var::param(&p).mul(&c(2.0))?.sum()?.backward()?;
    check_tensor_near(&p.grad(), &[2], &[2.0, 2.0], 1e-12);
    Ok(())
}
