use toych_core::autograd::{not_training, Function};
use toych_core::ops::arithmetic::Mul;
use toych_core::ops::linalg::Affine;
use toych_core::utils::testing::check_tensor_near;
use toych_core::{Parameter, Result, ToychError, Var};

mod common;
use common::{create_test_tensor, init_logger};

#[test]
fn test_fan_out_accumulates_every_use() -> Result<()> {
    init_logger();
    let w = Parameter::new(create_test_tensor(vec![1.5, -2.0], vec![2]));
    let x = Var::constant(create_test_tensor(vec![3.0, 4.0], vec![2]));
    let times_w = Function::new(Mul).bind(1, Var::param(&w))?;

    // Three invocations of the same parameter: L = Σ (x·w + x·w + w·w)
    let a = times_w.call(&[x.clone()])?;
    let b = times_w.call(&[x])?;
    let c = Var::param(&w).mul(&Var::param(&w))?;
    a.add(&b)?.add(&c)?.sum()?.backward()?;

    // dL/dw = 2x + 2w
    check_tensor_near(&w.grad(), &[2], &[9.0, 4.0], 1e-12);
    Ok(())
}

#[test]
fn test_bound_affine_over_batches() -> Result<()> {
    let w = Parameter::new(create_test_tensor(vec![1.0, 0.0, 0.0, 1.0], vec![2, 2]));
    let b = Parameter::new(create_test_tensor(vec![0.5, -0.5], vec![2]));
    let layer = Function::new(Affine).bind(1, Var::param(&w))?.bind(2, Var::param(&b))?;
    assert_eq!(layer.arity(), 1);

    for batch in [vec![1.0, 2.0, 3.0, 4.0], vec![0.0, 1.0, 1.0, 0.0]] {
        let y = layer.call(&[Var::constant(create_test_tensor(batch, vec![2, 2]))])?;
        y.sum()?.backward()?;
    }
    // Column sums of the inputs over both batches, and two rows per batch for b.
    check_tensor_near(&w.grad(), &[2, 2], &[5.0, 5.0, 7.0, 7.0], 1e-12);
    check_tensor_near(&b.grad(), &[2], &[4.0, 4.0], 1e-12);
    Ok(())
}

#[test]
fn test_graph_is_single_use() -> Result<()> {
    let w = Parameter::new(create_test_tensor(vec![2.0], vec![1]));
    let loss = Var::param(&w).pow(2.0)?.sum()?;
    loss.backward()?;
    assert!(matches!(loss.backward(), Err(ToychError::GraphConsumed)));
    check_tensor_near(&w.grad(), &[1], &[4.0], 1e-12);
    Ok(())
}

#[test]
fn test_stale_graph_leaves_gradients_untouched() -> Result<()> {
    let w = Parameter::new(create_test_tensor(vec![2.0], vec![1]));
    let loss = Var::param(&w).pow(2.0)?.sum()?;
    w.add_to_value(&create_test_tensor(vec![1.0], vec![1]))?;
    assert!(matches!(loss.backward(), Err(ToychError::StaleGraph { .. })));
    assert!(!w.has_grad());
    Ok(())
}

#[test]
fn test_not_training_scope_never_touches_gradients() -> Result<()> {
    let w = Parameter::new(create_test_tensor(vec![2.0], vec![1]));
    {
        let _guard = not_training();
        let loss = Var::param(&w).pow(2.0)?.sum()?;
        assert!(!loss.is_variable());
        assert!(loss.backward()?.is_empty());
    }
    assert!(!w.has_grad());

    Var::param(&w).pow(2.0)?.sum()?.backward()?;
    assert!(w.has_grad());
    w.zero_grad();
    w.zero_grad();
    assert!(!w.has_grad());
    Ok(())
}
