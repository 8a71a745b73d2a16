use super::*;
use crate::nn::layers::Dense;
use crate::ops::linalg::Affine;
use crate::utils::testing::{check_tensor_near, create_test_param, create_test_tensor};

/// `x ↦ 2x + 1` with named weight and bias.
fn affine() -> (Function, Parameter, Parameter) {
    let w = create_test_param(vec![2.0], vec![1, 1]).with_name("w");
    let b = create_test_param(vec![1.0], vec![1]).with_name("b");
    let f = Function::new(Affine)
        .bind(1, Var::param(&w))
        .and_then(|f| f.bind(2, Var::param(&b)))
        .unwrap();
    (f, w, b)
}

#[test]
fn test_layer_as_model() -> Result<()> {
    let weights = create_test_tensor(vec![0.5, -0.5, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![4, 2]);
    let mut model = Layer::new(Dense::from_weights(weights, true)?);
    let y = Model::forward(&mut model, &Var::constant(create_test_tensor(vec![1.0, 2.0, 3.0], vec![1, 3])))?;
    check_tensor_near(y.value(), &[1, 2], &[22.5, 27.5], 1e-12);
    assert!(!model.has_pending_forward(), "graph mode keeps no layer cache");

    let names: Vec<String> = Model::named_parameters(&model).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["weights".to_string()]);
    Ok(())
}

#[test]
fn test_bound_function_as_model() -> Result<()> {
    let (mut f, w, b) = affine();
    let y = Model::forward(&mut f, &Var::constant(create_test_tensor(vec![3.0], vec![1, 1])))?;
    assert_eq!(y.item()?, 7.0);
    assert_eq!(Model::parameters(&f), vec![w.clone(), b.clone()]);

    y.sum()?.backward()?;
    check_tensor_near(&w.grad(), &[1, 1], &[3.0], 1e-12);
    check_tensor_near(&b.grad(), &[1], &[1.0], 1e-12);
    Ok(())
}

#[test]
fn test_compose_chains_and_dedupes_parameters() -> Result<()> {
    let (f, w, b) = affine();
    let mut model = Compose::new().then(f.clone()).then(f);
    assert_eq!(model.len(), 2);

    // y = w·(w·x + b) + b
    let y = model.forward(&Var::constant(create_test_tensor(vec![1.0], vec![1, 1])))?;
    assert_eq!(y.item()?, 7.0);
    assert_eq!(model.parameters(), vec![w.clone(), b.clone()]);
    let names: Vec<String> = model.named_parameters().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["0.w".to_string(), "0.b".to_string()]);

    y.sum()?.backward()?;
    check_tensor_near(&w.grad(), &[1, 1], &[5.0], 1e-12);
    check_tensor_near(&b.grad(), &[1], &[3.0], 1e-12);
    Ok(())
}

#[test]
fn test_compose_with_named_models() -> Result<()> {
    let mut model = Compose::new();
    model.add_model("hidden", Box::new(Layer::new(Dense::new(4).with_seed(1))));
    model.add_model("out", Box::new(Layer::new(Dense::new(1).with_seed(2))));
    let y = model.forward(&Var::constant(create_test_tensor(vec![0.5; 6], vec![2, 3])))?;
    assert_eq!(y.shape(), &[2, 1]);

    let names: Vec<String> = model.named_parameters().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["hidden.weights".to_string(), "out.weights".to_string()]);
    assert_eq!(model.parameters()[0].shape(), vec![4, 4]);
    Ok(())
}

#[test]
fn test_empty_compose_is_identity() -> Result<()> {
    let mut model = Compose::new();
    assert!(model.is_empty());
    let x = Var::constant(create_test_tensor(vec![1.0, 2.0], vec![2]));
    assert_eq!(model.forward(&x)?.value(), x.value());
    assert!(model.parameters().is_empty());
    Ok(())
}
