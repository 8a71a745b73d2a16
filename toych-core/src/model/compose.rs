use super::Model;
use crate::autograd::Var;
use crate::error::Result;
use crate::nn::{ParamId, Parameter};
use std::collections::HashSet;

/// Models applied one after another.
///
/// A model added twice (or two models sharing parameters) contributes its parameters
/// once to [`parameters`](Model::parameters).
#[derive(Debug, Default)]
pub struct Compose {
    models: Vec<Box<dyn Model>>,
    names: Vec<String>,
}

impl Compose {
    pub fn new() -> Self {
        Compose::default()
    }

    /// Appends `model` under `name`, used to prefix its parameter names.
    pub fn add_model(&mut self, name: &str, model: Box<dyn Model>) {
        self.models.push(model);
        self.names.push(name.to_string());
    }

    /// Builder form of [`add_model`](Compose::add_model), named by position.
    pub fn then<M: Model + 'static>(mut self, model: M) -> Self {
        let name = self.models.len().to_string();
        self.add_model(&name, Box::new(model));
        self
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn models(&self) -> &[Box<dyn Model>] {
        &self.models
    }
}

impl Model for Compose {
    /// Feeds `input` through every model in order. An empty composition is the identity.
    fn forward(&mut self, input: &Var) -> Result<Var> {
        let mut current = input.clone();
        for model in &mut self.models {
            current = model.forward(&current)?;
        }
        Ok(current)
    }

    fn parameters(&self) -> Vec<Parameter> {
        let mut seen: HashSet<ParamId> = HashSet::new();
        self.models
            .iter()
            .flat_map(|m| m.parameters())
            .filter(|p| seen.insert(p.id()))
            .collect()
    }

    fn named_parameters(&self) -> Vec<(String, Parameter)> {
        let mut seen: HashSet<ParamId> = HashSet::new();
        let mut params = Vec::new();
        for (name, model) in self.names.iter().zip(&self.models) {
            for (param_name, param) in model.named_parameters() {
                if seen.insert(param.id()) {
                    params.push((format!("{}.{}", name, param_name), param));
                }
            }
        }
        params
    }
}
