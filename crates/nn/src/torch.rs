use std::path::Path;

use gridzero_core::{GameRules, GameState, ENCODED_PLANES};
use gridzero_mcts::{softmax_legal, Evaluation, Evaluator, MctsError};
use tch::{CModule, Device, IValue, Kind, Tensor};

use crate::error::{NnError, Result};

/// Traced policy-value network returning `(policy_logits, value)`
pub struct NnModel {
    module: CModule,
    device: Device,
}

impl NnModel {
    pub fn load<P: AsRef<Path>>(path: P, device: Device) -> Result<Self> {
        let module = CModule::load_on_device(path, device)?;
        Ok(Self { module, device })
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        let input_ivalue = IValue::Tensor(x.shallow_clone());
        let iv = self.module.forward_is(&[input_ivalue])?;

        match iv {
            IValue::Tuple(elems) => match <[IValue; 2]>::try_from(elems) {
                Ok([policy_iv, value_iv]) => {
                    Ok((tensor_from_ivalue(policy_iv)?, tensor_from_ivalue(value_iv)?))
                }
                Err(elems) => Err(NnError::BadOutput(format!(
                    "Expected tuple of length 2, got {}",
                    elems.len()
                ))),
            },
            _ => Err(NnError::BadOutput(
                "Expected TorchScript output to be a tuple".into(),
            )),
        }
    }
}

fn tensor_from_ivalue(iv: IValue) -> Result<Tensor> {
    match iv {
        IValue::Tensor(t) => Ok(t),
        other => Err(NnError::BadOutput(format!("Expected Tensor, got {other:?}"))),
    }
}

/// Leaf evaluator backed by a TorchScript network
pub struct TorchEvaluator {
    model: NnModel,
}

impl TorchEvaluator {
    pub fn new(model: NnModel) -> Self {
        Self { model }
    }

    fn run(&self, game: &dyn GameRules, state: &GameState) -> Result<Evaluation> {
        let (rows, cols) = game.board_shape();
        let planes = game.encode(state);

        // [1, planes, rows, cols] on the model's device
        let input = Tensor::from_slice(&planes)
            .view([1, ENCODED_PLANES as i64, rows as i64, cols as i64])
            .to_device(self.model.device());

        let (policy, value) = tch::no_grad(|| self.model.forward(&input))?;
        let logits: Vec<f32> = tensor_to_vec(&policy.squeeze().to_kind(Kind::Float))?;
        let value = tensor_to_scalar(&value.to_kind(Kind::Float))?;

        if logits.len() != game.action_size() {
            return Err(NnError::BadOutput(format!(
                "Expected policy of length {}, got {}",
                game.action_size(),
                logits.len()
            )));
        }

        let mask = game
            .action_mask(state)
            .map_err(|e| NnError::BadOutput(e.to_string()))?;
        Ok(Evaluation {
            priors: softmax_legal(&logits, &mask),
            value,
        })
    }
}

impl Evaluator for TorchEvaluator {
    fn evaluate(
        &self,
        game: &dyn GameRules,
        state: &GameState,
    ) -> gridzero_mcts::Result<Evaluation> {
        self.run(game, state)
            .map_err(|e| MctsError::EvaluationFailed(e.to_string()))
    }
}

fn tensor_to_vec(tensor: &Tensor) -> Result<Vec<f32>> {
    let size = tensor.size();
    if size.len() != 1 {
        return Err(NnError::BadOutput(format!(
            "Expected 1D tensor, got shape {size:?}"
        )));
    }

    let len = size[0] as usize;
    let mut vec = vec![0.0f32; len];
    tensor.to_device(Device::Cpu).copy_data(&mut vec, len);
    Ok(vec)
}

fn tensor_to_scalar(tensor: &Tensor) -> Result<f32> {
    let size = tensor.size();
    if size.iter().product::<i64>() != 1 {
        return Err(NnError::BadOutput(format!(
            "Expected scalar tensor, got shape {size:?}"
        )));
    }

    let mut value = [0.0f32; 1];
    tensor.to_device(Device::Cpu).copy_data(&mut value, 1);
    Ok(value[0])
}
