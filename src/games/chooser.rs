use crate::error::{Error, Result};
use crate::games::game::ActionId;
use crate::process::weights::Weights;
use rand::distributions::Bernoulli;
use rand::seq::SliceRandom;
use rand::Rng;

pub trait ActionChooser {
    fn choose_action(&self, rng: &mut impl Rng, payoffs: &Weights) -> ActionId;

    fn configuration(&self) -> serde_json::Value;
}

fn uniform_best(rng: &mut impl Rng, payoffs: &Weights) -> ActionId {
    let best = payoffs.argmax_all();
    match best.choose(rng) {
        Some(action) => *action,
        None => 0,
    }
}

/// Uniform choice among the actions with maximal expected payoff.
#[derive(Debug, Default, Clone)]
pub struct UniformBestResponse;

impl ActionChooser for UniformBestResponse {
    fn choose_action(&self, rng: &mut impl Rng, payoffs: &Weights) -> ActionId {
        uniform_best(rng, payoffs)
    }

    fn configuration(&self) -> serde_json::Value {
        serde_json::json!({ "chooser": "best" })
    }
}

/// Best response, replaced by a uniformly random action with probability
/// `epsilon`.
#[derive(Debug, Clone)]
pub struct BestResponseEpsilonError {
    epsilon: f64,
    error_distribution: Bernoulli,
}

impl BestResponseEpsilonError {
    pub fn new(epsilon: f64) -> Result<Self> {
        let error_distribution =
            Bernoulli::new(epsilon).map_err(|_| Error::invalid("epsilon", epsilon))?;
        Ok(BestResponseEpsilonError {
            epsilon,
            error_distribution,
        })
    }
}

impl ActionChooser for BestResponseEpsilonError {
    fn choose_action(&self, rng: &mut impl Rng, payoffs: &Weights) -> ActionId {
        if rng.sample(self.error_distribution) {
            rng.gen_range(0..payoffs.len())
        } else {
            uniform_best(rng, payoffs)
        }
    }

    fn configuration(&self) -> serde_json::Value {
        serde_json::json!({ "chooser": "best_eps", "epsilon": self.epsilon })
    }
}
