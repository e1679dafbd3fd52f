use crate::error::{Error, Result, ShapeError};
use crate::games::chooser::{ActionChooser, UniformBestResponse};
use crate::games::game::{Action, ActionId, InitialAction, PayoffTable, Profile};
use crate::process::process::Process;
use crate::process::weights::Weights;
use ndarray::Array2;
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Observable outcome of one round of belief learning. `beliefs` is the state
/// after the update, indexed by player position.
#[derive(Debug, Clone, Serialize)]
pub struct RoundRecord<A: Action> {
    pub round: usize,
    pub profile: Vec<A>,
    pub payoffs: Vec<f64>,
    pub beliefs: Vec<Array2<f64>>,
}

/// Fictitious-play style learning: every player best-responds to its belief
/// about each opponent, then shifts the belief towards what was observed.
///
/// Belief of player `i` has one row per opponent (players in order with `i`
/// removed) and one column per action.
#[derive(Debug)]
pub struct BeliefLearner<'a, A: Action, C: ActionChooser = UniformBestResponse> {
    table: &'a PayoffTable<A>,
    beliefs: Vec<Array2<f64>>,
    initial: Vec<InitialAction>,
    belief_update_value: f64,
    action_chooser: C,
    round: usize,
}

impl<'a, A: Action> BeliefLearner<'a, A> {
    pub fn new(
        table: &'a PayoffTable<A>,
        beliefs: HashMap<String, Array2<f64>>,
        initial: Option<HashMap<String, Vec<f64>>>,
        belief_update_value: f64,
    ) -> Result<Self> {
        Self::with_chooser(
            table,
            beliefs,
            initial,
            belief_update_value,
            UniformBestResponse,
        )
    }
}

impl<'a, A: Action, C: ActionChooser> BeliefLearner<'a, A, C> {
    pub fn with_chooser(
        table: &'a PayoffTable<A>,
        mut beliefs: HashMap<String, Array2<f64>>,
        initial: Option<HashMap<String, Vec<f64>>>,
        belief_update_value: f64,
        action_chooser: C,
    ) -> Result<Self> {
        let n_players = table.player_count();
        let n_actions = table.action_count();

        if let Some(name) = beliefs.keys().find(|k| table.player_index(k).is_none()) {
            return Err(ShapeError::UnknownPlayer(name.clone()).into());
        }
        if beliefs.len() != n_players {
            return Err(ShapeError::PlayerCount {
                expected: n_players,
                got: beliefs.len(),
            }
            .into());
        }
        let mut ordered = Vec::with_capacity(n_players);
        for player in table.players() {
            let belief = beliefs
                .remove(player)
                .ok_or_else(|| ShapeError::MissingPlayer(player.clone()))?;
            if belief.dim() != (n_players - 1, n_actions) {
                return Err(ShapeError::BeliefShape {
                    player: player.clone(),
                    expected: (n_players - 1, n_actions),
                    got: belief.dim(),
                }
                .into());
            }
            if let Some(p) = belief.iter().find(|p| !(0.0..=1.0).contains(*p)) {
                return Err(Error::invalid("belief", p));
            }
            ordered.push(belief);
        }

        let initial = match initial {
            None => vec![InitialAction::BestResponse; n_players],
            Some(mut weights) => {
                if let Some(name) = weights.keys().find(|k| table.player_index(k).is_none()) {
                    return Err(ShapeError::UnknownPlayer(name.clone()).into());
                }
                let mut result = Vec::with_capacity(n_players);
                for player in table.players() {
                    let w = weights
                        .remove(player)
                        .ok_or_else(|| ShapeError::MissingPlayer(player.clone()))?;
                    if w.len() != n_actions {
                        return Err(ShapeError::InitialWeights {
                            player: player.clone(),
                            expected: n_actions,
                            got: w.len(),
                        }
                        .into());
                    }
                    let w = Weights::from(w);
                    if !w.is_distribution() {
                        return Err(Error::invalid("initial weights", w));
                    }
                    result.push(InitialAction::Distribution(w));
                }
                result
            }
        };

        if !(0.0..=1.0).contains(&belief_update_value) {
            return Err(Error::invalid("belief update value", belief_update_value));
        }

        Ok(BeliefLearner {
            table,
            beliefs: ordered,
            initial,
            belief_update_value,
            action_chooser,
            round: 0,
        })
    }

    pub fn beliefs(&self) -> &[Array2<f64>] {
        &self.beliefs
    }

    pub fn round(&self) -> usize {
        self.round
    }

    /// Expected payoff of every action of every player under the current
    /// beliefs.
    pub fn expected_payoffs(&self) -> Vec<Weights> {
        let n_players = self.table.player_count();
        let mut expected = vec![Weights::zeros(self.table.action_count()); n_players];
        for profile in self.table.profiles() {
            let payoffs = self.table.payoffs(&profile);
            for (player, belief) in self.beliefs.iter().enumerate() {
                let prob: f64 = profile
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != player)
                    .enumerate()
                    .map(|(row, (_, action))| belief[(row, *action)])
                    .product();
                *expected[player].get_mut(profile[player]) += prob * payoffs[player];
            }
        }
        expected
    }

    fn choose_profile(&self, rng: &mut impl Rng) -> Profile {
        let first_round = self.round == 0;
        let needs_expectation = !first_round
            || self
                .initial
                .iter()
                .any(|i| matches!(i, InitialAction::BestResponse));
        let expected = if needs_expectation {
            self.expected_payoffs()
        } else {
            Vec::new()
        };
        self.initial
            .iter()
            .enumerate()
            .map(|(player, initial)| match initial {
                InitialAction::Distribution(weights) if first_round => weights.sample_index(rng),
                _ => self.action_chooser.choose_action(rng, &expected[player]),
            })
            .collect()
    }

    fn update_beliefs(&mut self, profile: &[ActionId]) {
        let n_actions = self.table.action_count();
        let increment = self.belief_update_value;
        let decrement = if n_actions > 1 {
            increment / (n_actions - 1) as f64
        } else {
            0.0
        };
        for (player, belief) in self.beliefs.iter_mut().enumerate() {
            let observed = profile
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != player)
                .map(|(_, action)| *action);
            for (mut row, action) in belief.rows_mut().into_iter().zip(observed) {
                row.mapv_inplace(|x| (x - decrement).max(0.0));
                row[action] = (row[action] + decrement + increment).min(1.0);
            }
        }
    }

    pub fn play_round(&mut self, rng: &mut impl Rng) -> RoundRecord<A> {
        let profile = self.choose_profile(rng);
        self.update_beliefs(&profile);
        let record = RoundRecord {
            round: self.round,
            profile: self.table.labels(&profile),
            payoffs: self.table.payoffs(&profile).to_vec(),
            beliefs: self.beliefs.clone(),
        };
        log::debug!(
            "round {}: actions {:?} payoffs {:?}",
            record.round,
            record.profile,
            record.payoffs
        );
        self.round += 1;
        record
    }

    pub fn run(&mut self, rng: &mut impl Rng, rounds: usize) -> Vec<RoundRecord<A>> {
        (0..rounds).map(|_| self.play_round(rng)).collect()
    }
}

impl<'a, A: Action, C: ActionChooser> Process for BeliefLearner<'a, A, C> {
    type FrameT = RoundRecord<A>;

    fn step(&mut self, rng: &mut impl Rng) -> Result<RoundRecord<A>> {
        Ok(self.play_round(rng))
    }

    fn configuration(&self) -> Value {
        json!({
            "game": "belief",
            "players": self.table.players(),
            "actions": self.table.action_count(),
            "update": self.belief_update_value,
            "chooser": self.action_chooser.configuration(),
        })
    }
}
