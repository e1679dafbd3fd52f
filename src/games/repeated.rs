use crate::error::{Error, Result, ShapeError};
use crate::games::game::{Action, ActionId, PayoffTable, Profile};
use crate::games::strategy::{AgentId, Strategy};
use crate::process::process::Process;
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct RepeatedRound<A: Action> {
    pub round: usize,
    pub profile: Vec<A>,
    pub payoffs: Vec<f64>,
    pub total_payoffs: Vec<f64>,
}

/// Actions taken by every participant of a match, `history[k]` belonging to
/// the k-th participant.
#[derive(Debug, Clone)]
pub(crate) struct MatchHistory {
    history: Vec<Vec<ActionId>>,
    totals: Vec<f64>,
}

impl MatchHistory {
    fn new(players: usize) -> Self {
        MatchHistory {
            history: vec![Vec::new(); players],
            totals: vec![0.0; players],
        }
    }

    /// Asks every strategy for its action given the shared history.
    fn decide<A: Action>(
        &self,
        table: &PayoffTable<A>,
        strategies: &[&dyn Strategy],
        ids: &[AgentId],
    ) -> Result<Profile, ShapeError> {
        strategies
            .iter()
            .zip(ids)
            .map(|(strategy, id)| {
                let action = strategy.decide(*id, ids, &self.history);
                if action < table.action_count() {
                    Ok(action)
                } else {
                    Err(ShapeError::ActionOutOfRange {
                        action,
                        actions: table.action_count(),
                    })
                }
            })
            .collect()
    }

    fn record<A: Action>(&mut self, table: &PayoffTable<A>, profile: &[ActionId]) {
        let payoffs = table.payoffs(profile);
        for (k, action) in profile.iter().enumerate() {
            self.history[k].push(*action);
            self.totals[k] += payoffs[k];
        }
    }
}

/// Plays `rounds` repeated rounds between `strategies` (one per player, in
/// player order) and returns the summed payoff of every participant.
pub fn play_match<A: Action>(
    table: &PayoffTable<A>,
    strategies: &[&dyn Strategy],
    ids: &[AgentId],
    rounds: usize,
) -> Result<Vec<f64>, ShapeError> {
    debug_assert_eq!(strategies.len(), table.player_count());
    debug_assert_eq!(ids.len(), table.player_count());
    let mut state = MatchHistory::new(ids.len());
    for _ in 0..rounds {
        let profile = state.decide(table, strategies, ids)?;
        state.record(table, &profile);
    }
    log::trace!("match {:?}: totals {:?}", ids, state.totals);
    Ok(state.totals)
}

/// Repeated game in which every player follows its own [`Strategy`] and sees
/// the complete history of the match.
#[derive(Debug)]
pub struct RepeatedGame<'a, A: Action> {
    table: &'a PayoffTable<A>,
    strategies: Vec<Box<dyn Strategy>>,
    ids: Vec<AgentId>,
    state: MatchHistory,
    round: usize,
}

impl<'a, A: Action> RepeatedGame<'a, A> {
    pub fn new(
        table: &'a PayoffTable<A>,
        mut strategies: HashMap<String, Box<dyn Strategy>>,
    ) -> Result<Self> {
        if let Some(name) = strategies
            .keys()
            .find(|k| table.player_index(k).is_none())
        {
            return Err(ShapeError::UnknownPlayer(name.clone()).into());
        }
        let ordered = table
            .players()
            .iter()
            .map(|player| {
                strategies
                    .remove(player)
                    .ok_or_else(|| ShapeError::MissingPlayer(player.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RepeatedGame {
            table,
            strategies: ordered,
            ids: (0..table.player_count()).collect(),
            state: MatchHistory::new(table.player_count()),
            round: 0,
        })
    }

    pub fn history(&self) -> &[Vec<ActionId>] {
        &self.state.history
    }

    pub fn total_payoffs(&self) -> &[f64] {
        &self.state.totals
    }

    pub fn play_round(&mut self) -> Result<RepeatedRound<A>> {
        let strategies: Vec<&dyn Strategy> = self.strategies.iter().map(|s| s.as_ref()).collect();
        let profile = self.state.decide(self.table, &strategies, &self.ids)?;
        self.state.record(self.table, &profile);
        let record = RepeatedRound {
            round: self.round,
            profile: self.table.labels(&profile),
            payoffs: self.table.payoffs(&profile).to_vec(),
            total_payoffs: self.state.totals.clone(),
        };
        log::debug!(
            "round {}: actions {:?} totals {:?}",
            record.round,
            record.profile,
            record.total_payoffs
        );
        self.round += 1;
        Ok(record)
    }

    pub fn run(&mut self, rounds: usize) -> Result<Vec<RepeatedRound<A>>> {
        (0..rounds).map(|_| self.play_round()).collect()
    }
}

impl<'a, A: Action> Process for RepeatedGame<'a, A> {
    type FrameT = RepeatedRound<A>;

    fn step(&mut self, _rng: &mut impl Rng) -> Result<RepeatedRound<A>, Error> {
        self.play_round()
    }

    fn configuration(&self) -> Value {
        json!({
            "game": "repeated",
            "players": self.table.players(),
            "strategies": self.strategies.iter().map(|s| format!("{:?}", s)).collect::<Vec<_>>(),
        })
    }
}
