use crate::error::{ArithmeticError, Error, Result, ShapeError};
use crate::games::game::{Action, PayoffTable};
use crate::games::repeated::play_match;
use crate::games::strategy::{AgentId, Strategy};
use crate::process::process::Process;
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// What to do when every strategy ends a generation with zero total payoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPayoffPolicy {
    /// Stop the simulation with [`ArithmeticError::ZeroTotalPayoff`].
    #[default]
    Fail,
    KeepPopulation,
    /// Split agents as if every strategy had earned the same payoff.
    Uniform,
}

/// What to do when the rounded shares cannot be honored: a strategy with a
/// negative total would get a negative share, or the leading shares add up to
/// more agents than the population has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Clamp negative shares to 0 and take the excess back from the latest
    /// declared strategies, never below 0. See [`reapportion_trimmed`].
    #[default]
    Trim,
    /// Stop the simulation with the [`ArithmeticError`] of [`reapportion`].
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    games_per_generation: usize,
    iterations_per_game: usize,
    #[serde(default)]
    zero_payoff_policy: ZeroPayoffPolicy,
    #[serde(default)]
    rounding_policy: RoundingPolicy,
}

impl PopulationConfig {
    pub fn new() -> Self {
        PopulationConfig {
            games_per_generation: 10,
            iterations_per_game: 10,
            zero_payoff_policy: ZeroPayoffPolicy::Fail,
            rounding_policy: RoundingPolicy::Trim,
        }
    }

    pub fn set_games_per_generation(&mut self, games_per_generation: usize) {
        self.games_per_generation = games_per_generation;
    }
    pub fn set_iterations_per_game(&mut self, iterations_per_game: usize) {
        self.iterations_per_game = iterations_per_game;
    }
    pub fn set_zero_payoff_policy(&mut self, zero_payoff_policy: ZeroPayoffPolicy) {
        self.zero_payoff_policy = zero_payoff_policy;
    }
    pub fn set_rounding_policy(&mut self, rounding_policy: RoundingPolicy) {
        self.rounding_policy = rounding_policy;
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Member of a single generation. Ids are reassigned every generation and
/// `payoffs` holds the average per-round payoff of each game played.
#[derive(Debug, Clone)]
struct Agent {
    id: AgentId,
    strategy: usize,
    payoffs: Vec<f64>,
}

impl Agent {
    fn average_payoff(&self) -> f64 {
        self.payoffs.iter().sum::<f64>() / self.payoffs.len() as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub name: String,
    pub agents: usize,
    pub total_payoff: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub strategies: Vec<StrategyReport>,
    /// `matchups[(i, j)]` counts pairings of strategy `i` (first seat) with
    /// strategy `j` (second seat) over the whole generation.
    pub matchups: Array2<usize>,
    pub next_population: Vec<usize>,
}

fn total_of(totals: &[f64]) -> Result<f64, ArithmeticError> {
    let sum: f64 = totals.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return Err(ArithmeticError::ZeroTotalPayoff(sum));
    }
    Ok(sum)
}

#[inline]
fn rounded_share(total: f64, sum: f64, agent_count: usize) -> f64 {
    (total / sum * agent_count as f64).round_ties_even()
}

/// Splits `agent_count` agents proportionally to `totals`.
///
/// Every entry but the last is rounded half to even; the last entry receives
/// whatever is left, so the sum of the result is always `agent_count`.
pub fn reapportion(totals: &[f64], agent_count: usize) -> Result<Vec<usize>, ArithmeticError> {
    let sum = total_of(totals)?;
    let mut counts = Vec::with_capacity(totals.len());
    let mut assigned = 0usize;
    if let Some((_, leading)) = totals.split_last() {
        for (index, total) in leading.iter().enumerate() {
            let share = rounded_share(*total, sum, agent_count);
            if !(share >= 0.0) {
                return Err(ArithmeticError::NegativeShare { index, share });
            }
            let share = share as usize;
            assigned += share;
            counts.push(share);
        }
    }
    let rest = agent_count
        .checked_sub(assigned)
        .ok_or(ArithmeticError::NegativeRemainder {
            assigned,
            total: agent_count,
        })?;
    counts.push(rest);
    Ok(counts)
}

/// Like [`reapportion`], but never fails on rounding.
///
/// Negative shares become 0. When the leading shares exceed `agent_count`,
/// the excess is taken back from the latest leading strategies first, none
/// going below 0, and the last strategy gets nothing. Only a zero or
/// non-finite sum is an error.
pub fn reapportion_trimmed(
    totals: &[f64],
    agent_count: usize,
) -> Result<Vec<usize>, ArithmeticError> {
    let sum = total_of(totals)?;
    let mut counts: Vec<usize> = match totals.split_last() {
        Some((_, leading)) => leading
            .iter()
            .map(|total| rounded_share(*total, sum, agent_count).max(0.0) as usize)
            .collect(),
        None => Vec::new(),
    };
    let assigned: usize = counts.iter().sum();
    let mut excess = assigned.saturating_sub(agent_count);
    for count in counts.iter_mut().rev() {
        if excess == 0 {
            break;
        }
        let taken = excess.min(*count);
        *count -= taken;
        excess -= taken;
    }
    let assigned: usize = counts.iter().sum();
    counts.push(agent_count - assigned);
    Ok(counts)
}

/// Uniformly random perfect matching of `pool`, drawing two members at a time.
fn match_pairs(mut pool: Vec<usize>, rng: &mut impl Rng) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(pool.len() / 2);
    while pool.len() >= 2 {
        let first = pool.remove(rng.gen_range(0..pool.len()));
        let second = pool.remove(rng.gen_range(0..pool.len()));
        pairs.push((first, second));
    }
    pairs
}

/// Discrete replicator dynamics over a two-player stage game.
///
/// Strategies keep their declaration order; the last one absorbs the rounding
/// remainder when agents are redistributed.
#[derive(Debug)]
pub struct PopulationSimulator<'a, A: Action> {
    table: &'a PayoffTable<A>,
    names: Vec<String>,
    strategies: Vec<Box<dyn Strategy>>,
    population: Vec<usize>,
    agent_count: usize,
    config: PopulationConfig,
    generation: usize,
}

impl<'a, A: Action> PopulationSimulator<'a, A> {
    pub fn new(
        table: &'a PayoffTable<A>,
        strategies: Vec<(String, Box<dyn Strategy>)>,
        distribution: HashMap<String, usize>,
        config: PopulationConfig,
    ) -> Result<Self> {
        if table.player_count() != 2 {
            return Err(ShapeError::NotTwoPlayer(table.player_count()).into());
        }
        if strategies.is_empty() {
            return Err(ShapeError::NoStrategies.into());
        }
        let mut seen = HashSet::new();
        for (name, _) in &strategies {
            if !seen.insert(name.as_str()) {
                return Err(ShapeError::DuplicateStrategy(name.clone()).into());
            }
        }
        if let Some(name) = distribution.keys().find(|k| !seen.contains(k.as_str())) {
            return Err(ShapeError::UnknownStrategy(name.clone()).into());
        }
        let (names, strategies): (Vec<String>, Vec<Box<dyn Strategy>>) =
            strategies.into_iter().unzip();
        let population = names
            .iter()
            .map(|name| {
                distribution
                    .get(name)
                    .copied()
                    .ok_or_else(|| ShapeError::MissingDistribution(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let agent_count: usize = population.iter().sum();
        if agent_count % 2 != 0 {
            return Err(ShapeError::OddPopulation(agent_count).into());
        }
        if config.games_per_generation == 0 {
            return Err(Error::invalid("games per generation", 0));
        }
        if config.iterations_per_game == 0 {
            return Err(Error::invalid("iterations per game", 0));
        }
        Ok(PopulationSimulator {
            table,
            names,
            strategies,
            population,
            agent_count,
            config,
            generation: 0,
        })
    }

    /// Current number of agents per strategy, in declaration order.
    pub fn population(&self) -> Vec<(&str, usize)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.population.iter().copied())
            .collect()
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    fn materialize(&self) -> Vec<Agent> {
        self.population
            .iter()
            .enumerate()
            .flat_map(|(strategy, count)| std::iter::repeat(strategy).take(*count))
            .enumerate()
            .map(|(id, strategy)| Agent {
                id,
                strategy,
                payoffs: Vec::with_capacity(self.config.games_per_generation),
            })
            .collect()
    }

    fn apportion(&self, totals: &[f64]) -> Result<Vec<usize>, ArithmeticError> {
        match self.config.rounding_policy {
            RoundingPolicy::Fail => reapportion(totals, self.agent_count),
            RoundingPolicy::Trim => {
                let trimmed = reapportion_trimmed(totals, self.agent_count)?;
                if let Err(e) = reapportion(totals, self.agent_count) {
                    log::warn!("generation {}: {}, shares trimmed to {:?}", self.generation, e, trimmed);
                }
                Ok(trimmed)
            }
        }
    }

    fn next_population(&self, totals: &[f64]) -> Result<Vec<usize>> {
        match self.apportion(totals) {
            Ok(counts) => Ok(counts),
            Err(ArithmeticError::ZeroTotalPayoff(sum)) => match self.config.zero_payoff_policy {
                ZeroPayoffPolicy::Fail => Err(ArithmeticError::ZeroTotalPayoff(sum).into()),
                ZeroPayoffPolicy::KeepPopulation => {
                    log::warn!("generation {}: zero total payoff, population kept", self.generation);
                    Ok(self.population.clone())
                }
                ZeroPayoffPolicy::Uniform => {
                    log::warn!("generation {}: zero total payoff, population split evenly", self.generation);
                    Ok(self.apportion(&vec![1.0; totals.len()])?)
                }
            },
            Err(e) => Err(e.into()),
        }
    }

    pub fn play_generation(&mut self, rng: &mut impl Rng) -> Result<GenerationReport> {
        let mut agents = self.materialize();
        let n_strategies = self.strategies.len();
        let iterations = self.config.iterations_per_game;
        let strategies: Vec<&dyn Strategy> = self.strategies.iter().map(|s| s.as_ref()).collect();
        let mut matchups = Array2::<usize>::zeros((n_strategies, n_strategies));

        for _game in 0..self.config.games_per_generation {
            let mut order: Vec<usize> = (0..agents.len()).collect();
            order.shuffle(rng);
            for (first, second) in match_pairs(order, rng) {
                let (s1, s2) = (agents[first].strategy, agents[second].strategy);
                matchups[(s1, s2)] += 1;
                let totals = play_match(
                    self.table,
                    &[strategies[s1], strategies[s2]],
                    &[agents[first].id, agents[second].id],
                    iterations,
                )?;
                agents[first].payoffs.push(totals[0] / iterations as f64);
                agents[second].payoffs.push(totals[1] / iterations as f64);
            }
        }

        let mut totals = vec![0.0; n_strategies];
        for agent in &agents {
            totals[agent.strategy] += agent.average_payoff();
        }
        let next_population = self.next_population(&totals)?;

        let report = GenerationReport {
            generation: self.generation,
            strategies: self
                .names
                .iter()
                .zip(&self.population)
                .zip(&totals)
                .map(|((name, agents), total)| StrategyReport {
                    name: name.clone(),
                    agents: *agents,
                    total_payoff: *total,
                })
                .collect(),
            matchups,
            next_population: next_population.clone(),
        };
        log::info!(
            "generation {}: population {:?} payoffs {:?} -> {:?}",
            self.generation,
            self.population,
            totals,
            next_population
        );
        self.population = next_population;
        self.generation += 1;
        Ok(report)
    }

    pub fn simulate(
        &mut self,
        rng: &mut impl Rng,
        generations: usize,
    ) -> Result<Vec<GenerationReport>> {
        (0..generations).map(|_| self.play_generation(rng)).collect()
    }
}

impl<'a, A: Action> Process for PopulationSimulator<'a, A> {
    type FrameT = GenerationReport;

    fn step(&mut self, rng: &mut impl Rng) -> Result<GenerationReport> {
        self.play_generation(rng)
    }

    fn configuration(&self) -> Value {
        json!({
            "game": "population",
            "strategies": self.names,
            "agents": self.agent_count,
            "config": self.config,
        })
    }
}
