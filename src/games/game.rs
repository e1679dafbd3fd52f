use crate::error::ShapeError;
use crate::process::weights::Weights;
use itertools::Itertools;
use ndarray::{Array2, ArrayView1};
use ordered_float::NotNan;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

pub type ActionId = usize;

/// One action id per player, in player order.
pub type Profile = Vec<ActionId>;

/// Label of an action as given by the caller.
pub trait Action: Clone + Eq + Hash + Debug + Serialize {}

impl<T: Clone + Eq + Hash + Debug + Serialize> Action for T {}

#[derive(Debug, Clone)]
pub enum InitialAction {
    BestResponse,
    Distribution(Weights),
}

/// Validated mapping from every strategy profile to the payoff of every
/// player. Rows of `payoffs` follow the lexicographic order of profiles with
/// player 0 as the most significant position.
#[derive(Debug, Clone)]
pub struct PayoffTable<A: Action> {
    players: Vec<String>,
    actions: Vec<A>,
    action_index: HashMap<A, ActionId>,
    payoffs: Array2<f64>,
}

impl<A: Action> PayoffTable<A> {
    pub fn new<P, E>(players: Vec<P>, actions: Vec<A>, entries: E) -> Result<Self, ShapeError>
    where
        P: Into<String>,
        E: IntoIterator<Item = (Vec<A>, Vec<f64>)>,
    {
        let players: Vec<String> = players.into_iter().map(Into::into).collect();
        if players.is_empty() {
            return Err(ShapeError::NoPlayers);
        }
        if actions.is_empty() {
            return Err(ShapeError::NoActions);
        }
        let mut seen = HashSet::new();
        for player in &players {
            if !seen.insert(player.as_str()) {
                return Err(ShapeError::DuplicatePlayer(player.clone()));
            }
        }
        let mut action_index = HashMap::with_capacity(actions.len());
        for (id, action) in actions.iter().enumerate() {
            if action_index.insert(action.clone(), id).is_some() {
                return Err(ShapeError::DuplicateAction(format!("{:?}", action)));
            }
        }

        let n_players = players.len();
        let n_actions = actions.len();
        let expected = u32::try_from(n_players)
            .ok()
            .and_then(|n| n_actions.checked_pow(n))
            .and_then(|rows| rows.checked_mul(n_players).map(|_| rows))
            .ok_or(ShapeError::TooLarge {
                actions: n_actions,
                players: n_players,
            })?;

        let mut payoffs = Array2::<f64>::zeros((expected, n_players));
        let mut filled = vec![false; expected];
        let mut count = 0usize;
        for (key, values) in entries {
            count += 1;
            if key.len() != n_players {
                return Err(ShapeError::ProfileLength {
                    profile: format!("{:?}", key),
                    expected: n_players,
                    got: key.len(),
                });
            }
            let mut row = 0usize;
            for action in &key {
                let id = action_index
                    .get(action)
                    .ok_or_else(|| ShapeError::UnknownAction {
                        profile: format!("{:?}", key),
                        action: format!("{:?}", action),
                    })?;
                row = row * n_actions + id;
            }
            if values.len() != n_players {
                return Err(ShapeError::PayoffLength {
                    profile: format!("{:?}", key),
                    expected: n_players,
                    got: values.len(),
                });
            }
            if filled[row] {
                return Err(ShapeError::DuplicateProfile(format!("{:?}", key)));
            }
            for (player, value) in values.into_iter().enumerate() {
                let value = NotNan::new(value)
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| ShapeError::NotANumber(format!("{:?}", key)))?;
                payoffs[(row, player)] = value.into_inner();
            }
            filled[row] = true;
        }
        if count != expected {
            return Err(ShapeError::EntryCount {
                expected,
                got: count,
            });
        }

        Ok(PayoffTable {
            players,
            actions,
            action_index,
            payoffs,
        })
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    #[inline]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[inline]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    #[inline]
    pub fn profile_count(&self) -> usize {
        self.payoffs.nrows()
    }

    pub fn player_index(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p == name)
    }

    pub fn action_id(&self, action: &A) -> Option<ActionId> {
        self.action_index.get(action).copied()
    }

    pub fn profile_ids(&self, labels: &[A]) -> Option<Profile> {
        if labels.len() != self.player_count() {
            return None;
        }
        labels.iter().map(|a| self.action_id(a)).collect()
    }

    pub fn labels(&self, profile: &[ActionId]) -> Vec<A> {
        profile.iter().map(|id| self.actions[*id].clone()).collect()
    }

    #[inline]
    fn row(&self, profile: &[ActionId]) -> usize {
        debug_assert_eq!(profile.len(), self.player_count());
        let n_actions = self.action_count();
        profile.iter().fold(0, |acc, a| acc * n_actions + a)
    }

    pub fn payoffs(&self, profile: &[ActionId]) -> ArrayView1<f64> {
        self.payoffs.row(self.row(profile))
    }

    #[inline]
    pub fn payoff(&self, profile: &[ActionId], player: usize) -> f64 {
        self.payoffs[(self.row(profile), player)]
    }

    /// All profiles in row order.
    pub fn profiles(&self) -> impl Iterator<Item = Profile> + '_ {
        scenarios(self.action_count(), self.player_count()).into_iter()
    }
}

/// Every assignment of `n_actions` actions to `len` positions, in
/// lexicographic order. A zero-length scenario has exactly one assignment.
pub(crate) fn scenarios(n_actions: usize, len: usize) -> Vec<Profile> {
    if len == 0 {
        return vec![Vec::new()];
    }
    (0..len)
        .map(|_| 0..n_actions)
        .multi_cartesian_product()
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{scenarios, PayoffTable};
    use crate::error::ShapeError;

    pub(crate) fn prisoners_dilemma() -> PayoffTable<&'static str> {
        PayoffTable::new(
            vec!["A", "B"],
            vec!["Cooperate", "Defect"],
            vec![
                (vec!["Cooperate", "Cooperate"], vec![6.0, 6.0]),
                (vec!["Cooperate", "Defect"], vec![0.0, 10.0]),
                (vec!["Defect", "Cooperate"], vec![10.0, 0.0]),
                (vec!["Defect", "Defect"], vec![1.0, 1.0]),
            ],
        )
        .unwrap()
    }

    pub(crate) fn stag_hunt() -> PayoffTable<u32> {
        PayoffTable::new(
            vec!["A", "B"],
            vec![0, 1],
            vec![
                (vec![0, 0], vec![3.0, 3.0]),
                (vec![0, 1], vec![0.0, 2.0]),
                (vec![1, 0], vec![2.0, 0.0]),
                (vec![1, 1], vec![2.0, 2.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_table_lookup() {
        let table = prisoners_dilemma();
        assert_eq!(table.player_count(), 2);
        assert_eq!(table.action_count(), 2);
        assert_eq!(table.profile_count(), 4);
        let profile = table.profile_ids(&["Defect", "Cooperate"]).unwrap();
        assert_eq!(profile, vec![1, 0]);
        assert_eq!(table.payoff(&profile, 0), 10.0);
        assert_eq!(table.payoffs(&profile).to_vec(), vec![10.0, 0.0]);
        assert_eq!(table.labels(&profile), vec!["Defect", "Cooperate"]);
        assert_eq!(table.player_index("B"), Some(1));
        assert_eq!(table.player_index("C"), None);
        assert!(table.profile_ids(&["Defect"]).is_none());
    }

    #[test]
    fn test_profiles_order() {
        let profiles: Vec<_> = stag_hunt().profiles().collect();
        assert_eq!(
            profiles,
            vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]
        );
        assert_eq!(scenarios(3, 0), vec![Vec::<usize>::new()]);
        assert_eq!(scenarios(3, 2).len(), 9);
    }

    #[test]
    fn test_table_rejects_missing_entry() {
        let result = PayoffTable::new(
            vec!["A", "B"],
            vec![0, 1],
            vec![
                (vec![0, 0], vec![3.0, 3.0]),
                (vec![0, 1], vec![0.0, 2.0]),
                (vec![1, 0], vec![2.0, 0.0]),
            ],
        );
        assert_eq!(
            result.unwrap_err(),
            ShapeError::EntryCount {
                expected: 4,
                got: 3
            }
        );
    }

    #[test]
    fn test_table_rejects_bad_shapes() {
        let short_key = PayoffTable::new(
            vec!["A", "B"],
            vec![0, 1],
            vec![(vec![0], vec![3.0, 3.0])],
        );
        assert!(matches!(
            short_key,
            Err(ShapeError::ProfileLength { got: 1, .. })
        ));

        let unknown = PayoffTable::new(
            vec!["A", "B"],
            vec![0, 1],
            vec![(vec![0, 2], vec![3.0, 3.0])],
        );
        assert!(matches!(unknown, Err(ShapeError::UnknownAction { .. })));

        let short_value = PayoffTable::new(
            vec!["A", "B"],
            vec![0, 1],
            vec![(vec![0, 1], vec![3.0])],
        );
        assert!(matches!(
            short_value,
            Err(ShapeError::PayoffLength { got: 1, .. })
        ));

        let nan = PayoffTable::new(vec!["A"], vec![0], vec![(vec![0], vec![f64::NAN])]);
        assert!(matches!(nan, Err(ShapeError::NotANumber(_))));

        for value in [f64::INFINITY, f64::NEG_INFINITY] {
            let infinite = PayoffTable::new(
                vec!["A", "B"],
                vec![0, 1],
                vec![
                    (vec![0, 0], vec![1.0, 1.0]),
                    (vec![0, 1], vec![value, 0.0]),
                    (vec![1, 0], vec![0.0, 1.0]),
                    (vec![1, 1], vec![2.0, 2.0]),
                ],
            );
            assert!(matches!(infinite, Err(ShapeError::NotANumber(_))));
        }
    }

    #[test]
    fn test_table_rejects_duplicates() {
        let duplicate = PayoffTable::new(
            vec!["A", "B"],
            vec![0, 1],
            vec![
                (vec![0, 0], vec![3.0, 3.0]),
                (vec![0, 0], vec![3.0, 3.0]),
                (vec![1, 0], vec![2.0, 0.0]),
                (vec![1, 1], vec![2.0, 2.0]),
            ],
        );
        assert!(matches!(duplicate, Err(ShapeError::DuplicateProfile(_))));

        let players = PayoffTable::new(vec!["A", "A"], vec![0], vec![(vec![0, 0], vec![1.0, 1.0])]);
        assert_eq!(
            players.unwrap_err(),
            ShapeError::DuplicatePlayer("A".to_string())
        );

        let actions = PayoffTable::new(vec!["A"], vec![0, 0], Vec::new());
        assert!(matches!(actions, Err(ShapeError::DuplicateAction(_))));
    }

    #[test]
    fn test_table_rejects_empty_declarations() {
        let no_players = PayoffTable::<u32>::new(Vec::<String>::new(), vec![0], Vec::new());
        assert_eq!(no_players.unwrap_err(), ShapeError::NoPlayers);
        let no_actions = PayoffTable::<u32>::new(vec!["A"], Vec::new(), Vec::new());
        assert_eq!(no_actions.unwrap_err(), ShapeError::NoActions);
    }
}
