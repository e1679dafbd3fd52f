use crate::games::game::{scenarios, Action, ActionId, PayoffTable, Profile};
use std::collections::BTreeSet;

/// Best responses of `player` against one fixed choice of the other players.
/// Payoffs are compared with exact equality, so every tied action is kept.
fn best_responses_to<A: Action>(
    table: &PayoffTable<A>,
    scenario: &[ActionId],
    player: usize,
) -> Vec<Profile> {
    let with_action = |action: ActionId| {
        let mut profile = scenario.to_vec();
        profile.insert(player, action);
        profile
    };
    let first = with_action(0);
    let mut best_payoff = table.payoff(&first, player);
    let mut best = vec![first];
    for action in 1..table.action_count() {
        let profile = with_action(action);
        let payoff = table.payoff(&profile, player);
        if payoff == best_payoff {
            best.push(profile);
        } else if payoff > best_payoff {
            best_payoff = payoff;
            best.clear();
            best.push(profile);
        }
    }
    best
}

/// Every profile in which `player` plays a best response to the others.
pub fn best_response_set<A: Action>(table: &PayoffTable<A>, player: usize) -> BTreeSet<Profile> {
    scenarios(table.action_count(), table.player_count() - 1)
        .iter()
        .flat_map(|scenario| best_responses_to(table, scenario, player))
        .collect()
}

/// Profiles that are a best response for every player at once.
pub fn pure_nash_profiles<A: Action>(table: &PayoffTable<A>) -> BTreeSet<Profile> {
    let mut result = best_response_set(table, 0);
    for player in 1..table.player_count() {
        if result.is_empty() {
            break;
        }
        let responses = best_response_set(table, player);
        result.retain(|profile| responses.contains(profile));
    }
    log::debug!("found {} pure equilibria", result.len());
    result
}

/// Pure Nash equilibria as action labels, in lexicographic profile order.
pub fn enumerate_pure_nash<A: Action>(table: &PayoffTable<A>) -> Vec<Vec<A>> {
    pure_nash_profiles(table)
        .iter()
        .map(|profile| table.labels(profile))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{best_response_set, enumerate_pure_nash, pure_nash_profiles};
    use crate::games::game::tests::{prisoners_dilemma, stag_hunt};
    use crate::games::game::PayoffTable;
    use std::collections::BTreeSet;

    fn three_actions() -> PayoffTable<u32> {
        PayoffTable::new(
            vec!["A", "B"],
            vec![0, 1, 2],
            vec![
                (vec![0, 0], vec![2.0, 1.0]),
                (vec![0, 1], vec![1.0, 2.0]),
                (vec![0, 2], vec![0.0, 1.0]),
                (vec![1, 0], vec![1.0, 2.0]),
                (vec![1, 1], vec![1.0, 0.0]),
                (vec![1, 2], vec![0.0, 0.0]),
                (vec![2, 0], vec![0.0, 1.0]),
                (vec![2, 1], vec![0.0, 0.0]),
                (vec![2, 2], vec![2.0, 1.0]),
            ],
        )
        .unwrap()
    }

    fn three_players() -> PayoffTable<u32> {
        PayoffTable::new(
            vec!["A", "B", "C"],
            vec![0, 1],
            vec![
                (vec![0, 0, 0], vec![70.0, 70.0, 70.0]),
                (vec![0, 1, 0], vec![10.0, 10.0, 23.0]),
                (vec![1, 0, 0], vec![60.0, 0.0, 0.0]),
                (vec![1, 1, 0], vec![60.0, 65.0, 10.0]),
                (vec![0, 0, 1], vec![70.0, 70.0, 60.0]),
                (vec![0, 1, 1], vec![10.0, 20.0, 0.0]),
                (vec![1, 0, 1], vec![80.0, 50.0, 30.0]),
                (vec![1, 1, 1], vec![60.0, 55.0, 5.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_prisoners_dilemma() {
        let table = prisoners_dilemma();
        assert_eq!(enumerate_pure_nash(&table), vec![vec!["Defect", "Defect"]]);
    }

    #[test]
    fn test_three_actions() {
        assert_eq!(
            enumerate_pure_nash(&three_actions()),
            vec![vec![0, 1], vec![2, 2]]
        );
    }

    #[test]
    fn test_three_players() {
        assert_eq!(
            enumerate_pure_nash(&three_players()),
            vec![vec![0, 0, 0], vec![1, 1, 0]]
        );
    }

    #[test]
    fn test_ties_are_all_best_responses() {
        let table = stag_hunt();
        let responses = best_response_set(&table, 0);
        assert_eq!(
            responses,
            BTreeSet::from([vec![0, 0], vec![1, 1]])
        );

        let flat = PayoffTable::new(
            vec!["A", "B"],
            vec![0, 1],
            vec![
                (vec![0, 0], vec![1.0, 1.0]),
                (vec![0, 1], vec![1.0, 1.0]),
                (vec![1, 0], vec![1.0, 1.0]),
                (vec![1, 1], vec![1.0, 1.0]),
            ],
        )
        .unwrap();
        assert_eq!(pure_nash_profiles(&flat).len(), 4);
    }

    #[test]
    fn test_no_pure_equilibrium() {
        let matching_pennies = PayoffTable::new(
            vec!["A", "B"],
            vec!["Heads", "Tails"],
            vec![
                (vec!["Heads", "Heads"], vec![1.0, -1.0]),
                (vec!["Heads", "Tails"], vec![-1.0, 1.0]),
                (vec!["Tails", "Heads"], vec![-1.0, 1.0]),
                (vec!["Tails", "Tails"], vec![1.0, -1.0]),
            ],
        )
        .unwrap();
        assert!(enumerate_pure_nash(&matching_pennies).is_empty());
    }

    #[test]
    fn test_single_player_picks_maximum() {
        let table = PayoffTable::new(
            vec!["A"],
            vec![0, 1, 2],
            vec![
                (vec![0], vec![1.0]),
                (vec![1], vec![3.0]),
                (vec![2], vec![3.0]),
            ],
        )
        .unwrap();
        assert_eq!(enumerate_pure_nash(&table), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_result_is_stable_subset_of_keys() {
        for table in [three_actions(), three_players(), stag_hunt()] {
            let first = pure_nash_profiles(&table);
            let second = pure_nash_profiles(&table);
            assert_eq!(first, second);
            let keys: BTreeSet<_> = table.profiles().collect();
            assert!(first.is_subset(&keys));
        }
    }
}
