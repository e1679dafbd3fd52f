use crate::games::game::ActionId;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub type AgentId = usize;

/// Decision rule of a player in a repeated game.
///
/// `history[k]` holds every action taken so far by `ids[k]` in the current
/// match, so all entries have the same length. Implementations must be pure:
/// the same inputs always give the same action.
pub trait Strategy: Debug {
    fn decide(&self, self_id: AgentId, ids: &[AgentId], history: &[Vec<ActionId>]) -> ActionId;
}

/// Strategies that can be selected by name, e.g. from a JSON configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum NamedStrategy {
    Always(ActionId),
    /// Opens with `opening`, then repeats the opponent's previous action.
    TitForTat { opening: ActionId },
    /// Plays `cooperate` until the opponent has played anything else once.
    GrimTrigger { cooperate: ActionId, defect: ActionId },
    Alternate { first: ActionId, second: ActionId },
    /// Win-stay, lose-shift: keeps its action when both players matched in
    /// the previous round, switches otherwise.
    Pavlov { cooperate: ActionId, defect: ActionId },
}

/// Position of the first player in `ids` other than `self_id`.
fn opponent(self_id: AgentId, ids: &[AgentId]) -> Option<usize> {
    ids.iter().position(|id| *id != self_id)
}

fn own(self_id: AgentId, ids: &[AgentId]) -> Option<usize> {
    ids.iter().position(|id| *id == self_id)
}

impl Strategy for NamedStrategy {
    fn decide(&self, self_id: AgentId, ids: &[AgentId], history: &[Vec<ActionId>]) -> ActionId {
        let last_of = |pos: Option<usize>| pos.and_then(|p| history.get(p)?.last().copied());
        match *self {
            NamedStrategy::Always(action) => action,
            NamedStrategy::TitForTat { opening } => {
                last_of(opponent(self_id, ids)).unwrap_or(opening)
            }
            NamedStrategy::GrimTrigger { cooperate, defect } => {
                let betrayed = opponent(self_id, ids)
                    .and_then(|p| history.get(p))
                    .map_or(false, |actions| actions.iter().any(|a| *a != cooperate));
                if betrayed {
                    defect
                } else {
                    cooperate
                }
            }
            NamedStrategy::Alternate { first, second } => {
                let played = own(self_id, ids)
                    .and_then(|p| history.get(p))
                    .map_or(0, Vec::len);
                if played % 2 == 0 {
                    first
                } else {
                    second
                }
            }
            NamedStrategy::Pavlov { cooperate, defect } => {
                match (last_of(own(self_id, ids)), last_of(opponent(self_id, ids))) {
                    (Some(mine), Some(theirs)) if mine == theirs => mine,
                    (Some(mine), Some(_)) => {
                        if mine == cooperate {
                            defect
                        } else {
                            cooperate
                        }
                    }
                    _ => cooperate,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NamedStrategy, Strategy};

    const C: usize = 0;
    const D: usize = 1;

    #[test]
    fn test_tit_for_tat() {
        let s = NamedStrategy::TitForTat { opening: C };
        assert_eq!(s.decide(7, &[7, 3], &[vec![], vec![]]), C);
        assert_eq!(s.decide(7, &[7, 3], &[vec![C], vec![D]]), D);
        assert_eq!(s.decide(3, &[7, 3], &[vec![D, C], vec![C, C]]), C);
    }

    #[test]
    fn test_grim_trigger_never_forgives() {
        let s = NamedStrategy::GrimTrigger {
            cooperate: C,
            defect: D,
        };
        assert_eq!(s.decide(0, &[0, 1], &[vec![C, C], vec![C, C]]), C);
        assert_eq!(s.decide(0, &[0, 1], &[vec![C, C, D], vec![C, D, C]]), D);
    }

    #[test]
    fn test_alternate_and_always() {
        let s = NamedStrategy::Alternate {
            first: D,
            second: C,
        };
        assert_eq!(s.decide(1, &[0, 1], &[vec![], vec![]]), D);
        assert_eq!(s.decide(1, &[0, 1], &[vec![C], vec![D]]), C);
        assert_eq!(s.decide(1, &[0, 1], &[vec![C, C], vec![D, C]]), D);
        assert_eq!(NamedStrategy::Always(D).decide(0, &[0, 1], &[vec![], vec![]]), D);
    }

    #[test]
    fn test_pavlov() {
        let s = NamedStrategy::Pavlov {
            cooperate: C,
            defect: D,
        };
        assert_eq!(s.decide(0, &[0, 1], &[vec![], vec![]]), C);
        assert_eq!(s.decide(0, &[0, 1], &[vec![C], vec![C]]), C);
        assert_eq!(s.decide(0, &[0, 1], &[vec![C], vec![D]]), D);
        assert_eq!(s.decide(0, &[0, 1], &[vec![D], vec![D]]), D);
        assert_eq!(s.decide(0, &[0, 1], &[vec![D], vec![C]]), C);
    }

    #[test]
    fn test_strategy_by_name() {
        let s: NamedStrategy =
            serde_json::from_str(r#"{"name": "tit_for_tat", "opening": 0}"#).unwrap();
        assert_eq!(s, NamedStrategy::TitForTat { opening: 0 });
        let json = serde_json::to_value(NamedStrategy::GrimTrigger {
            cooperate: 0,
            defect: 1,
        })
        .unwrap();
        assert_eq!(json["name"], "grim_trigger");
    }
}
