use thiserror::Error;

/// Structural mismatch between the declared players/actions and the data
/// handed to a table, learner or simulator. Always detected at construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("game needs at least one player")]
    NoPlayers,
    #[error("game needs at least one action")]
    NoActions,
    #[error("player {0:?} declared twice")]
    DuplicatePlayer(String),
    #[error("action {0} declared twice")]
    DuplicateAction(String),
    #[error("profile {profile} has {got} actions, expected {expected}")]
    ProfileLength {
        profile: String,
        expected: usize,
        got: usize,
    },
    #[error("profile {profile} uses undeclared action {action}")]
    UnknownAction { profile: String, action: String },
    #[error("profile {profile} has {got} payoffs, expected {expected}")]
    PayoffLength {
        profile: String,
        expected: usize,
        got: usize,
    },
    #[error("profile {0} has a payoff that is not a finite number")]
    NotANumber(String),
    #[error("profile {0} listed twice")]
    DuplicateProfile(String),
    #[error("payoff table has {got} entries, expected {expected}")]
    EntryCount { expected: usize, got: usize },
    #[error("{actions} actions and {players} players do not fit in memory")]
    TooLarge { actions: usize, players: usize },
    #[error("unknown player {0:?}")]
    UnknownPlayer(String),
    #[error("no data given for player {0:?}")]
    MissingPlayer(String),
    #[error("expected data for {expected} players, got {got}")]
    PlayerCount { expected: usize, got: usize },
    #[error("belief of player {player:?} has shape {got:?}, expected {expected:?}")]
    BeliefShape {
        player: String,
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("initial weights of player {player:?} have length {got}, expected {expected}")]
    InitialWeights {
        player: String,
        expected: usize,
        got: usize,
    },
    #[error("population game needs exactly 2 players, table has {0}")]
    NotTwoPlayer(usize),
    #[error("strategy {0:?} declared twice")]
    DuplicateStrategy(String),
    #[error("no strategies declared")]
    NoStrategies,
    #[error("strategy {0:?} has no agent count")]
    MissingDistribution(String),
    #[error("agent count given for undeclared strategy {0:?}")]
    UnknownStrategy(String),
    #[error("odd number of agents: {0}")]
    OddPopulation(usize),
    #[error("strategy chose action id {action}, game has {actions} actions")]
    ActionOutOfRange { action: usize, actions: usize },
}

/// Degenerate arithmetic while redistributing agents between strategies.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArithmeticError {
    #[error("total payoff of all strategies is {0}, shares are undefined")]
    ZeroTotalPayoff(f64),
    #[error("strategy {index} would receive {share} agents")]
    NegativeShare { index: usize, share: f64 },
    #[error("rounded shares sum to {assigned} agents, only {total} available")]
    NegativeRemainder { assigned: usize, total: usize },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, value: impl ToString) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
