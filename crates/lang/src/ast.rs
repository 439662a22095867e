//! The typed program model.

use primitives::{StreamId, UnitSpec, YearRange};
use std::{string::String, vec::Vec};

/// An immutable parsed program.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    /// Raw text of the `about` stanza, if present.
    pub about: Option<String>,
    /// The `default` stanza.
    pub default: Option<DefaultStanza>,
    /// Named `policy` stanzas, in declaration order.
    pub policies: Vec<PolicyStanza>,
    /// Scenarios from the `simulations` stanza, in declaration order.
    pub simulations: Vec<Scenario>,
}

impl Program {
    /// Looks up a policy stanza by name.
    pub fn policy(&self, name: &str) -> Option<&PolicyStanza> {
        self.policies.iter().find(|p| p.name == name)
    }

    /// Reasons this program cannot be executed, empty when compatible.
    pub fn incompatibilities(&self) -> Vec<&str> {
        let mut reasons = Vec::new();
        let stanza_substances = self
            .default
            .iter()
            .flat_map(|d| d.applications.iter())
            .chain(self.policies.iter().flat_map(|p| p.applications.iter()))
            .flat_map(|a| a.substances.iter());
        for substance in stanza_substances {
            reasons.extend(substance.incompatibilities.iter().map(String::as_str));
        }
        for scenario in &self.simulations {
            reasons.extend(scenario.incompatibilities.iter().map(String::as_str));
        }
        reasons
    }

    /// Whether the simplified object model can execute this program.
    pub fn is_compatible(&self) -> bool {
        self.incompatibilities().is_empty()
    }
}

/// Which stanza kind a substance body was parsed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StanzaKind {
    /// The `default` stanza of definitions.
    Default,
    /// A `policy` stanza of modifications.
    Policy,
}

impl StanzaKind {
    /// The stanza name used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Policy => "policy",
        }
    }
}

/// The `default` stanza: application definitions.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefaultStanza {
    /// Applications defined by the baseline.
    pub applications: Vec<Application>,
}

/// A named `policy` stanza: application modifications.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyStanza {
    /// The policy name scenarios refer to.
    pub name: String,
    /// Applications the policy touches.
    pub applications: Vec<Application>,
}

/// An application block holding substance bodies.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Application {
    /// The application name.
    pub name: String,
    /// Substances defined or modified under this application.
    pub substances: Vec<Substance>,
}

/// A substance body: an ordered command list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Substance {
    /// The substance name.
    pub name: String,
    /// Commands in lexical order.
    pub commands: Vec<Command>,
    /// Reasons this body cannot execute (placement violations, sampling,
    /// disallowed duplicates). Parsing still succeeds so the source can
    /// round-trip.
    pub incompatibilities: Vec<String>,
}

/// A simulation scenario.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scenario {
    /// The scenario name.
    pub name: String,
    /// Policies applied after the default, in listed order.
    pub policies: Vec<String>,
    /// First simulated year.
    pub start: i32,
    /// Final simulated year, inclusive.
    pub end: i32,
    /// Requested trial count. Counts above one flag the scenario
    /// incompatible; execution is deterministic.
    pub trials: u32,
    /// Reasons this scenario cannot execute.
    pub incompatibilities: Vec<String>,
}

/// Placement class of a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Placement {
    /// Legal only in the `default` stanza.
    Definition,
    /// Legal only in `policy` stanzas.
    Policy,
    /// Legal in both.
    Any,
}

/// A substance-body command.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// `initial charge with V for T`
    InitialCharge {
        /// Charge per new unit.
        value: Operand,
        /// `domestic`, `import`, `export`, or `sales` (both substreams).
        target: StreamId,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `equals V` / `emit V`: GHG or energy intensity, by unit.
    Equals {
        /// Intensity, tCO2e/mass or kwh/mass.
        value: Operand,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `recharge P with V`
    Recharge {
        /// Share of the installed base serviced, %.
        population: Operand,
        /// Substance per serviced unit, kg/unit.
        volume: Operand,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `recover R with Y reuse [displacing D]`
    Recycle {
        /// Share of recharge volume recovered, %.
        recovery: Operand,
        /// Share of recovered volume reusable, %.
        yield_rate: Operand,
        /// Share of recycled volume displacing virgin sales, %.
        displacement: Option<Operand>,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `replace V of T with "S"`
    Replace {
        /// Amount moved.
        amount: Operand,
        /// Stream moved between substances.
        stream: StreamId,
        /// Destination substance under the same application.
        destination: String,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `set T to V`
    Set {
        /// Stream or variable being assigned.
        target: Target,
        /// New value.
        value: Operand,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `change T by V`
    Change {
        /// Stream or variable being shifted.
        target: Target,
        /// Signed delta; `%` and `/ year` resolve against the current value.
        delta: Operand,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `retire V`
    Retire {
        /// Share of the prior population retired, %.
        amount: Operand,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `cap T to V [displacing D]`
    Cap {
        /// Stream being clamped.
        stream: StreamId,
        /// Upper bound.
        value: Operand,
        /// Where the clipped amount goes.
        displacing: Option<DisplaceTarget>,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `floor T to V [displacing D]`
    Floor {
        /// Stream being clamped.
        stream: StreamId,
        /// Lower bound.
        value: Operand,
        /// Where the clipped amount comes from.
        displacing: Option<DisplaceTarget>,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `limit T to [lo, hi]`: two-sided clamp with no displacement.
    Limit {
        /// Stream being clamped.
        stream: StreamId,
        /// Lower bound, open when absent.
        lower: Option<Operand>,
        /// Upper bound, open when absent.
        upper: Option<Operand>,
        /// Optional year gate.
        during: Option<YearRange>,
    },
    /// `define N as V`: binds a variable at the current scope level.
    Define {
        /// Variable name.
        name: String,
        /// Initial value.
        value: Operand,
    },
    /// `enable T`: marks a sales substream as actively traded.
    Enable {
        /// `domestic`, `import`, or `export`.
        stream: StreamId,
    },
}

impl Command {
    /// The command word, for diagnostics and re-emission.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InitialCharge { .. } => "initial charge",
            Self::Equals { .. } => "equals",
            Self::Recharge { .. } => "recharge",
            Self::Recycle { .. } => "recover",
            Self::Replace { .. } => "replace",
            Self::Set { .. } => "set",
            Self::Change { .. } => "change",
            Self::Retire { .. } => "retire",
            Self::Cap { .. } => "cap",
            Self::Floor { .. } => "floor",
            Self::Limit { .. } => "limit",
            Self::Define { .. } => "define",
            Self::Enable { .. } => "enable",
        }
    }

    /// The placement class of the command.
    pub const fn placement(&self) -> Placement {
        match self {
            Self::InitialCharge { .. }
            | Self::Equals { .. }
            | Self::Recharge { .. }
            | Self::Enable { .. } => Placement::Definition,
            Self::Recycle { .. }
            | Self::Replace { .. }
            | Self::Cap { .. }
            | Self::Floor { .. } => Placement::Policy,
            Self::Set { .. }
            | Self::Change { .. }
            | Self::Retire { .. }
            | Self::Limit { .. }
            | Self::Define { .. } => Placement::Any,
        }
    }

    /// The year gate, if the command carries one.
    pub const fn during(&self) -> Option<YearRange> {
        match self {
            Self::InitialCharge { during, .. }
            | Self::Equals { during, .. }
            | Self::Recharge { during, .. }
            | Self::Recycle { during, .. }
            | Self::Replace { during, .. }
            | Self::Set { during, .. }
            | Self::Change { during, .. }
            | Self::Retire { during, .. }
            | Self::Cap { during, .. }
            | Self::Floor { during, .. }
            | Self::Limit { during, .. } => *during,
            Self::Define { .. } | Self::Enable { .. } => None,
        }
    }

    /// Every operand of the command, for sampling detection.
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Self::InitialCharge { value, .. } | Self::Equals { value, .. } => {
                [value].into_iter().collect()
            }
            Self::Recharge {
                population, volume, ..
            } => [population, volume].into_iter().collect(),
            Self::Recycle {
                recovery,
                yield_rate,
                displacement,
                ..
            } => {
                let mut ops: Vec<&Operand> = [recovery, yield_rate].into_iter().collect();
                ops.extend(displacement.as_ref());
                ops
            }
            Self::Replace { amount, .. } => [amount].into_iter().collect(),
            Self::Set { value, .. } | Self::Define { value, .. } => {
                [value].into_iter().collect()
            }
            Self::Change { delta, .. } => [delta].into_iter().collect(),
            Self::Retire { amount, .. } => [amount].into_iter().collect(),
            Self::Cap { value, .. } | Self::Floor { value, .. } => {
                [value].into_iter().collect()
            }
            Self::Limit { lower, upper, .. } => {
                lower.iter().chain(upper.iter()).collect()
            }
            Self::Enable { .. } => Vec::new(),
        }
    }
}

/// What a `set`/`change` command addresses.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    /// A stream of the current substance.
    Stream(StreamId),
    /// A scoped variable.
    Variable(String),
}

/// Where a `cap`/`floor` pushes the clipped amount.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DisplaceTarget {
    /// Another stream of the same substance.
    Stream(StreamId),
    /// The same stream of a sibling substance, by quoted name.
    Substance(String),
}

/// An expression with an optional unit suffix.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Operand {
    /// The numeric expression.
    pub expr: Expr,
    /// The unit suffix; [`UnitSpec::Scalar`] when none was written.
    pub unit: UnitSpec,
}

impl Operand {
    /// Creates an operand.
    pub fn new(expr: Expr, unit: UnitSpec) -> Self {
        Self { expr, unit }
    }

    /// Whether the expression contains stochastic sampling.
    pub fn has_sampling(&self) -> bool {
        self.expr.has_sampling()
    }
}

/// Binary expression operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// Unary expression operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
}

/// A numeric expression.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// A literal.
    Number(f64),
    /// A scoped variable reference (or a reserved engine name).
    Variable(String),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `X if C else Y endif`
    Conditional {
        /// Value when the condition holds.
        then: Box<Expr>,
        /// The condition.
        condition: Box<Expr>,
        /// Value otherwise.
        otherwise: Box<Expr>,
    },
    /// `limit X to [lo, hi]`, either bound open when absent.
    Limit {
        /// The clamped expression.
        value: Box<Expr>,
        /// Lower bound.
        lower: Option<Box<Expr>>,
        /// Upper bound.
        upper: Option<Box<Expr>>,
    },
    /// `sample normally from mean of M std of S`
    SampleNormal {
        /// Mean.
        mean: Box<Expr>,
        /// Standard deviation.
        std: Box<Expr>,
    },
    /// `sample uniformly from L to H`
    SampleUniform {
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
    },
}

impl Expr {
    /// Whether the expression tree contains a sampling node.
    pub fn has_sampling(&self) -> bool {
        match self {
            Self::Number(_) | Self::Variable(_) => false,
            Self::Unary { operand, .. } => operand.has_sampling(),
            Self::Binary { left, right, .. } => left.has_sampling() || right.has_sampling(),
            Self::Conditional {
                then,
                condition,
                otherwise,
            } => then.has_sampling() || condition.has_sampling() || otherwise.has_sampling(),
            Self::Limit {
                value,
                lower,
                upper,
            } => {
                value.has_sampling()
                    || lower.as_ref().is_some_and(|e| e.has_sampling())
                    || upper.as_ref().is_some_and(|e| e.has_sampling())
            }
            Self::SampleNormal { .. } | Self::SampleUniform { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_is_found_anywhere_in_the_tree() {
        let sample = Expr::SampleUniform {
            low: Box::new(Expr::Number(1.0)),
            high: Box::new(Expr::Number(2.0)),
        };
        let nested = Expr::Binary {
            op: BinaryOp::Add,
            left: Box::new(Expr::Number(1.0)),
            right: Box::new(Expr::Limit {
                value: Box::new(sample),
                lower: None,
                upper: Some(Box::new(Expr::Number(9.0))),
            }),
        };
        assert!(nested.has_sampling());
        assert!(!Expr::Number(1.0).has_sampling());
    }

    #[test]
    fn placement_classes() {
        let op = Operand::new(Expr::Number(1.0), UnitSpec::Scalar);
        let recharge = Command::Recharge {
            population: op.clone(),
            volume: op.clone(),
            during: None,
        };
        assert_eq!(recharge.placement(), Placement::Definition);
        let cap = Command::Cap {
            stream: StreamId::Domestic,
            value: op.clone(),
            displacing: None,
            during: None,
        };
        assert_eq!(cap.placement(), Placement::Policy);
        let retire = Command::Retire {
            amount: op,
            during: None,
        };
        assert_eq!(retire.placement(), Placement::Any);
    }
}
