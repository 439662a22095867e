//! Post-parse validation of substance bodies and scenarios.
//!
//! Violations never fail parsing; they accumulate as incompatibility reasons
//! on the node so callers can still round-trip the source.

use crate::{Command, Placement, PlacementError, Scenario, StanzaKind, Substance};
use primitives::{StreamId, UnitFamily};
use std::{
    format,
    string::{String, ToString},
    vec::Vec,
};

/// Collects commands for one substance body and validates placement,
/// duplicate, and sampling rules as they arrive.
#[derive(Debug)]
pub(crate) struct SubstanceBuilder {
    name: String,
    stanza: StanzaKind,
    commands: Vec<Command>,
    incompatibilities: Vec<String>,
    ungated_ghg: bool,
    ungated_energy: bool,
    ungated_recharge: bool,
    ungated_charges: Vec<StreamId>,
    enabled: Vec<StreamId>,
}

impl SubstanceBuilder {
    pub(crate) fn new(name: String, stanza: StanzaKind) -> Self {
        Self {
            name,
            stanza,
            commands: Vec::new(),
            incompatibilities: Vec::new(),
            ungated_ghg: false,
            ungated_energy: false,
            ungated_recharge: false,
            ungated_charges: Vec::new(),
            enabled: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, command: Command) {
        self.check_placement(&command);
        self.check_duplicates(&command);
        if command.operands().iter().any(|op| op.has_sampling()) {
            self.incompatibilities.push(format!(
                "stochastic sampling in `{}` for substance \"{}\"",
                command.name(),
                self.name
            ));
        }
        self.commands.push(command);
    }

    pub(crate) fn finish(self) -> Substance {
        Substance {
            name: self.name,
            commands: self.commands,
            incompatibilities: self.incompatibilities,
        }
    }

    fn check_placement(&mut self, command: &Command) {
        let allowed = match command.placement() {
            Placement::Definition => self.stanza == StanzaKind::Default,
            Placement::Policy => self.stanza == StanzaKind::Policy,
            Placement::Any => true,
        };
        if !allowed {
            self.incompatibilities.push(
                PlacementError {
                    command: command.name().into(),
                    stanza: self.stanza.as_str().into(),
                }
                .to_string(),
            );
        }
    }

    /// Commands that re-parameterise the whole year may appear once without
    /// a year gate; gated instances may coexist.
    fn check_duplicates(&mut self, command: &Command) {
        match command {
            // One ungated `equals` is allowed per intensity family: GHG
            // (tCO2e/mass) and energy (kwh/mass) coexist.
            Command::Equals {
                value,
                during: None,
            } => {
                let slot = match value.unit.numerator().map(|u| u.family()) {
                    Some(UnitFamily::Energy) => &mut self.ungated_energy,
                    _ => &mut self.ungated_ghg,
                };
                if *slot {
                    self.duplicate("equals");
                } else {
                    *slot = true;
                }
            }
            Command::Recharge { during: None, .. } => {
                if self.ungated_recharge {
                    self.duplicate("recharge");
                }
                self.ungated_recharge = true;
            }
            Command::InitialCharge {
                target,
                during: None,
                ..
            } => {
                if self.ungated_charges.contains(target) {
                    self.duplicate("initial charge");
                } else {
                    self.ungated_charges.push(*target);
                }
            }
            Command::Enable { stream } => {
                if self.enabled.contains(stream) {
                    self.duplicate("enable");
                } else {
                    self.enabled.push(*stream);
                }
            }
            _ => {}
        }
    }

    fn duplicate(&mut self, command: &str) {
        self.incompatibilities.push(format!(
            "duplicate `{command}` for substance \"{}\"",
            self.name
        ));
    }
}

/// Applies scenario-level compatibility rules.
pub(crate) fn validate_scenario(scenario: &mut Scenario) {
    if scenario.trials > 1 {
        scenario.incompatibilities.push(format!(
            "scenario \"{}\" requests {} trials; execution is deterministic",
            scenario.name, scenario.trials
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expr, Operand};
    use primitives::UnitSpec;

    fn operand() -> Operand {
        Operand::new(Expr::Number(1.0), UnitSpec::Scalar)
    }

    fn recharge() -> Command {
        Command::Recharge {
            population: operand(),
            volume: operand(),
            during: None,
        }
    }

    #[test]
    fn definition_command_in_policy_marks_incompatible() {
        let mut builder = SubstanceBuilder::new("X".into(), StanzaKind::Policy);
        builder.push(recharge());
        let substance = builder.finish();
        assert_eq!(substance.incompatibilities.len(), 1);
        assert!(substance.incompatibilities[0].contains("recharge"));
        // The command is still kept for round-tripping.
        assert_eq!(substance.commands.len(), 1);
    }

    #[test]
    fn ungated_duplicates_mark_incompatible() {
        let mut builder = SubstanceBuilder::new("X".into(), StanzaKind::Default);
        builder.push(recharge());
        builder.push(recharge());
        let substance = builder.finish();
        assert_eq!(substance.incompatibilities.len(), 1);
        assert!(substance.incompatibilities[0].contains("duplicate"));
    }

    #[test]
    fn gated_instances_may_coexist() {
        let mut builder = SubstanceBuilder::new("X".into(), StanzaKind::Default);
        builder.push(recharge());
        builder.push(Command::Recharge {
            population: operand(),
            volume: operand(),
            during: Some(primitives::YearRange::single(3)),
        });
        assert!(builder.finish().incompatibilities.is_empty());
    }

    #[test]
    fn ghg_and_energy_intensities_coexist() {
        use primitives::{Unit, UnitSpec};
        let equals = |num: Unit| Command::Equals {
            value: Operand::new(Expr::Number(1.0), UnitSpec::Ratio(num, Unit::Kg)),
            during: None,
        };
        let mut builder = SubstanceBuilder::new("X".into(), StanzaKind::Default);
        builder.push(equals(Unit::Tco2e));
        builder.push(equals(Unit::Kwh));
        assert!(builder.finish().incompatibilities.is_empty());

        let mut builder = SubstanceBuilder::new("X".into(), StanzaKind::Default);
        builder.push(equals(Unit::Tco2e));
        builder.push(equals(Unit::Tco2e));
        assert_eq!(builder.finish().incompatibilities.len(), 1);
    }

    #[test]
    fn sampling_marks_incompatible() {
        let mut builder = SubstanceBuilder::new("X".into(), StanzaKind::Default);
        builder.push(Command::Set {
            target: crate::Target::Variable("x".into()),
            value: Operand::new(
                Expr::SampleNormal {
                    mean: Box::new(Expr::Number(1.0)),
                    std: Box::new(Expr::Number(0.1)),
                },
                UnitSpec::Scalar,
            ),
            during: None,
        });
        let substance = builder.finish();
        assert_eq!(substance.incompatibilities.len(), 1);
        assert!(substance.incompatibilities[0].contains("sampling"));
    }

    #[test]
    fn excess_trials_mark_scenario_incompatible() {
        let mut scenario = Scenario {
            name: "mc".into(),
            policies: Vec::new(),
            start: 1,
            end: 5,
            trials: 100,
            incompatibilities: Vec::new(),
        };
        validate_scenario(&mut scenario);
        assert_eq!(scenario.incompatibilities.len(), 1);
    }
}
