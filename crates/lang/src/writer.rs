//! Re-emission of a program as modelling-language source.
//!
//! The emitted text is canonical (spacing, `equals` for `emit`) but parses
//! back to a structurally equal [`Program`].

use crate::{
    Application, BinaryOp, Command, DisplaceTarget, Expr, Operand, Program, Scenario, StanzaKind,
    Substance, Target, UnaryOp,
};
use core::fmt::Write;
use primitives::YearRange;
use std::string::String;

impl Program {
    /// Writes the program back out as source text.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        if let Some(about) = &self.about {
            out.push_str("start about\n");
            out.push_str(about);
            if !about.is_empty() && !about.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("end about\n\n");
        }
        if let Some(default) = &self.default {
            out.push_str("start default\n");
            for application in &default.applications {
                write_application(&mut out, application, StanzaKind::Default);
            }
            out.push_str("end default\n\n");
        }
        for policy in &self.policies {
            let _ = writeln!(out, "start policy \"{}\"", policy.name);
            for application in &policy.applications {
                write_application(&mut out, application, StanzaKind::Policy);
            }
            out.push_str("end policy\n\n");
        }
        if !self.simulations.is_empty() {
            out.push_str("start simulations\n");
            for scenario in &self.simulations {
                write_scenario(&mut out, scenario);
            }
            out.push_str("end simulations\n");
        }
        out
    }
}

fn write_application(out: &mut String, application: &Application, kind: StanzaKind) {
    let lead = match kind {
        StanzaKind::Default => "define",
        StanzaKind::Policy => "modify",
    };
    let _ = writeln!(out, "  {lead} application \"{}\"", application.name);
    for substance in &application.substances {
        write_substance(out, substance, lead);
    }
    out.push_str("  end application\n");
}

fn write_substance(out: &mut String, substance: &Substance, lead: &str) {
    let _ = writeln!(out, "    {lead} substance \"{}\"", substance.name);
    for command in &substance.commands {
        out.push_str("      ");
        write_command(out, command);
        out.push('\n');
    }
    out.push_str("    end substance\n");
}

fn write_command(out: &mut String, command: &Command) {
    match command {
        Command::InitialCharge {
            value,
            target,
            during,
        } => {
            out.push_str("initial charge with ");
            write_operand(out, value);
            let _ = write!(out, " for {target}");
            write_during(out, during);
        }
        Command::Equals { value, during } => {
            out.push_str("equals ");
            write_operand(out, value);
            write_during(out, during);
        }
        Command::Recharge {
            population,
            volume,
            during,
        } => {
            out.push_str("recharge ");
            write_operand(out, population);
            out.push_str(" with ");
            write_operand(out, volume);
            write_during(out, during);
        }
        Command::Recycle {
            recovery,
            yield_rate,
            displacement,
            during,
        } => {
            out.push_str("recover ");
            write_operand(out, recovery);
            out.push_str(" with ");
            write_operand(out, yield_rate);
            out.push_str(" reuse");
            if let Some(displacement) = displacement {
                out.push_str(" displacing ");
                write_operand(out, displacement);
            }
            write_during(out, during);
        }
        Command::Replace {
            amount,
            stream,
            destination,
            during,
        } => {
            out.push_str("replace ");
            write_operand(out, amount);
            let _ = write!(out, " of {stream} with \"{destination}\"");
            write_during(out, during);
        }
        Command::Set {
            target,
            value,
            during,
        } => {
            out.push_str("set ");
            write_target(out, target);
            out.push_str(" to ");
            write_operand(out, value);
            write_during(out, during);
        }
        Command::Change {
            target,
            delta,
            during,
        } => {
            out.push_str("change ");
            write_target(out, target);
            out.push_str(" by ");
            write_operand(out, delta);
            write_during(out, during);
        }
        Command::Retire { amount, during } => {
            out.push_str("retire ");
            write_operand(out, amount);
            write_during(out, during);
        }
        Command::Cap {
            stream,
            value,
            displacing,
            during,
        } => {
            let _ = write!(out, "cap {stream} to ");
            write_operand(out, value);
            write_displacing(out, displacing);
            write_during(out, during);
        }
        Command::Floor {
            stream,
            value,
            displacing,
            during,
        } => {
            let _ = write!(out, "floor {stream} to ");
            write_operand(out, value);
            write_displacing(out, displacing);
            write_during(out, during);
        }
        Command::Limit {
            stream,
            lower,
            upper,
            during,
        } => {
            let _ = write!(out, "limit {stream} to [");
            if let Some(lower) = lower {
                write_operand(out, lower);
            }
            out.push_str(", ");
            if let Some(upper) = upper {
                write_operand(out, upper);
            }
            out.push(']');
            write_during(out, during);
        }
        Command::Define { name, value } => {
            let _ = write!(out, "define {name} as ");
            write_operand(out, value);
        }
        Command::Enable { stream } => {
            let _ = write!(out, "enable {stream}");
        }
    }
}

fn write_target(out: &mut String, target: &Target) {
    match target {
        Target::Stream(stream) => {
            let _ = write!(out, "{stream}");
        }
        Target::Variable(name) => out.push_str(name),
    }
}

fn write_displacing(out: &mut String, displacing: &Option<DisplaceTarget>) {
    match displacing {
        Some(DisplaceTarget::Stream(stream)) => {
            let _ = write!(out, " displacing {stream}");
        }
        Some(DisplaceTarget::Substance(name)) => {
            let _ = write!(out, " displacing \"{name}\"");
        }
        None => {}
    }
}

fn write_during(out: &mut String, during: &Option<YearRange>) {
    if let Some(range) = during {
        // YearRange displays in source form: `year 3` / `years 3 to 5`.
        let _ = write!(out, " during {range}");
    }
}

fn write_scenario(out: &mut String, scenario: &Scenario) {
    let _ = write!(out, "  simulate \"{}\"", scenario.name);
    for (index, policy) in scenario.policies.iter().enumerate() {
        let word = if index == 0 { "using" } else { "then" };
        let _ = write!(out, " {word} \"{policy}\"");
    }
    let _ = write!(out, " from years {} to {}", scenario.start, scenario.end);
    if scenario.trials != 1 {
        let _ = write!(out, " across {} trials", scenario.trials);
    }
    out.push('\n');
}

fn write_operand(out: &mut String, operand: &Operand) {
    write_expr(out, &operand.expr, 0, false);
    if !operand.unit.is_scalar() {
        let _ = write!(out, " {}", operand.unit);
    }
}

/// Precedence levels used to decide where parentheses are required for the
/// emission to re-parse into the same tree.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Conditional { .. } => 1,
        Expr::Binary { op, .. } => match op {
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge => 2,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Mul | BinaryOp::Div => 4,
            BinaryOp::Pow => 5,
        },
        Expr::Unary { .. } => 6,
        Expr::Number(_) | Expr::Variable(_) | Expr::Limit { .. } | Expr::SampleNormal { .. }
        | Expr::SampleUniform { .. } => 7,
    }
}

const fn op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Pow => "^",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::Le => "<=",
        BinaryOp::Ge => ">=",
    }
}

/// Writes an expression, parenthesizing wherever reparsing would otherwise
/// associate differently. `min_prec` is the loosest precedence the context
/// accepts without parentheses; `tighten` additionally forces parentheses at
/// exactly `min_prec` (right side of left-associative operators, left side
/// of `^`).
fn write_expr(out: &mut String, expr: &Expr, min_prec: u8, tighten: bool) {
    let prec = precedence(expr);
    let needs_parens = prec < min_prec || (tighten && prec == min_prec);
    if needs_parens {
        out.push('(');
        write_expr(out, expr, 0, false);
        out.push(')');
        return;
    }
    match expr {
        Expr::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Expr::Variable(name) => out.push_str(name),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => {
            out.push('-');
            write_expr(out, operand, 6, false);
        }
        Expr::Binary { op, left, right } => {
            let (left_tighten, right_tighten) = match op {
                BinaryOp::Pow => (true, false),
                _ => (false, true),
            };
            write_expr(out, left, prec, left_tighten);
            let _ = write!(out, " {} ", op_str(*op));
            write_expr(out, right, prec, right_tighten);
        }
        Expr::Conditional {
            then,
            condition,
            otherwise,
        } => {
            write_expr(out, then, 2, false);
            out.push_str(" if ");
            write_expr(out, condition, 2, false);
            out.push_str(" else ");
            write_expr(out, otherwise, 1, false);
            out.push_str(" endif");
        }
        Expr::Limit {
            value,
            lower,
            upper,
        } => {
            out.push_str("limit ");
            write_expr(out, value, 3, false);
            out.push_str(" to [");
            if let Some(lower) = lower {
                write_expr(out, lower, 3, false);
            }
            out.push_str(", ");
            if let Some(upper) = upper {
                write_expr(out, upper, 3, false);
            }
            out.push(']');
        }
        Expr::SampleNormal { mean, std } => {
            out.push_str("sample normally from mean of ");
            write_expr(out, mean, 3, false);
            out.push_str(" std of ");
            write_expr(out, std, 3, false);
        }
        Expr::SampleUniform { low, high } => {
            out.push_str("sample uniformly from ");
            write_expr(out, low, 3, false);
            out.push_str(" to ");
            write_expr(out, high, 3, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn round_trip(source: &str) -> Program {
        let first = Program::from_source(source).unwrap();
        let emitted = first.to_source();
        let second = Program::from_source(&emitted)
            .unwrap_or_else(|e| panic!("re-parse failed: {e}\n---\n{emitted}"));
        assert_eq!(first, second, "round trip changed the program:\n{emitted}");
        first
    }

    #[test]
    fn full_program_round_trips() {
        round_trip(
            r#"
start about
  Projection of cooling-sector flows.
end about

start default
  define application "domestic refrigeration"
    define substance "HFC-134a"
      enable domestic
      initial charge with 0.5 kg / unit for sales
      equals 1430 tCO2e / mt
      recharge 10 % with 0.3 kg / unit
      set priorEquipment to 100 units during year 1
      change sales by 5 % / year during years 2 to onwards
    end substance
  end application
end default

start policy "Recovery"
  modify application "domestic refrigeration"
    modify substance "HFC-134a"
      recover 30 % with 90 % reuse displacing 100 % during years 3 to onwards
      cap sales to 85 % displacing "HFC-32"
      floor domestic to 1 mt
      replace 10 % of sales with "HFC-32" during years 5 to onwards
      limit domestic to [, 2 mt]
      retire 5 %
    end substance
  end application
end policy

start simulations
  simulate "BAU" from years 1 to 10
  simulate "With recovery" using "Recovery" from years 1 to 10
end simulations
"#,
        );
    }

    #[test]
    fn expressions_round_trip_with_parentheses() {
        round_trip(
            r#"
start default
  define application "A"
    define substance "X"
      define base as 2 + 3 * 4
      define tricky as (2 + 3) * 4
      define nested as 2 ^ 3 ^ 2
      define shifted as (2 + 3) - (4 - 1)
      define chosen as base if base > 10 else -base endif
      define clamped as limit base - 1 to [0, 10]
      set domestic to chosen kg
    end substance
  end application
end default
"#,
        );
    }

    #[test]
    fn incompatible_programs_still_emit() {
        let source = r#"
start default
  define application "A"
    define substance "X"
      set domestic to sample uniformly from 1 to 2 kg
    end substance
  end application
end default
"#;
        let program = Program::from_source(source).unwrap();
        assert!(!program.is_compatible());
        let emitted = program.to_source();
        let reparsed = Program::from_source(&emitted).unwrap();
        assert_eq!(program, reparsed);
    }
}
