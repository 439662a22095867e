//! Expression evaluation against the engine scope.

use crate::{Engine, EngineError};
use lang::{BinaryOp, Expr, IncompatibleProgram, Operand, UnaryOp};
use primitives::Value;

impl Engine {
    /// Evaluates an expression to a plain number.
    ///
    /// Variables resolve through the scope; the reserved year names resolve
    /// through the engine. Sampling nodes are unreachable in compatible
    /// programs and error here.
    pub fn eval(&self, expr: &Expr) -> Result<f64, EngineError> {
        Ok(match expr {
            Expr::Number(n) => *n,
            Expr::Variable(name) => self.get_variable(name)?.magnitude(),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => -self.eval(operand)?,
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                match op {
                    BinaryOp::Add => left + right,
                    BinaryOp::Sub => left - right,
                    BinaryOp::Mul => left * right,
                    BinaryOp::Div => left / right,
                    BinaryOp::Pow => left.powf(right),
                    BinaryOp::Eq => bool_to_num(left == right),
                    BinaryOp::Ne => bool_to_num(left != right),
                    BinaryOp::Lt => bool_to_num(left < right),
                    BinaryOp::Gt => bool_to_num(left > right),
                    BinaryOp::Le => bool_to_num(left <= right),
                    BinaryOp::Ge => bool_to_num(left >= right),
                }
            }
            Expr::Conditional {
                then,
                condition,
                otherwise,
            } => {
                if self.eval(condition)? != 0.0 {
                    self.eval(then)?
                } else {
                    self.eval(otherwise)?
                }
            }
            Expr::Limit {
                value,
                lower,
                upper,
            } => {
                let mut result = self.eval(value)?;
                if let Some(upper) = upper {
                    result = result.min(self.eval(upper)?);
                }
                if let Some(lower) = lower {
                    result = result.max(self.eval(lower)?);
                }
                result
            }
            Expr::SampleNormal { .. } | Expr::SampleUniform { .. } => {
                return Err(IncompatibleProgram::new(
                    "stochastic sampling cannot be executed",
                )
                .into())
            }
        })
    }

    /// Evaluates an operand into a value carrying its unit suffix.
    pub fn operand_value(&self, operand: &Operand) -> Result<Value, EngineError> {
        Ok(Value::new(self.eval(&operand.expr)?, operand.unit))
    }
}

fn bool_to_num(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lang::{Expr, Operand};
    use primitives::{Unit, UnitSpec};

    fn engine() -> Engine {
        let mut engine = Engine::new(2025, 2030);
        engine.set_stanza("default");
        engine
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn arithmetic_and_precedence_results() {
        let engine = engine();
        let expr = Expr::Binary {
            op: BinaryOp::Add,
            left: num(2.0),
            right: Box::new(Expr::Binary {
                op: BinaryOp::Pow,
                left: num(3.0),
                right: num(2.0),
            }),
        };
        assert_eq!(engine.eval(&expr).unwrap(), 11.0);
    }

    #[test]
    fn conditionals_select_branches() {
        let engine = engine();
        let expr = Expr::Conditional {
            then: num(1.0),
            condition: Box::new(Expr::Binary {
                op: BinaryOp::Gt,
                left: num(5.0),
                right: num(3.0),
            }),
            otherwise: num(2.0),
        };
        assert_eq!(engine.eval(&expr).unwrap(), 1.0);
    }

    #[test]
    fn limit_clamps_both_sides() {
        let engine = engine();
        let clamp = |v: f64| Expr::Limit {
            value: num(v),
            lower: Some(num(0.0)),
            upper: Some(num(10.0)),
        };
        assert_eq!(engine.eval(&clamp(-4.0)).unwrap(), 0.0);
        assert_eq!(engine.eval(&clamp(4.0)).unwrap(), 4.0);
        assert_eq!(engine.eval(&clamp(40.0)).unwrap(), 10.0);
    }

    #[test]
    fn variables_and_reserved_names() {
        let mut engine = engine();
        engine.define_variable("x", Value::scalar(7.0)).unwrap();
        assert_eq!(engine.eval(&Expr::Variable("x".into())).unwrap(), 7.0);
        assert_eq!(
            engine.eval(&Expr::Variable("yearAbsolute".into())).unwrap(),
            2025.0
        );
        assert!(matches!(
            engine.eval(&Expr::Variable("missing".into())),
            Err(EngineError::Variable(_))
        ));
    }

    #[test]
    fn sampling_errors_out() {
        let engine = engine();
        let expr = Expr::SampleUniform {
            low: num(1.0),
            high: num(2.0),
        };
        assert!(matches!(
            engine.eval(&expr),
            Err(EngineError::Incompatible(_))
        ));
    }

    #[test]
    fn operand_carries_unit() {
        let engine = engine();
        let operand = Operand::new(Expr::Number(10.0), UnitSpec::Base(Unit::Kg));
        assert_eq!(
            engine.operand_value(&operand).unwrap(),
            Value::of(10.0, Unit::Kg)
        );
    }
}
