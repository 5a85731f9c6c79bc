//! Tree-walking evaluator.

use ngl_core::{
    Array, Object, Value, format_number, is_truthy, loose_equals, strict_equals,
    to_display_string, to_number, type_name,
};

use crate::ast::{AssignOp, BinaryOp, Expr, Literal, LogicalOp, Program, Property, UnaryOp};
use crate::error::EvalError;

/// Name resolution for expressions.
///
/// Implemented by the runtime scope: `lookup` reads through to ancestors,
/// `assign` always binds locally.
pub trait Environment {
    /// `None` when `name` is bound nowhere.
    fn lookup(&self, name: &str) -> Option<Value>;

    fn assign(&self, name: &str, value: Value);
}

/// Evaluates parsed expressions against one [`Environment`].
pub struct Interpreter<'env> {
    env: &'env dyn Environment,
}

impl<'env> Interpreter<'env> {
    #[must_use]
    pub fn new(env: &'env dyn Environment) -> Self {
        Self { env }
    }

    /// Evaluate every statement, returning the last value.
    pub fn run(&self, program: &Program) -> Result<Value, EvalError> {
        let mut last = Value::Undefined;
        for statement in &program.statements {
            last = self.eval(statement)?;
        }
        Ok(last)
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Identifier(name) => self
                .env
                .lookup(name)
                .ok_or_else(|| EvalError::Reference(name.clone())),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Array, _>>()
                .map(Value::from),
            Expr::Object(props) => {
                let object = Object::new();
                for (key, value) in props {
                    object.insert(key.as_str(), self.eval(value)?);
                }
                Ok(Value::from(object))
            }
            Expr::Member { object, property } => {
                let target = self.eval(object)?;
                let key = self.property_key(property)?;
                get_member(&target, &key)
            }
            Expr::Call { callee, args } => {
                let callee_value = self.eval(callee)?;
                let Value::Function(function) = callee_value else {
                    return Err(EvalError::Type(format!(
                        "{} is not a function",
                        describe_target(callee)
                    )));
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(function.call(&args))
            }
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                match (op, is_truthy(&left)) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if is_truthy(&self.eval(test)?) {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
            Expr::Assign { op, target, value } => self.assignment(*op, target, value),
        }
    }

    /// Store `value` at the location `target` names.
    pub fn assign_to(&self, target: &Expr, value: Value) -> Result<(), EvalError> {
        match target {
            Expr::Identifier(name) => {
                self.env.assign(name, value);
                Ok(())
            }
            Expr::Member { object, property } => {
                let object = self.eval(object)?;
                let key = self.property_key(property)?;
                set_member(&object, &key, value)
            }
            _ => Err(EvalError::Type("invalid assignment target".to_owned())),
        }
    }

    fn assignment(&self, op: AssignOp, target: &Expr, value: &Expr) -> Result<Value, EvalError> {
        let result = match op.binary() {
            None => self.eval(value)?,
            Some(arith) => {
                // Compound assignment reads the current value first, so an
                // unbound identifier is a reference error.
                let current = self.eval(target)?;
                let rhs = self.eval(value)?;
                binary(arith, &current, &rhs)
            }
        };
        self.assign_to(target, result.clone())?;
        Ok(result)
    }

    fn unary(&self, op: UnaryOp, operand: &Expr) -> Result<Value, EvalError> {
        if op == UnaryOp::Typeof {
            if let Expr::Identifier(name) = operand {
                let value = self.env.lookup(name).unwrap_or_default();
                return Ok(Value::from(type_name(&value)));
            }
        }
        let value = self.eval(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!is_truthy(&value)),
            UnaryOp::Neg => Value::Number(-to_number(&value)),
            UnaryOp::Plus => Value::Number(to_number(&value)),
            UnaryOp::Typeof => Value::from(type_name(&value)),
        })
    }

    fn property_key(&self, property: &Property) -> Result<Value, EvalError> {
        match property {
            Property::Named(name) => Ok(Value::from(name.as_str())),
            Property::Computed(expr) => self.eval(expr),
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::from(s.as_str()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
        Literal::Undefined => Value::Undefined,
    }
}

fn describe_target(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(name) => name.clone(),
        Expr::Member {
            object,
            property: Property::Named(name),
        } => format!("{}.{name}", describe_target(object)),
        _ => "expression".to_owned(),
    }
}

/// Array index for `key`, if it is a non-negative integral number or its
/// canonical string form.
fn array_index(key: &Value) -> Option<usize> {
    let n = match key {
        Value::Number(n) => *n,
        Value::String(s) => {
            let n: f64 = s.parse().ok()?;
            if format_number(n) != **s {
                return None;
            }
            n
        }
        _ => return None,
    };
    (n >= 0.0 && n.fract() == 0.0 && n < usize::MAX as f64).then_some(n as usize)
}

fn get_member(target: &Value, key: &Value) -> Result<Value, EvalError> {
    let name = to_display_string(key);
    let value = match target {
        Value::Undefined | Value::Null => {
            return Err(EvalError::Type(format!(
                "cannot read property '{name}' of {}",
                to_display_string(target)
            )));
        }
        Value::Object(object) => object.get(&name),
        Value::Scope(scope) => scope.lookup(&name),
        Value::Array(items) if name == "length" => Some(Value::from(items.len() as f64)),
        Value::Array(items) => array_index(key).and_then(|index| items.get(index)),
        Value::String(s) if name == "length" => Some(Value::from(s.chars().count() as f64)),
        Value::String(s) => array_index(key)
            .and_then(|index| s.chars().nth(index))
            .map(|c| Value::from(c.to_string())),
        Value::Function(function) if name == "length" => {
            Some(Value::from(function.params().len() as f64))
        }
        Value::Pattern(pattern) => match name.as_str() {
            "source" => Some(Value::from(pattern.source())),
            "flags" => Some(Value::from(pattern.flags())),
            _ => None,
        },
        _ => None,
    };
    Ok(value.unwrap_or_default())
}

fn set_member(target: &Value, key: &Value, value: Value) -> Result<(), EvalError> {
    let name = to_display_string(key);
    match target {
        Value::Object(object) => object.insert(name, value),
        Value::Scope(scope) => scope.assign(&name, value),
        Value::Array(items) => match array_index(key) {
            Some(index) => items.set(index, value),
            None => {
                return Err(EvalError::Type(format!(
                    "cannot set property '{name}' of an array"
                )));
            }
        },
        Value::Undefined | Value::Null => {
            return Err(EvalError::Type(format!(
                "cannot set property '{name}' of {}",
                to_display_string(target)
            )));
        }
        // Writes to members of primitives are silently dropped.
        _ => {}
    }
    Ok(())
}

/// Reduce a composite to a scalar the way `+` and relational operators do.
fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Array(_)
        | Value::Object(_)
        | Value::Function(_)
        | Value::Pattern(_)
        | Value::Scope(_)
        | Value::Opaque(_) => Value::from(to_display_string(value)),
        Value::Date(ms) => Value::Number(*ms),
        other => other.clone(),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            let (l, r) = (to_primitive(left), to_primitive(right));
            if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
                let mut joined = to_display_string(&l);
                joined.push_str(&to_display_string(&r));
                Value::from(joined)
            } else {
                Value::Number(to_number(&l) + to_number(&r))
            }
        }
        BinaryOp::Sub => Value::Number(to_number(left) - to_number(right)),
        BinaryOp::Mul => Value::Number(to_number(left) * to_number(right)),
        BinaryOp::Div => Value::Number(to_number(left) / to_number(right)),
        BinaryOp::Rem => Value::Number(to_number(left) % to_number(right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            Value::Bool(compare(op, &to_primitive(left), &to_primitive(right)))
        }
        BinaryOp::Eq => Value::Bool(loose_equals(left, right)),
        BinaryOp::NotEq => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_equals(left, right)),
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    if let (Value::String(l), Value::String(r)) = (left, right) {
        return match op {
            BinaryOp::Lt => l < r,
            BinaryOp::Le => l <= r,
            BinaryOp::Gt => l > r,
            _ => l >= r,
        };
    }
    let (l, r) = (to_number(left), to_number(right));
    match op {
        BinaryOp::Lt => l < r,
        BinaryOp::Le => l <= r,
        BinaryOp::Gt => l > r,
        _ => l >= r,
    }
}
