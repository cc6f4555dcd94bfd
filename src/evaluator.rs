use crate::ast::{self, Expression, Operator, Statement};
use crate::builtins;
use crate::environment::Environment;
use crate::object::{EvalError, FunctionObject, Object, Result};
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;
use tracing::{debug, trace};

/// Nested user-function calls allowed before evaluation fails with
/// `EvalError::StackOverflow`.
pub const MAX_CALL_DEPTH: usize = 2048;

/// Unwraps an operand's value, handing errors and pending returns straight
/// back to the caller.
macro_rules! operand {
    ($result:expr) => {
        match $result? {
            ret @ Object::ReturnValue(_) => return Ok(ret),
            value => value,
        }
    };
}

/// Evaluate a program against `env`, which keeps any top-level `let`
/// bindings afterwards. Frames the program left unreachable are collected
/// before returning.
#[tracing::instrument(level = "debug", skip_all)]
pub fn eval(program: &ast::Program, env: &Environment) -> Result<Object> {
    let result = Evaluator::default().eval_program(program, env);

    let freed = env.collect(result.as_ref().ok());
    debug!(freed, live = env.live_frames(), "collected frames");

    result
}

#[derive(Default)]
struct Evaluator {
    call_depth: usize,
}

impl Evaluator {
    fn eval_program(&mut self, program: &ast::Program, env: &Environment) -> Result<Object> {
        let mut result = Object::Null;

        for stmt in program.statements.iter() {
            result = self.eval_statement(stmt, env)?;
            if let Object::ReturnValue(value) = result {
                return Ok(*value);
            }
        }

        Ok(result)
    }

    /// A `return` stays wrapped here so enclosing blocks stop as well; only
    /// the call boundary unwraps it.
    fn eval_block_statement(
        &mut self,
        block: &ast::BlockStatement,
        env: &Environment,
    ) -> Result<Object> {
        let mut result = Object::Null;

        for stmt in block.statements.iter() {
            result = self.eval_statement(stmt, env)?;
            if result.is_return_value() {
                return Ok(result);
            }
        }

        Ok(result)
    }

    fn eval_statement(&mut self, stmt: &Statement, env: &Environment) -> Result<Object> {
        match stmt {
            Statement::Expr(stmt) => self.eval_expression(&stmt.expression, env),
            Statement::Let(stmt) => {
                let value = operand!(self.eval_expression(&stmt.value, env));
                env.set(&stmt.name.value, value);
                Ok(Object::Null)
            }
            Statement::Return(stmt) => {
                let value = operand!(self.eval_expression(&stmt.return_value, env));
                Ok(Object::ReturnValue(Box::new(value)))
            }
        }
    }

    fn eval_expression(&mut self, expr: &Expression, env: &Environment) -> Result<Object> {
        ensure_sufficient_stack(|| -> Result<Object> {
            match expr {
                Expression::Identifier(ident) => eval_identifier(ident, env),
                Expression::IntegerLiteral(int) => Ok(Object::Integer(int.value)),
                Expression::Boolean(b) => Ok(Object::Boolean(b.value)),
                Expression::String(s) => Ok(Object::String(s.value.clone())),
                Expression::Prefix(prefix) => {
                    let right = operand!(self.eval_expression(&prefix.right, env));
                    eval_prefix_expression(prefix.operator, right)
                }
                Expression::Infix(infix) => {
                    let left = operand!(self.eval_expression(&infix.left, env));
                    let right = operand!(self.eval_expression(&infix.right, env));
                    eval_infix_expression(infix.operator, left, right)
                }
                Expression::If(expr) => self.eval_if_expression(expr, env),
                Expression::Function(func) => Ok(FunctionObject {
                    parameters: func.parameters.clone(),
                    body: Rc::clone(&func.body),
                    env: env.capture(),
                }
                .into()),
                Expression::Call(call) => {
                    let function = operand!(self.eval_expression(&call.function, env));

                    let mut args = Vec::with_capacity(call.arguments.len());
                    for arg in call.arguments.iter() {
                        args.push(operand!(self.eval_expression(arg, env)));
                    }

                    self.apply_function(function, args, env)
                }
            }
        })
    }

    fn eval_if_expression(&mut self, expr: &ast::IfExpression, env: &Environment) -> Result<Object> {
        let condition = operand!(self.eval_expression(&expr.condition, env));

        if condition.truth_value() {
            self.eval_block_statement(&expr.consequence, env)
        } else if let Some(alt) = &expr.alternative {
            self.eval_block_statement(alt, env)
        } else {
            Ok(Object::Null)
        }
    }

    fn apply_function(
        &mut self,
        function: Object,
        args: Vec<Object>,
        env: &Environment,
    ) -> Result<Object> {
        match function {
            Object::Function(func) => {
                if args.len() != func.parameters.len() {
                    return Err(EvalError::IncorrectArity {
                        got: args.len(),
                        want: func.parameters.len(),
                    });
                }
                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(EvalError::StackOverflow);
                }

                // Enclosed by the defining scope, not the caller's.
                let call_env = env.enclose(func.env);
                for (param, arg) in func.parameters.iter().zip(args) {
                    call_env.set(&param.value, arg);
                }

                self.call_depth += 1;
                trace!(depth = self.call_depth, "call");
                let result = self.eval_block_statement(&func.body, &call_env);
                self.call_depth -= 1;

                Ok(result?.unwrap_return())
            }
            Object::Builtin(builtin) => {
                trace!(name = builtin.name, "builtin call");
                builtin.call(args)
            }
            obj => Err(EvalError::NotAFunction {
                type_name: obj.type_name(),
            }),
        }
    }
}

fn eval_identifier(ident: &ast::Identifier, env: &Environment) -> Result<Object> {
    env.get(&ident.value)
        .or_else(|| builtins::lookup(&ident.value).map(Object::Builtin))
        .ok_or_else(|| EvalError::IdentifierNotFound {
            id: ident.value.clone(),
        })
}

fn eval_prefix_expression(operator: Operator, right: Object) -> Result<Object> {
    match operator {
        Operator::Bang => Ok(Object::Boolean(!right.truth_value())),
        Operator::Minus => match right {
            Object::Integer(n) => Ok(Object::Integer(n.wrapping_neg())),
            obj => Err(EvalError::UnknownPrefixOperator {
                operator,
                operand: obj.type_name(),
            }),
        },
        _ => Err(EvalError::UnknownPrefixOperator {
            operator,
            operand: right.type_name(),
        }),
    }
}

fn eval_infix_expression(operator: Operator, left: Object, right: Object) -> Result<Object> {
    match (&left, &right) {
        (Object::Integer(x), Object::Integer(y)) => eval_integer_infix_expression(operator, *x, *y),
        (Object::String(x), Object::String(y)) => eval_string_infix_expression(operator, x, y),
        _ => match operator {
            Operator::Eq => Ok(Object::Boolean(left == right)),
            Operator::NotEq => Ok(Object::Boolean(left != right)),
            _ => Err(EvalError::binary_op_error(
                left.type_name(),
                operator,
                right.type_name(),
            )),
        },
    }
}

fn eval_integer_infix_expression(operator: Operator, left: i64, right: i64) -> Result<Object> {
    Ok(match operator {
        Operator::Plus => Object::Integer(left.wrapping_add(right)),
        Operator::Minus => Object::Integer(left.wrapping_sub(right)),
        Operator::Asterisk => Object::Integer(left.wrapping_mul(right)),
        Operator::Slash => {
            if right == 0 {
                return Err(EvalError::DivisionByZero);
            }
            Object::Integer(left.wrapping_div(right))
        }
        Operator::LT => Object::Boolean(left < right),
        Operator::GT => Object::Boolean(left > right),
        Operator::Eq => Object::Boolean(left == right),
        Operator::NotEq => Object::Boolean(left != right),
        Operator::Bang => {
            return Err(EvalError::UnknownInfixOperator {
                left: "INTEGER",
                operator,
                right: "INTEGER",
            })
        }
    })
}

fn eval_string_infix_expression(operator: Operator, left: &str, right: &str) -> Result<Object> {
    match operator {
        Operator::Plus => Ok(Object::String(format!("{}{}", left, right))),
        Operator::Eq => Ok(Object::Boolean(left == right)),
        Operator::NotEq => Ok(Object::Boolean(left != right)),
        _ => Err(EvalError::UnknownInfixOperator {
            left: "STRING",
            operator,
            right: "STRING",
        }),
    }
}
