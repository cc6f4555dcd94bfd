use crate::object::*;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};

pub type BuiltinFn = fn(Vec<Object>) -> Result<Object>;

/// A native function. Builtins are looked up by name only after the
/// environment chain comes up empty, so a user binding shadows them.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    func: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, args: Vec<Object>) -> Result<Object> {
        (self.func)(args)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

fn len(args: Vec<Object>) -> Result<Object> {
    match args.as_slice() {
        [Object::String(s)] => Ok(Object::Integer(s.len() as i64)),
        [obj] => Err(EvalError::UnsupportedArgType {
            fn_name: "len",
            type_name: obj.type_name(),
        }),
        _ => Err(EvalError::IncorrectArity {
            got: args.len(),
            want: 1,
        }),
    }
}

fn count(args: Vec<Object>) -> Result<Object> {
    match args.as_slice() {
        [Object::String(haystack), Object::String(needle)] => Ok(Object::Integer(
            haystack.matches(needle.as_str()).count() as i64,
        )),
        [Object::String(_), obj] => Err(EvalError::UnsupportedArgAt {
            fn_name: "count",
            position: 1,
            type_name: obj.type_name(),
        }),
        [obj, _] => Err(EvalError::UnsupportedArgAt {
            fn_name: "count",
            position: 0,
            type_name: obj.type_name(),
        }),
        _ => Err(EvalError::IncorrectArity {
            got: args.len(),
            want: 2,
        }),
    }
}

lazy_static! {
    static ref BUILTINS: HashMap<&'static str, Builtin> = vec![
        Builtin { name: "len", func: len },
        Builtin { name: "count", func: count },
    ]
    .into_iter()
    .map(|builtin| (builtin.name, builtin))
    .collect();
}

pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.get(name).copied()
}

#[cfg(test)]
mod test {
    use super::*;

    fn call(name: &str, args: Vec<Object>) -> Result<Object> {
        lookup(name).expect("builtin exists").call(args)
    }

    #[test]
    fn test_len() {
        assert_eq!(call("len", vec!["".into()]), Ok(Object::Integer(0)));
        assert_eq!(call("len", vec!["four".into()]), Ok(Object::Integer(4)));
        assert_eq!(
            call("len", vec![Object::Integer(1)]).map_err(|e| e.to_string()),
            Err("argument to `len` not supported, got INTEGER".to_owned())
        );
        assert_eq!(
            call("len", vec!["one".into(), "two".into()]).map_err(|e| e.to_string()),
            Err("wrong number of arguments. got=2, want=1".to_owned())
        );
    }

    #[test]
    fn test_count() {
        assert_eq!(call("count", vec!["banana".into(), "a".into()]), Ok(Object::Integer(3)));
        assert_eq!(call("count", vec!["aaaa".into(), "aa".into()]), Ok(Object::Integer(2)));
        assert_eq!(call("count", vec!["abc".into(), "".into()]), Ok(Object::Integer(4)));
        assert_eq!(
            call("count", vec![Object::Integer(1), "a".into()]).map_err(|e| e.to_string()),
            Err("argument 0 to `count` not supported, got INTEGER".to_owned())
        );
        assert_eq!(
            call("count", vec!["a".into(), true.into()]).map_err(|e| e.to_string()),
            Err("argument 1 to `count` not supported, got BOOLEAN".to_owned())
        );
        assert_eq!(
            call("count", vec!["a".into()]).map_err(|e| e.to_string()),
            Err("wrong number of arguments. got=1, want=2".to_owned())
        );
    }

    #[test]
    fn test_unknown_name() {
        assert!(lookup("print").is_none());
    }
}
