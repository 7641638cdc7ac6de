use std::collections::BTreeSet;

use crate::analysis::domain::{Environment, Variable};
use crate::error::EngineResult;
use crate::ir::bridge::instruction::Instruction;
use crate::ir::bridge::method::Method;
use crate::ir::bridge::typing::Type;
use crate::ir::bridge::value::Place;
use crate::pointer::resolver::Initializer;

/// Integer locals assigned in the method, in order of first assignment
pub fn integer_locals(method: &Method) -> Vec<Variable> {
    let mut seen = BTreeSet::new();
    let mut vars = vec![];
    for inst in method.instructions() {
        if let Instruction::Assign {
            target: Place::Local(local),
            ..
        } = inst
        {
            if local.ty == Type::Int && seen.insert(local.name.clone()) {
                vars.push(local.name.clone());
            }
        }
    }
    vars
}

/// Universe of a method: its integer locals followed by one ghost variable per
/// interval object constructed in it
pub fn build_environment(
    method: &Method,
    initializers: &[&Initializer],
) -> EngineResult<Environment> {
    let mut vars = integer_locals(method);
    vars.extend(initializers.iter().map(|init| init.ghost()));
    Environment::new(vars)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::flow::shared::convert;

    #[test]
    fn first_assignment_order() {
        let class = convert(json!({
            "name": "C",
            "methods": [{
                "name": "m",
                "params": ["int"],
                "locals": {
                    "a": "int",
                    "b": "int",
                    "d": "double",
                    "o": {"object": "Interval"},
                    "unused": "int"
                },
                "body": [
                    {"assign": {"target": {"local": "b"}, "value": {"param": 0}}},
                    {"assign": {"target": {"local": "o"}, "value": "null"}},
                    {"assign": {"target": {"local": "a"}, "value": {"int": 1}}},
                    {"assign": {"target": {"local": "b"}, "value": {"local": "a"}}},
                    {"if": {"cond": {"lt": [{"local": "unused"}, {"int": 0}]}, "target": 5}},
                    "return_void"
                ]
            }]
        }))
        .unwrap();

        let vars = integer_locals(&class.methods[0]);
        let names: Vec<_> = vars.iter().map(|v| v.as_ref()).collect();
        assert_eq!(names, vec!["b", "a"]);

        let env = build_environment(&class.methods[0], &[]).unwrap();
        assert_eq!(env.to_string(), "[b, a]");
    }

    #[test]
    fn no_body() {
        let class = convert(json!({
            "name": "C",
            "methods": [{"name": "m", "params": ["int"]}]
        }))
        .unwrap();
        assert!(build_environment(&class.methods[0], &[]).unwrap().is_empty());
    }
}
