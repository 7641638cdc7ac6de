use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use log::{debug, info};

use crate::analysis::domain::Variable;
use crate::error::{EngineError, EngineResult, Unsupported};
use crate::ir::bridge::class::{Class, Site};
use crate::ir::bridge::instruction::{Instruction, Invoke, InvokeKind};
use crate::ir::bridge::shared::Identifier;
use crate::ir::bridge::value::{Expr, Local};
use crate::pointer::pointsto::{AllocNode, FlowPointsTo, PointsToOracle};
use crate::settings::Settings;
use timeguard_shared::config::CONSTRUCTOR_NAME;

/// A construction of an interval object: `<init>(start, end)` on a fresh allocation
#[derive(PartialEq, Clone, Debug)]
pub struct Initializer {
    /// class-wide identity, in order of discovery
    pub id: usize,
    /// the constructor call
    pub site: Site,
    /// the object being constructed
    pub node: AllocNode,
    pub start: i32,
    pub end: Expr,
}

impl Initializer {
    /// Variable that keeps the end bound of this object in numeric states
    pub fn ghost(&self) -> Variable {
        Identifier::from(self.to_string()).member("end")
    }
}

impl Display for Initializer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "AbstractObject{}", self.id)
    }
}

/// A call of the query method on an interval object
#[derive(PartialEq, Clone, Debug)]
pub struct QuerySite {
    pub site: Site,
    pub receiver: Local,
    pub time: Expr,
}

/// Maps constructor calls and query receivers of a class to initializers
pub struct Resolver {
    oracle: Box<dyn PointsToOracle>,
    interval_class: String,
    query_method: String,
    /// indexed by id
    initializers: Vec<Initializer>,
    by_site: BTreeMap<Site, usize>,
    by_node: BTreeMap<AllocNode, usize>,
    queries: BTreeMap<usize, Vec<QuerySite>>,
}

impl Resolver {
    /// Build the resolver on top of the flow-sensitive points-to analysis
    pub fn new(class: &Class, settings: &Settings) -> EngineResult<Self> {
        let oracle = FlowPointsTo::analyze(class)?;
        Self::with_oracle(class, settings, Box::new(oracle))
    }

    pub fn with_oracle(
        class: &Class,
        settings: &Settings,
        oracle: Box<dyn PointsToOracle>,
    ) -> EngineResult<Self> {
        let mut resolver = Self {
            oracle,
            interval_class: settings.interval_class.clone(),
            query_method: settings.query_method.clone(),
            initializers: vec![],
            by_site: BTreeMap::new(),
            by_node: BTreeMap::new(),
            queries: BTreeMap::new(),
        };

        for (id, method) in class.methods.iter().enumerate() {
            // constructors of the analyzed class itself are not scanned
            if method.is_constructor() {
                continue;
            }
            for (index, inst) in method.instructions().iter().enumerate() {
                let Instruction::Invoke(invoke) = inst else {
                    continue;
                };
                let site = Site { method: id, index };
                if resolver.is_initializer(invoke) {
                    resolver.register_initializer(site, invoke)?;
                } else if resolver.is_query(invoke) {
                    resolver.register_query(site, invoke)?;
                }
            }
        }

        info!(
            "class {}: {} initializers, {} query sites",
            class.name,
            resolver.initializers.len(),
            resolver.queries.values().map(|q| q.len()).sum::<usize>()
        );
        Ok(resolver)
    }

    /// Whether the call constructs an interval object
    pub fn is_initializer(&self, invoke: &Invoke) -> bool {
        invoke.kind == InvokeKind::Special
            && invoke.method.as_ref() == CONSTRUCTOR_NAME
            && invoke.class.as_ref() == self.interval_class
    }

    /// Whether the call queries an interval object
    pub fn is_query(&self, invoke: &Invoke) -> bool {
        invoke.kind == InvokeKind::Virtual
            && invoke.method.as_ref() == self.query_method
            && matches!(&invoke.base, Some(base) if base.ty.is_object_of(&self.interval_class))
    }

    fn receiver_of<'a>(site: Site, invoke: &'a Invoke) -> EngineResult<&'a Local> {
        invoke.base.as_ref().ok_or_else(|| {
            EngineError::InvariantViolation(format!("no receiver for {} at {}", invoke, site))
        })
    }

    fn register_initializer(&mut self, site: Site, invoke: &Invoke) -> EngineResult<()> {
        let [start, end] = invoke.args.as_slice() else {
            return Err(EngineError::InvalidAssumption(format!(
                "expect 2 arguments for {} at {}, found {}",
                invoke,
                site,
                invoke.args.len()
            )));
        };
        let start = start.as_int().ok_or_else(|| {
            EngineError::NotSupportedYet(Unsupported::NonConstantStart(format!(
                "{} at {}",
                invoke, site
            )))
        })?;

        let receiver = Self::receiver_of(site, invoke)?;
        let nodes = self.oracle.nodes_at(site, receiver);
        let node = match nodes.iter().next() {
            Some(node) if nodes.len() == 1 => *node,
            _ => {
                return Err(EngineError::NotSupportedYet(
                    Unsupported::AmbiguousAllocation(format!(
                        "{} at {} refers to {} allocations",
                        receiver,
                        site,
                        nodes.len()
                    )),
                ));
            }
        };
        if let Some(prev) = self.by_node.get(&node) {
            return Err(EngineError::NotSupportedYet(
                Unsupported::AmbiguousAllocation(format!(
                    "{} at {} is already constructed at {}",
                    receiver, site, self.initializers[*prev].site
                )),
            ));
        }

        let initializer = Initializer {
            id: self.initializers.len(),
            site,
            node,
            start,
            end: end.clone(),
        };
        debug!(
            "{} at {}: [{}, {}]",
            initializer, site, initializer.start, initializer.end
        );
        self.by_site.insert(site, initializer.id);
        self.by_node.insert(node, initializer.id);
        self.initializers.push(initializer);
        Ok(())
    }

    fn register_query(&mut self, site: Site, invoke: &Invoke) -> EngineResult<()> {
        let [time] = invoke.args.as_slice() else {
            return Err(EngineError::InvalidAssumption(format!(
                "expect 1 argument for {} at {}, found {}",
                invoke,
                site,
                invoke.args.len()
            )));
        };
        let receiver = Self::receiver_of(site, invoke)?;
        self.queries.entry(site.method).or_default().push(QuerySite {
            site,
            receiver: receiver.clone(),
            time: time.clone(),
        });
        Ok(())
    }

    /// All initializers of the class, ordered by id
    pub fn initializers(&self) -> &[Initializer] {
        &self.initializers
    }

    pub fn initializers_of(&self, method: usize) -> Vec<&Initializer> {
        self.initializers
            .iter()
            .filter(|init| init.site.method == method)
            .collect()
    }

    pub fn queries_of(&self, method: usize) -> &[QuerySite] {
        self.queries
            .get(&method)
            .map(|q| q.as_slice())
            .unwrap_or(&[])
    }

    pub fn initializer_at(&self, site: Site) -> Option<&Initializer> {
        self.by_site.get(&site).map(|id| &self.initializers[*id])
    }

    /// Initializers that the reference may denote right before `site`
    pub fn resolve(&self, site: Site, local: &Local) -> Vec<&Initializer> {
        self.oracle
            .nodes_at(site, local)
            .iter()
            .filter_map(|node| self.by_node.get(node))
            .map(|id| &self.initializers[*id])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;

    use super::*;
    use crate::flow::shared::convert;
    use crate::ir::bridge::typing::Type;

    fn interval_local(name: &str) -> Local {
        Local {
            name: name.into(),
            ty: Type::Object("Interval".into()),
        }
    }

    fn new_interval(
        local: &str,
        start: serde_json::Value,
        end: serde_json::Value,
    ) -> [serde_json::Value; 2] {
        [
            json!({"assign": {"target": {"local": local}, "value": {"new": "Interval"}}}),
            json!({"invoke": {
                "kind": "special", "class": "Interval", "method": "<init>",
                "base": local, "args": [start, end]
            }}),
        ]
    }

    fn query(local: &str, time: serde_json::Value) -> serde_json::Value {
        json!({"invoke": {
            "kind": "virtual", "class": "Interval", "method": "query",
            "base": local, "args": [time]
        }})
    }

    fn method(name: &str, body: Vec<serde_json::Value>) -> serde_json::Value {
        json!({
            "name": name,
            "locals": {
                "e": {"object": "Interval"},
                "foo": {"object": "Interval"},
                "k": "int"
            },
            "body": body
        })
    }

    #[test]
    fn identities_are_class_wide() {
        let mut m1 = vec![];
        m1.extend(new_interval("e", json!({"int": 1}), json!({"int": 2})));
        m1.push(query("e", json!({"int": 1})));
        m1.push(json!("return_void"));
        let mut m2 = vec![];
        m2.extend(new_interval("e", json!({"int": 0}), json!({"local": "k"})));
        m2.extend(new_interval("foo", json!({"int": 3}), json!({"int": 4})));
        m2.push(json!("return_void"));
        let class = convert(json!({
            "name": "Basic",
            "methods": [method("m1", m1), method("m2", m2)]
        }))
        .unwrap();

        let resolver = Resolver::new(&class, &Settings::default()).unwrap();
        let ids: Vec<_> = resolver.initializers().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(resolver.initializers_of(1).len(), 2);
        assert_eq!(resolver.initializers_of(1)[0].ghost().as_ref(), "AbstractObject1.end");
        assert_eq!(resolver.initializers_of(1)[1].start, 3);

        let init = resolver
            .initializer_at(Site {
                method: 0,
                index: 1,
            })
            .unwrap();
        assert_eq!(init.end, Expr::Int(2));
        assert!(resolver
            .initializer_at(Site {
                method: 0,
                index: 0
            })
            .is_none());

        let queries = resolver.queries_of(0);
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].time, Expr::Int(1));
        assert!(resolver.queries_of(1).is_empty());

        let resolved = resolver.resolve(queries[0].site, &queries[0].receiver);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, 0);
    }

    #[test]
    fn aliasing_through_copy() {
        let mut body = vec![];
        body.extend(new_interval("e", json!({"int": 2}), json!({"int": 5})));
        body.extend(new_interval("foo", json!({"int": 1}), json!({"int": 2})));
        body.push(json!({"assign": {"target": {"local": "foo"}, "value": {"local": "e"}}}));
        body.push(query("foo", json!({"int": 3})));
        body.push(json!("return_void"));
        let class = convert(json!({"name": "Pointer", "methods": [method("m", body)]})).unwrap();

        let resolver = Resolver::new(&class, &Settings::default()).unwrap();
        let q = &resolver.queries_of(0)[0];
        let resolved: Vec<_> = resolver.resolve(q.site, &q.receiver).iter().map(|i| i.id).collect();
        assert_eq!(resolved, vec![0]);
    }

    #[test]
    fn non_constant_start() {
        let mut body = vec![];
        body.extend(new_interval("e", json!({"local": "k"}), json!({"int": 5})));
        body.push(json!("return_void"));
        let class = convert(json!({"name": "C", "methods": [method("m", body)]})).unwrap();
        assert!(matches!(
            Resolver::new(&class, &Settings::default()),
            Err(EngineError::NotSupportedYet(Unsupported::NonConstantStart(_)))
        ));
    }

    #[test]
    fn construction_without_allocation() {
        let class = convert(json!({
            "name": "C",
            "methods": [{
                "name": "m",
                "params": [{"object": "Interval"}],
                "locals": {"e": {"object": "Interval"}},
                "body": [
                    {"assign": {"target": {"local": "e"}, "value": {"param": 0}}},
                    {"invoke": {
                        "kind": "special", "class": "Interval", "method": "<init>",
                        "base": "e", "args": [{"int": 0}, {"int": 1}]
                    }},
                    "return_void"
                ]
            }]
        }))
        .unwrap();
        assert!(matches!(
            Resolver::new(&class, &Settings::default()),
            Err(EngineError::NotSupportedYet(Unsupported::AmbiguousAllocation(_)))
        ));
    }

    #[test]
    fn wrong_arity() {
        let body = vec![
            json!({"assign": {"target": {"local": "e"}, "value": {"new": "Interval"}}}),
            json!({"invoke": {
                "kind": "special", "class": "Interval", "method": "<init>",
                "base": "e", "args": [{"int": 0}]
            }}),
            json!("return_void"),
        ];
        let class = convert(json!({"name": "C", "methods": [method("m", body)]})).unwrap();
        assert!(matches!(
            Resolver::new(&class, &Settings::default()),
            Err(EngineError::InvalidAssumption(_))
        ));
    }

    #[test]
    fn constructors_and_other_classes_skipped() {
        let mut init_body = vec![];
        init_body.extend(new_interval("e", json!({"local": "k"}), json!({"int": 5})));
        init_body.push(json!("return_void"));
        let other = vec![
            json!({"assign": {"target": {"local": "e"}, "value": {"new": "Interval"}}}),
            json!({"invoke": {
                "kind": "special", "class": "Span", "method": "<init>",
                "base": "e", "args": []
            }}),
            query("e", json!({"int": 0})),
            json!("return_void"),
        ];
        let class = convert(json!({
            "name": "C",
            "methods": [method("<init>", init_body), method("m", other)]
        }))
        .unwrap();

        let resolver = Resolver::new(&class, &Settings::default()).unwrap();
        assert!(resolver.initializers().is_empty());
        let q = &resolver.queries_of(1)[0];
        assert!(resolver.resolve(q.site, &q.receiver).is_empty());
    }

    struct Nothing;

    impl PointsToOracle for Nothing {
        fn nodes_at(&self, _site: Site, _local: &Local) -> BTreeSet<AllocNode> {
            BTreeSet::new()
        }
    }

    #[test]
    fn custom_oracle() {
        let body = vec![query("e", json!({"int": 0})), json!("return_void")];
        let class = convert(json!({"name": "C", "methods": [method("m", body)]})).unwrap();
        let resolver =
            Resolver::with_oracle(&class, &Settings::default(), Box::new(Nothing)).unwrap();
        assert!(resolver.resolve(resolver.queries_of(0)[0].site, &interval_local("e")).is_empty());
    }
}
