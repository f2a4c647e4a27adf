use super::*;
use dependent::{always, never, predicate, quantum_requires, topology_requires};
use frontend::{check_program, CompileError, Decl, Invariant, TypeRef, MAX_DEPTH};
use insta::assert_snapshot as snap;
use itertools::Itertools;
use traits::Missing;

fn int() -> Type {
    Type::basic("int")
}
fn float() -> Type {
    Type::basic("float")
}
fn number() -> Type {
    Type::basic("number")
}
fn real() -> Type {
    Type::basic("real")
}

fn topology(base: Type, props: &[(TopologyProperty, bool)]) -> Type {
    let mut t = TopologyType::new(base);
    for &(prop, value) in props {
        t.set_property(prop, value);
    }
    t.into()
}

fn quantum(base: Type, props: &[(QuantumProperty, bool)]) -> Type {
    let mut t = QuantumType::new(base);
    for &(prop, value) in props {
        t.set_property(prop, value);
    }
    t.into()
}

fn ctx<T, F>(f: F) -> T
where
    F: for<'a> FnOnce(&TypeContext<'a>) -> T,
{
    let config = Config::default();
    f(&config.context())
}

use QuantumProperty::*;
use TopologyProperty::*;

#[test]
fn basic_subtyping() {
    ctx(|ctx| {
        assert!(ctx.is_subtype(&int(), &number()));
        assert!(!ctx.is_subtype(&number(), &int()));
        assert!(ctx.is_subtype(&int(), &int()));
        assert!(!ctx.is_subtype(&int(), &float()));
    })
}

#[test]
fn hierarchy_is_transitive() {
    let hierarchy = Hierarchy::default().with("number", "real");
    assert!(int().is_subtype_of(&real(), &hierarchy));
    assert!(!real().is_subtype_of(&int(), &hierarchy));
    assert_eq!(hierarchy.supertypes("int"), vec!["number", "real"]);
}

#[test]
fn hierarchy_with_cycle_terminates() {
    let hierarchy = Hierarchy::empty().with("a", "b").with("b", "a");
    assert!(hierarchy.is_subtype("a", "b"));
    assert!(hierarchy.is_subtype("b", "a"));
    assert!(!hierarchy.is_subtype("a", "c"));
    assert_eq!(hierarchy.supertypes("a"), vec!["b"]);
}

#[test]
fn hierarchy_display() {
    snap!(Hierarchy::default().to_string(), @"float <: number, int <: number");
}

#[test]
fn refinement_kinds_are_invariant() {
    ctx(|ctx| {
        let topo = topology(int(), &[(Continuous, true)]);
        assert!(!ctx.is_subtype(&topo, &quantum(int(), &[])));
        assert!(!ctx.is_subtype(&topo, &int()));
        assert!(!ctx.is_subtype(&int(), &topo));
        assert!(ctx.is_subtype(&topo, &topology(number(), &[])));
        assert!(!ctx.is_subtype(&topology(number(), &[]), &topo));
    })
}

#[test]
fn unset_properties_do_not_hold() {
    let topo = TopologyType::new(real());
    assert!(!topo.traits.verify_path_connected());
    assert!(!topo.traits.verify_manifold());
    assert!(!topo.verify_continuity());
    assert!(!topo.verify());
    assert_eq!(topo.traits.state(Compact), PropertyState::Unset);
    assert_eq!(topo.traits.get(Compact), None);

    let q = QuantumType::new(int());
    assert!(!q.traits.verify_quantum_gate());
    assert!(!q.traits.verify_measurement());
    assert!(!q.verify());
}

#[test]
fn set_property_overwrites() {
    let mut traits = TopologyTraits::new();
    assert_eq!(traits.set_property(Compact, false), None);
    assert_eq!(traits.set_property(Compact, true), Some(false));
    assert!(traits.verify_property(Compact));
    assert_eq!(traits.len(), 1);
    snap!(traits.with(Hausdorff, false).to_string(), @"{COMPACT, !HAUSDORFF}");
}

#[test]
fn property_names() {
    assert_eq!(
        AnyProperty::from_name("locally_compact"),
        Some(AnyProperty::Topology(LocallyCompact))
    );
    assert_eq!(
        AnyProperty::from_name("Entangled"),
        Some(AnyProperty::Quantum(Entangled))
    );
    assert_eq!(AnyProperty::from_name("smooth"), None);
}

#[test]
fn topological_constraint_cites_missing_property() {
    let t = topology(
        real(),
        &[(Connected, true), (Continuous, true), (Compact, false)],
    );

    let config = Config::default();
    let mut system = ConstraintSystem::new(config.context());
    system.add_constraint(Constraint::topological(&t).unwrap());

    assert!(!system.verify_all());
    assert_eq!(system.failures().len(), 1);

    let (index, failure) = &system.failures()[0];
    assert_eq!(*index, 0);
    assert_eq!(
        failure.missing(),
        &[Missing {
            property: AnyProperty::Topology(Compact),
            state: PropertyState::False
        }]
    );
    snap!(failure.to_string(), @"Topology<real> does not have COMPACT (false)");
}

#[test]
fn unset_and_false_are_reported_apart() {
    let t = topology(real(), &[(Connected, false)]);
    let failure = ctx(|ctx| Constraint::topological(&t).unwrap().check(ctx)).unwrap_err();
    snap!(failure.to_string(), @"Topology<real> does not have CONNECTED (false), CONTINUOUS (unset), COMPACT (unset)");
}

#[test]
fn quantum_constraint_holds() {
    let t = quantum(
        int(),
        &[(Unitary, true), (Normalized, true), (Entangled, true)],
    );
    ctx(|ctx| assert!(Constraint::quantum(&t).unwrap().verify(ctx)));
}

#[test]
fn constraint_over_wrong_kind() {
    let t = topology(int(), &[]);
    let err = Constraint::quantum(&t).unwrap_err();
    assert_eq!(
        err,
        ConstructionError::KindMismatch {
            constraint: "quantum",
            expected: TypeKind::Quantum,
            found: "Topology<int>".to_string(),
            found_kind: TypeKind::Topology,
        }
    );
    snap!(err.to_string(), @"quantum constraint needs a quantum type, but `Topology<int>` is a topology type");

    assert!(Constraint::topological(&int()).is_err());
    assert!(Constraint::mapping(MappingKind::Homotopy, &t, &int()).is_err());
}

#[test]
fn composite_dependent_type() {
    let dep = DependentTypeBuilder::create_composite_dependent_type(
        int(),
        vec![always(), always()],
        vec![always()],
    );
    assert!(int().verify());
    assert!(dep.verify());

    let dep = DependentTypeBuilder::create_composite_dependent_type(
        int(),
        vec![always(), always()],
        vec![never()],
    );
    assert!(!dep.verify());
    snap!(
        ctx(|ctx| ctx.verify_dependent(&dep)).unwrap_err().to_string(),
        @"Dependent<int> fails its quantum refinement"
    );
}

#[test]
fn quantum_dependent_is_sugar() {
    let bases = [
        int(),
        quantum(int(), &[(Normalized, true)]),
        quantum(int(), &[]),
    ];

    for base in bases.iter() {
        for q in [always(), never(), predicate(|t: &Type| t.kind() == TypeKind::Quantum)] {
            let sugar = DependentTypeBuilder::create_quantum_dependent_type(base.clone(), q.clone());
            let full =
                DependentTypeBuilder::create_refinement_type(base.clone(), always(), always(), q);
            assert_eq!(sugar.verify(), full.verify(), "{}", base);
        }
    }
}

#[test]
fn quantum_refinement() {
    let unitary = |base: Type| {
        DependentTypeBuilder::create_quantum_dependent_type(base, quantum_requires(&[Unitary]))
    };

    assert!(unitary(quantum(int(), &[(Normalized, true), (Unitary, true)])).verify());
    assert!(!unitary(quantum(int(), &[(Normalized, true)])).verify());
    assert!(!unitary(int()).verify());
}

#[test]
fn builder_requires_every_component() {
    let err = DependentTypeBuilder::new()
        .base(int())
        .predicate(always())
        .quantum(always())
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        ConstructionError::MissingComponent {
            component: "topology constraint"
        }
    );
    snap!(err.to_string(), @"dependent type is missing its topology constraint");

    let dep = DependentTypeBuilder::new()
        .base(int())
        .predicate(always())
        .topology(always())
        .quantum(always())
        .build()
        .unwrap();
    assert!(dep.verify());
}

#[test]
fn aggregation_reports_each_failure_once() {
    let (i, n) = (int(), number());

    let config = Config::default();
    let mut system = ConstraintSystem::new(config.context());
    system.add_constraint(Constraint::subtype(&i, &n));
    system.add_constraint(Constraint::subtype(&n, &i));

    assert!(!system.verify_all());
    assert_eq!(system.failures().len(), 1);
    assert_eq!(system.failures()[0].0, 1);
    snap!(system.last_error().unwrap().to_string(), @"number is not a subtype of int");

    let report = system.check();
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures().map(|v| v.index).collect::<Vec<_>>(), vec![1]);
    assert_eq!(report.verdicts[1].subject, "number <: int");
    assert_eq!(report.verdicts[1].kind, ConstraintKind::Subtype);
}

#[test]
fn adding_constraints_flips_the_outcome() {
    let (i, n) = (int(), number());

    let config = Config::default();
    let mut system = ConstraintSystem::new(config.context());
    assert!(system.verify_all());

    system.add_constraint(Constraint::subtype(&i, &n));
    assert!(system.verify_all());

    system.add_labeled("backwards", Constraint::subtype(&n, &i));
    assert!(!system.verify_all());
    assert_eq!(system.check().verdicts[1].subject, "backwards");
}

#[test]
fn composite_stops_at_first_failure() {
    let (i, n, f) = (int(), number(), float());
    let composite = Constraint::composite(vec![
        Constraint::subtype(&i, &n),
        Constraint::subtype(&n, &i),
        Constraint::subtype(&f, &i),
    ]);

    let failure = ctx(|ctx| composite.check(ctx)).unwrap_err();
    snap!(failure.to_string(), @"in part 1: number is not a subtype of int");
    snap!(composite.to_string(), @"composite (int <: number, number <: int, float <: int)");
}

#[test]
fn equality_constraint() {
    let (i, n) = (int(), number());
    ctx(|ctx| {
        assert!(Constraint::equal(&i, &i).verify(ctx));
        assert!(!Constraint::equal(&i, &n).verify(ctx));
    })
}

#[test]
fn dependent_constraint() {
    let base = topology(
        real(),
        &[(Continuous, true), (Connected, true), (Compact, true)],
    );

    let holds: Type = DependentTypeBuilder::create_topological_dependent_type(
        base.clone(),
        topology_requires(&[Compact]),
    )
    .into();
    let fails: Type = DependentTypeBuilder::create_topological_dependent_type(
        base.clone(),
        topology_requires(&[Hausdorff]),
    )
    .into();

    ctx(|ctx| {
        assert!(Constraint::dependent(&base, &holds).unwrap().verify(ctx));

        let failure = Constraint::dependent(&base, &fails)
            .unwrap()
            .check(ctx)
            .unwrap_err();
        snap!(failure.to_string(), @"Dependent<Topology<real>> fails its topological refinement");
    });

    assert!(Constraint::dependent(&base, &base).is_err());
}

#[test]
fn dependent_constraint_over_another_base() {
    let only_int: Type = DependentTypeBuilder::create_refinement_type(
        int(),
        predicate(|t: &Type| t.to_string() == "int"),
        always(),
        always(),
    )
    .into();
    let anything: Type =
        DependentTypeBuilder::create_refinement_type(int(), always(), always(), always()).into();
    let (n, f) = (number(), float());

    ctx(|ctx| {
        assert!(Constraint::dependent(&n, &anything).unwrap().verify(ctx));

        let failure = Constraint::dependent(&n, &only_int)
            .unwrap()
            .check(ctx)
            .unwrap_err();
        assert!(matches!(
            failure,
            Failure::Refinement {
                part: RefinementPart::Predicate,
                ..
            }
        ));
        snap!(failure.to_string(), @"number fails its predicate refinement");

        let failure = Constraint::dependent(&f, &anything)
            .unwrap()
            .check(ctx)
            .unwrap_err();
        assert!(matches!(failure, Failure::NotSubtype { .. }));
        snap!(failure.to_string(), @"Dependent<int> is not a subtype of float");
    });
}

#[test]
fn dependent_subtyping() {
    let positive: Type = DependentTypeBuilder::create_refinement_type(
        int(),
        always(),
        always(),
        always(),
    )
    .into();
    let impossible: Type =
        DependentTypeBuilder::create_refinement_type(int(), never(), always(), always()).into();

    ctx(|ctx| {
        assert!(ctx.is_subtype(&int(), &positive));
        assert!(!ctx.is_subtype(&int(), &impossible));
        assert!(ctx.is_subtype(&impossible, &number()));
        assert!(ctx.is_subtype(&impossible, &impossible));
        assert!(!ctx.is_subtype(&number(), &positive));
    })
}

#[test]
fn mapping_requirements() {
    let source = topology(real(), &[(Continuous, true), (Connected, true)]);
    let target = topology(int(), &[(Continuous, true), (Connected, false)]);

    ctx(|ctx| {
        let homeo = Constraint::mapping(MappingKind::Homeomorphism, &source, &target).unwrap();
        assert!(homeo.verify(ctx));

        let homotopy = Constraint::mapping(MappingKind::Homotopy, &source, &target).unwrap();
        snap!(homotopy.check(ctx).unwrap_err().to_string(), @"homotopy from Topology<real> to Topology<int> requires CONNECTED (false)");

        let embedding = Constraint::mapping(MappingKind::Embedding, &source, &target).unwrap();
        assert!(!embedding.verify(ctx));
    })
}

#[test]
fn separation_axioms() {
    let t = topology(real(), &[(Continuous, true), (T2, true), (T1, false)]);
    assert!(!t.verify());
    snap!(ctx(|ctx| ctx.verify(&t)).unwrap_err().to_string(), @"Topology<real> violates T2 => T1");

    let mut traits = TopologyTraits::new().with(Metrizable, true);
    let derived = traits.saturate();
    snap!(derived.iter().format(", ").to_string(), @"HAUSDORFF, T2, T1, T0, NORMAL, PARACOMPACT, REGULAR");
    assert!(traits.verify_manifold());
    assert!(traits.verify_axioms());
    assert!(traits.saturate().is_empty());
}

#[test]
fn quantum_consistency() {
    let t = quantum(
        int(),
        &[(Normalized, true), (Entangled, true), (Superposition, false)],
    );
    assert!(!t.verify());
    snap!(ctx(|ctx| ctx.verify(&t)).unwrap_err().to_string(), @"Quantum<int> is entangled but not in superposition");

    let nested = Type::quantum(topology(real(), &[]));
    let failure = ctx(|ctx| ctx.verify(&nested)).unwrap_err();
    snap!(failure.to_string(), @"in base of Quantum<Topology<real>>: Topology<real> does not have CONTINUOUS (unset)");
    assert!(matches!(failure.root(), Failure::MissingProperties { .. }));
}

#[test]
fn quantum_operations() {
    let gate = QuantumTraits::new().with(Unitary, true).with(Coherent, true);
    let state = QuantumTraits::new().with(Normalized, true);

    assert!(gate.verify_operation(QuantumOperation::Gate, &state));
    assert!(!state.verify_operation(QuantumOperation::Gate, &state));
    assert!(gate.verify_operation(QuantumOperation::Measurement, &state));
    assert!(!gate.verify_operation(QuantumOperation::Evolution, &state));
    assert!(gate.verify_operation(QuantumOperation::Evolution, &gate));

    let entangled = QuantumTraits::new().with(Entangled, true);
    assert!(!entangled.verify_entanglement_preservation(&state));
    assert!(state.verify_entanglement_preservation(&entangled));
}

#[test]
fn transformations_compose() {
    let traits = TopologyTraits::new()
        .with(Connected, true)
        .with(Continuous, true)
        .with(Hausdorff, true);

    let path_connected = |t: &TopologyTraits| t.verify_path_connected();
    let manifold = |t: &TopologyTraits| t.verify_manifold();

    assert!(traits.compose_transformations(&[&path_connected]));
    assert!(!traits.compose_transformations(&[&path_connected, &manifold]));
    assert!(traits.compose_transformations(&[]));
}

#[test]
fn verify_is_idempotent() {
    let t = topology(real(), &[(Continuous, true), (Compact, true)]);
    assert_eq!(t.verify(), t.verify());
    assert!(t.verify());
    ctx(|ctx| assert_eq!(ctx.verify(&t), ctx.verify(&t)));
}

#[test]
fn cheap_handler_discards_detail() {
    let hierarchy = Hierarchy::default();
    let ctx = TypeContext::new(&hierarchy, ErrorHandler::Cheap);
    assert_eq!(
        ctx.check_subtype(&number(), &int()),
        Err(Failure::Discarded)
    );
}

#[test]
#[should_panic(expected = "verification failed: number is not a subtype of int")]
fn panic_handler() {
    let hierarchy = Hierarchy::default();
    let ctx = TypeContext::new(&hierarchy, ErrorHandler::PanicOnError);
    let _ = ctx.check_subtype(&number(), &int());
}

#[test]
fn type_structure() {
    let t = Type::quantum(Type::topology(real()));
    snap!(t.to_string(), @"Quantum<Topology<real>>");
    assert_eq!(
        t.chain().map(Type::name).collect::<Vec<_>>(),
        vec!["Quantum", "Topology", "real"]
    );
    assert_eq!(t.innermost().name, "real");
    assert_eq!(t.representation(), Representation::Quantum);
    assert_eq!(
        Type::topology(int()).representation(),
        Representation::Topological
    );
    assert_eq!(int().representation(), Representation::Classical);
}

#[test]
fn typeref_syntax() {
    let t = TypeRef::parse("Quantum<Topology<real>>").unwrap();
    assert_eq!(t, TypeRef::quantum(TypeRef::topology(TypeRef::basic("real"))));
    snap!(t.to_type().to_string(), @"Quantum<Topology<real>>");
    snap!(" Topology < int > ".parse::<TypeRef>().unwrap().to_string(), @"Topology<int>");

    let err = |src: &str| TypeRef::parse(src).unwrap_err().to_string();
    snap!(err("Topology"), @"invalid type syntax at 0: `Topology` needs a base type, as in `Topology<int>`");
    snap!(err("int<real>"), @"invalid type syntax at 0: `int` does not take a base type");
    snap!(err("Topology<int"), @"invalid type syntax at 12: expected `>`");
    snap!(err("Topology<int> x"), @"invalid type syntax at 14: unexpected input after type");
    snap!(err("Quantum<>"), @"invalid type syntax at 8: expected a type name");
}

#[test]
fn typeref_nesting_is_bounded() {
    let nested = |depth: usize| {
        format!(
            "{}int{}",
            "Topology<".repeat(depth),
            ">".repeat(depth)
        )
    };

    let deepest = TypeRef::parse(&nested(MAX_DEPTH)).unwrap();
    assert_eq!(deepest.to_string(), nested(MAX_DEPTH));

    let err = TypeRef::parse(&nested(MAX_DEPTH + 1)).unwrap_err();
    assert_eq!(
        err,
        ConstructionError::TypeSyntax {
            at: "Topology<".len() * MAX_DEPTH,
            message: "type nested too deeply".to_string(),
        }
    );

    assert!(TypeRef::parse(&nested(200_000)).is_err());
}

#[test]
fn environment() {
    let mut env = TypeEnvironment::new();
    env.add_type("plane", topology(real(), &[(Continuous, true)]))
        .unwrap();
    env.add_type("n", int()).unwrap();
    env.add_type("state", quantum(int(), &[])).unwrap();

    assert_eq!(
        env.add_type("n", float()),
        Err(ConstructionError::DuplicateName("n".to_string()))
    );
    assert_eq!(env.lookup_type("n").unwrap().to_string(), "int");
    assert!(env.verify_type("plane"));
    assert!(!env.verify_type("missing"));
    assert_eq!(env.verify_all(), vec!["state"]);

    assert_eq!(env.set_quantum_property("state", Normalized, true), Ok(None));
    assert!(env.verify_all().is_empty());

    snap!(env.set_topology_property("n", Compact, true).unwrap_err().to_string(), @"topological property constraint needs a topology type, but `int` is a basic type");
    assert_eq!(
        env.set_property("nope", AnyProperty::Topology(Compact), true),
        Err(ConstructionError::UnknownName("nope".to_string()))
    );
    assert_eq!(
        env.to_string(),
        "n: int\nplane: Topology<real>\nstate: Quantum<int>\n"
    );

    assert_eq!(env.remove("n").unwrap().to_string(), "int");
    assert!(env.remove("n").is_none());
    assert!(!env.contains("n"));
    assert_eq!(env.len(), 2);
}

#[test]
fn infer_same_as() {
    let config = Config::default();
    let mut engine = InferenceEngine::new(&config);
    let plane = engine.var_with("plane", topology(real(), &[]));
    let circle = engine.var("circle");
    engine.add_goal(Goal::SameAs {
        var: circle,
        source: plane,
    });
    engine.add_goal(Goal::Property {
        var: plane,
        prop: AnyProperty::Topology(Continuous),
        value: true,
    });

    let solution = engine.infer().unwrap();
    let circle_t = solution.get(circle).unwrap();
    assert_eq!(circle_t.to_string(), "Topology<real>");
    assert!(circle_t.topology_traits().unwrap().verify_property(Continuous));
    assert_eq!(solution.path().len(), 3);
    assert_eq!(solution.path()[0].effect, infer::Effect::Bound(circle));

    let env = solution.into_environment().unwrap();
    assert!(env.verify_type("circle"));
    assert!(env.verify_type("plane"));
}

#[test]
fn infer_unresolved() {
    let config = Config::default();
    let mut engine = InferenceEngine::new(&config);
    engine.var("x");
    let err = engine.infer().unwrap_err();
    assert!(err.is_incomplete());
    snap!(err.to_string(), @"could not infer a type for x");
}

#[test]
fn infer_iteration_cap() {
    let config = Config::default().with_max_iterations(1);
    let mut engine = InferenceEngine::new(&config);
    let plane = engine.var_with("plane", topology(real(), &[]));
    engine.add_goal(Goal::Property {
        var: plane,
        prop: AnyProperty::Topology(Compact),
        value: true,
    });

    let err = engine.infer().unwrap_err();
    assert_eq!(err, InferenceError::DidNotConverge { passes: 1 });
    assert!(err.is_incomplete());
}

#[test]
fn infer_type_errors() {
    let config = Config::default();

    let run = |goals: &dyn Fn(VarId) -> Vec<Goal>| {
        let mut engine = InferenceEngine::new(&config);
        let plane = engine.var_with("plane", topology(real(), &[]));
        for goal in goals(plane) {
            engine.add_goal(goal);
        }
        engine.infer().unwrap_err()
    };
    let set = |var: VarId, prop: AnyProperty, value: bool| Goal::Property { var, prop, value };

    let conflict = run(&|v: VarId| {
        vec![
            set(v, AnyProperty::Topology(Compact), true),
            set(v, AnyProperty::Topology(Compact), false),
        ]
    });
    assert!(!conflict.is_incomplete());
    snap!(conflict.to_string(), @"conflicting information for `plane`: COMPACT is true but is required to be false");

    let inconsistent = run(&|v: VarId| {
        vec![
            set(v, AnyProperty::Topology(T2), true),
            set(v, AnyProperty::Topology(T1), false),
        ]
    });
    snap!(inconsistent.to_string(), @"`plane` is inconsistent: T2 => T1");

    let mismatch = run(&|v: VarId| vec![set(v, AnyProperty::Quantum(Unitary), true)]);
    snap!(mismatch.to_string(), @"`plane` needs to be a quantum type, but is a topology type");
}

#[test]
fn infer_preserve_and_derive() {
    let config = Config::default();
    let mut engine = InferenceEngine::new(&config);
    let source = engine.var_with(
        "source",
        topology(
            real(),
            &[(Continuous, true), (Connected, true), (Compact, true)],
        ),
    );
    let target = engine.var_with("target", topology(real(), &[]));
    engine.add_goal(Goal::Preserve {
        source,
        target,
        mapping: MappingKind::Homotopy,
    });
    engine.add_goal(Goal::Derive(source));

    let solution = engine.infer().unwrap();
    snap!(solution.get(target).unwrap().topology_traits().unwrap().to_string(), @"{CONNECTED}");
    let source_traits = solution.get(source).unwrap().topology_traits().unwrap();
    assert!(source_traits.verify_property(Paracompact));
    assert!(source_traits.verify_property(LocallyCompact));
}

#[test]
fn infer_preserves_every_property_at_once() {
    let config = Config::default();
    let mut engine = InferenceEngine::new(&config);
    let source = engine.var_with(
        "source",
        topology(
            real(),
            &[
                (Continuous, true),
                (Connected, true),
                (Compact, true),
                (Hausdorff, true),
            ],
        ),
    );
    let target = engine.var_with("target", topology(real(), &[]));
    engine.add_goal(Goal::Preserve {
        source,
        target,
        mapping: MappingKind::Homeomorphism,
    });

    let solution = engine.infer().unwrap();
    snap!(solution.get(target).unwrap().topology_traits().unwrap().to_string(), @"{CONTINUOUS, CONNECTED, COMPACT, HAUSDORFF}");
    assert_eq!(solution.path().len(), 4);
    assert!(solution.path().iter().all(|step| step.pass == 0));
}

#[test]
fn infer_preserve_keeps_declared_values() {
    let config = Config::default();
    let mut engine = InferenceEngine::new(&config);
    let source = engine.var_with(
        "source",
        topology(real(), &[(Continuous, true), (Connected, true)]),
    );
    let target = engine.var_with("target", topology(real(), &[(Connected, false)]));
    engine.add_goal(Goal::Preserve {
        source,
        target,
        mapping: MappingKind::Homeomorphism,
    });

    let solution = engine.infer().unwrap();
    snap!(solution.get(target).unwrap().topology_traits().unwrap().to_string(), @"{!CONNECTED, CONTINUOUS}");
}

fn chain(len: usize) -> Vec<Decl> {
    let space = |i: usize| {
        let mut body = vec![Decl::property("continuous", true)];
        if i == 0 {
            body.push(Decl::property("connected", true));
        }
        Decl::space(
            format!("s{}", i),
            TypeRef::topology(TypeRef::basic("real")),
            body,
        )
    };

    let mut decls = (0..len).map(space).collect::<Vec<_>>();
    decls.extend((1..len).rev().map(|i| {
        Decl::mapping(
            format!("m{}", i),
            "homotopy",
            format!("s{}", i - 1),
            format!("s{}", i),
        )
    }));
    decls
}

#[test]
fn long_mapping_chain_converges() {
    let checked = check_program(&chain(71), &Config::default()).unwrap();

    assert!(checked.passed());
    assert_eq!(checked.report.verdicts.len(), 70);
    let last = checked.env.lookup_type("s70").unwrap();
    assert!(last.topology_traits().unwrap().verify_property(Connected));

    let capped = check_program(&chain(71), &Config::default().with_max_iterations(10));
    assert!(matches!(
        capped,
        Err(CompileError::Inference(InferenceError::DidNotConverge { passes: 10 }))
    ));
}

#[test]
fn mapping_failures_are_reported() {
    let ty = |src: &str| TypeRef::parse(src).unwrap();
    let decls = vec![
        Decl::space(
            "a",
            ty("Topology<real>"),
            vec![
                Decl::property("continuous", true),
                Decl::property("connected", true),
            ],
        ),
        Decl::space(
            "b",
            ty("Topology<real>"),
            vec![
                Decl::property("continuous", true),
                Decl::property("connected", false),
            ],
        ),
        Decl::space(
            "w",
            ty("Quantum<float>"),
            vec![Decl::property("normalized", true)],
        ),
        Decl::Invariant(Invariant::Quantum("w".to_string())),
        Decl::mapping("h", "homotopy", "a", "b"),
    ];

    let checked = check_program(&decls, &Config::default()).unwrap();
    assert!(checked.ill_formed.is_empty());
    assert_eq!(checked.report.failure_count(), 2);

    let failures = checked
        .report
        .failures()
        .map(|v| format!("{}: {}", v.subject, v.outcome.clone().unwrap_err()))
        .collect::<Vec<_>>();
    assert_eq!(
        failures,
        vec![
            "h: homotopy from Topology<real> to Topology<real> requires CONNECTED (false)",
            "quantum(w): Quantum<float> does not have UNITARY (unset), ENTANGLED (unset)",
        ]
    );
}

fn program() -> Vec<Decl> {
    let ty = |src: &str| TypeRef::parse(src).unwrap();

    vec![
        Decl::space(
            "plane",
            ty("Topology<real>"),
            vec![
                Decl::property("continuous", true),
                Decl::property("connected", true),
                Decl::property("compact", true),
                Decl::shape("disk", None, vec![]),
                Decl::shape(
                    "ring",
                    Some(ty("Topology<real>")),
                    vec![
                        Decl::property("continuous", true),
                        Decl::property("hausdorff", true),
                    ],
                ),
            ],
        ),
        Decl::space(
            "target",
            ty("Topology<real>"),
            vec![Decl::property("continuous", true)],
        ),
        Decl::space(
            "wave",
            ty("Quantum<float>"),
            vec![Decl::property("normalized", true)],
        ),
        Decl::mapping("squash", "homeomorphism", "plane", "target"),
        Decl::Invariant(Invariant::Topological("disk".to_string())),
        Decl::Invariant(Invariant::Topological("target".to_string())),
        Decl::Invariant(Invariant::Subtype {
            sub: "ring".to_string(),
            sup: "plane".to_string(),
        }),
        Decl::Invariant(Invariant::Quantum("wave".to_string())),
    ]
}

#[test]
fn check_whole_program() {
    let checked = check_program(&program(), &Config::default()).unwrap();

    assert!(checked.ill_formed.is_empty());
    assert!(!checked.passed());
    assert_eq!(
        checked
            .report
            .verdicts
            .iter()
            .map(|v| v.subject.as_str())
            .collect::<Vec<_>>(),
        vec![
            "squash",
            "topological(disk)",
            "topological(target)",
            "ring <: plane",
            "quantum(wave)"
        ]
    );

    let failures = checked.report.failures().collect::<Vec<_>>();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, ConstraintKind::Quantum);
    snap!(failures[0].outcome.clone().unwrap_err().to_string(), @"Quantum<float> does not have UNITARY (unset), ENTANGLED (unset)");

    let disk = checked.env.lookup_type("disk").unwrap();
    assert!(disk.topology_traits().unwrap().verify_property(Compact));
    assert!(disk.topology_traits().unwrap().verify_property(Paracompact));
}

#[test]
fn program_errors() {
    let config = Config::default();
    let run = |decls: Vec<Decl>| check_program(&decls, &config).unwrap_err();
    let space = |name: &str, body| Decl::space(name, TypeRef::topology(TypeRef::basic("real")), body);

    snap!(run(vec![Decl::property("compact", true)]).to_string(), @"property `compact` is not declared inside a space or shape");
    snap!(run(vec![space("s", vec![Decl::property("smooth", true)])]).to_string(), @"unknown property `smooth`");
    snap!(run(vec![space("s", vec![]), space("s", vec![])]).to_string(), @"`s` is already defined");
    snap!(run(vec![space("s", vec![]), Decl::mapping("m", "twist", "s", "s")]).to_string(), @"unknown mapping kind `twist`");
    snap!(run(vec![Decl::Invariant(Invariant::Quantum("ghost".to_string()))]).to_string(), @"`ghost` is not defined");

    let err = run(vec![space(
        "s",
        vec![Decl::property("t2", true), Decl::property("t1", false)],
    )]);
    assert!(matches!(
        err,
        CompileError::Inference(InferenceError::Inconsistent { .. })
    ));
    snap!(err.to_string(), @"`s` is inconsistent: T2 => T1");

    let err = run(vec![
        space("s", vec![Decl::property("continuous", true)]),
        Decl::Invariant(Invariant::Quantum("s".to_string())),
    ]);
    assert!(matches!(err, CompileError::Construction(ConstructionError::KindMismatch { .. })));
}
