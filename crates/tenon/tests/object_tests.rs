//! Object model tests: lazy members, prototype chains, forcing and equality

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use pretty_assertions::assert_eq;
use tenon::*;

fn counting(counter: &Arc<AtomicUsize>, value: i64) -> ObjectMember {
    let counter = counter.clone();
    ObjectMember::thunk(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Int(value))
    })
}

#[test]
fn test_member_is_evaluated_at_most_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let object: ObjectRef = ObjectBuilder::new()
        .property("x", counting(&counter, 7))
        .build_dynamic()
        .into();
    let mut ctx = EvalContext::new();
    let key = MemberKey::property("x");

    for _ in 0..3 {
        assert_eq!(object.read_member(&key, &mut ctx).unwrap(), Value::Int(7));
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(object.get_cached_value(&key), Some(Value::Int(7)));
}

#[test]
fn test_each_instance_has_its_own_cache() {
    let counter = Arc::new(AtomicUsize::new(0));
    let parent = ObjectBuilder::new()
        .property("x", counting(&counter, 1))
        .build_dynamic();
    let child: ObjectRef = ObjectBuilder::new().parent(parent.clone()).build_dynamic().into();
    let parent: ObjectRef = parent.into();
    let mut ctx = EvalContext::new();
    let key = MemberKey::property("x");

    parent.read_member(&key, &mut ctx).unwrap();
    child.read_member(&key, &mut ctx).unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_lookup_walks_the_chain() {
    let grandparent = ObjectBuilder::new()
        .property("a", ObjectMember::constant(1i64))
        .build_dynamic();
    let parent = ObjectBuilder::new()
        .parent(grandparent)
        .property("b", ObjectMember::constant(2i64))
        .build_dynamic();
    let child: ObjectRef = ObjectBuilder::new()
        .parent(parent)
        .property("a", ObjectMember::constant(10i64))
        .build_dynamic()
        .into();

    assert!(child.has_member(&MemberKey::property("b")));
    assert!(!child.has_member(&MemberKey::property("c")));
    let mut ctx = EvalContext::new();
    assert_eq!(
        child.read_member(&MemberKey::property("a"), &mut ctx).unwrap(),
        Value::Int(10)
    );
    let err = child
        .read_member(&MemberKey::property("c"), &mut ctx)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot find property `c` in object of type `Dynamic`."
    );
}

#[test]
fn test_captured_scope_is_visible_to_members() {
    let mut env = Environment::new();
    env.define("greeting", Value::string("hello"));
    let object: ObjectRef = ObjectBuilder::new()
        .scope(env.capture())
        .property(
            "message",
            ObjectMember::thunk(|frame, _| {
                let greeting = frame.lookup("greeting").cloned().unwrap_or(Value::Null);
                Ok(Value::string(format!("{} world", greeting)))
            }),
        )
        .build_dynamic()
        .into();
    let mut ctx = EvalContext::new();
    assert_eq!(
        object
            .read_member(&MemberKey::property("message"), &mut ctx)
            .unwrap(),
        Value::string("hello world")
    );
}

#[test]
fn test_self_reference_is_a_cyclic_definition() {
    let object: ObjectRef = ObjectBuilder::new()
        .property("a", ObjectMember::thunk(|frame, ctx| frame.property("b", ctx)))
        .property("b", ObjectMember::thunk(|frame, ctx| frame.property("a", ctx)))
        .build_dynamic()
        .into();
    let mut ctx = EvalContext::new();
    let err = object
        .read_member(&MemberKey::property("a"), &mut ctx)
        .unwrap_err();
    assert!(matches!(err, EvalError::CyclicDefinition { .. }));
    assert!(!object.has_cached_value(&MemberKey::property("a")));
    assert_eq!(ctx.depth(), 0);
}

#[test]
fn test_depth_limit() {
    let mut ctx = EvalContext::with_max_depth(2);
    let inner = ObjectBuilder::new()
        .property("v", ObjectMember::constant(1i64))
        .build_dynamic();
    let middle = ObjectBuilder::new()
        .property(
            "v",
            ObjectMember::thunk(move |_, ctx| {
                ObjectRef::from(inner.clone()).read_member(&MemberKey::property("v"), ctx)
            }),
        )
        .build_dynamic();
    let outer: ObjectRef = ObjectBuilder::new()
        .property(
            "v",
            ObjectMember::thunk(move |_, ctx| {
                ObjectRef::from(middle.clone()).read_member(&MemberKey::property("v"), ctx)
            }),
        )
        .build_dynamic()
        .into();
    let err = outer
        .read_member(&MemberKey::property("v"), &mut ctx)
        .unwrap_err();
    assert!(matches!(err, EvalError::StackOverflow { depth: 2, .. }));
}

#[test]
fn test_force_is_idempotent() {
    let counter = Arc::new(AtomicUsize::new(0));
    let nested = ObjectBuilder::new()
        .property("n", counting(&counter, 3))
        .build_dynamic();
    let object: ObjectRef = ObjectBuilder::new()
        .property("x", ObjectMember::constant(1i64))
        .property("nested", ObjectMember::constant(Value::Dynamic(nested)))
        .build_dynamic()
        .into();
    let mut ctx = EvalContext::new();

    object.force(false, true, &mut ctx).unwrap();
    let first = object.export(&mut ctx).unwrap();
    object.force(false, true, &mut ctx).unwrap();
    let second = object.export(&mut ctx).unwrap();

    assert_eq!(first, second);
    assert!(object.is_forced());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(
        first.property("nested").and_then(|n| n.property("n")),
        Some(&Exported::Int(3))
    );
}

#[test]
fn test_failed_force_can_be_retried() {
    let object: ObjectRef = ObjectBuilder::new()
        .property("ok", ObjectMember::constant(1i64))
        .property("missing", ObjectMember::undefined())
        .build_dynamic()
        .into();
    let mut ctx = EvalContext::new();

    assert!(object.force(false, true, &mut ctx).unwrap_err().is_undefined_value());
    assert!(!object.is_forced());

    object.force(true, true, &mut ctx).unwrap();
    assert!(object.is_forced());
    assert!(object.has_cached_value(&MemberKey::property("ok")));
    assert!(!object.has_cached_value(&MemberKey::property("missing")));
}

#[test]
fn test_local_and_hidden_members_are_internal() {
    let object: ObjectRef = ObjectBuilder::new()
        .property("helper", ObjectMember::constant(1i64).local())
        .property("secret", ObjectMember::constant(2i64).hidden())
        .property(
            "visible",
            ObjectMember::thunk(|frame, ctx| {
                let a = frame.property("helper", ctx)?;
                let b = frame.property("secret", ctx)?;
                ops::add(&a, &b)
            }),
        )
        .build_dynamic()
        .into();
    let mut ctx = EvalContext::new();
    object.force(false, true, &mut ctx).unwrap();

    let mut keys = Vec::new();
    object.iterate_member_values(|key, _, value| {
        keys.push((key.to_string(), value));
        true
    });
    assert_eq!(keys, vec![("visible".to_string(), Some(Value::Int(3)))]);

    let exported = object.export(&mut ctx).unwrap();
    assert_eq!(exported.property("secret"), None);
    assert_eq!(exported.property("visible"), Some(&Exported::Int(3)));
}

#[test]
fn test_iteration_can_stop_early() {
    let object: ObjectRef = ObjectBuilder::new()
        .property("a", ObjectMember::constant(1i64))
        .property("b", ObjectMember::constant(2i64))
        .property("c", ObjectMember::constant(3i64))
        .build_dynamic()
        .into();
    let mut seen = 0;
    let completed = object.iterate_member_values(|_, _, _| {
        seen += 1;
        seen < 2
    });
    assert!(!completed);
    assert_eq!(seen, 2);
}

#[test]
fn test_force_and_iterate_yields_values() {
    let object: ObjectRef = ObjectBuilder::new()
        .property("a", ObjectMember::constant(1i64))
        .element(ObjectMember::constant("e"))
        .entry("k", ObjectMember::constant(true))
        .build_dynamic()
        .into();
    let mut ctx = EvalContext::new();
    let mut seen = Vec::new();
    let completed = object
        .force_and_iterate_member_values(&mut ctx, |key, _, value| {
            seen.push(format!("{} = {}", key, value));
            true
        })
        .unwrap();
    assert!(completed);
    assert_eq!(seen, vec!["a = 1", "0 = e", "\"k\" = true"]);
}

#[test]
fn test_concurrent_reads_agree() {
    let counter = Arc::new(AtomicUsize::new(0));
    let object: ObjectRef = ObjectBuilder::new()
        .property("x", counting(&counter, 42))
        .build_dynamic()
        .into();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let object = object.clone();
            thread::spawn(move || {
                let mut ctx = EvalContext::new();
                object.read_member(&MemberKey::property("x"), &mut ctx)
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), Value::Int(42));
    }
    let computations = counter.load(Ordering::SeqCst);
    assert!((1..=4).contains(&computations));
}

#[test]
fn test_force_running_in_another_session_is_not_reported_done() {
    let started = Arc::new(AtomicUsize::new(0));
    let slow = {
        let started = started.clone();
        ObjectMember::thunk(move |_, _| {
            started.fetch_add(1, Ordering::SeqCst);
            thread::sleep(StdDuration::from_millis(200));
            Ok(Value::Int(1))
        })
    };
    let object: ObjectRef = ObjectBuilder::new()
        .property("x", slow)
        .build_dynamic()
        .into();

    let first = {
        let object = object.clone();
        thread::spawn(move || {
            let mut ctx = EvalContext::new();
            object.force(false, true, &mut ctx)
        })
    };
    while started.load(Ordering::SeqCst) == 0 {
        thread::yield_now();
    }

    // the first session is still inside `x`
    let mut ctx = EvalContext::new();
    object.force(false, true, &mut ctx).unwrap();
    let exported = object.export(&mut ctx).unwrap();
    assert_eq!(exported.property("x"), Some(&Exported::Int(1)));

    first.join().unwrap().unwrap();
    assert!(object.is_forced());
}

#[test]
fn test_force_terminates_on_self_reference() {
    let object: ObjectRef = ObjectBuilder::new()
        .property("n", ObjectMember::constant(1i64))
        .property("me", ObjectMember::thunk(|frame, _| Ok(frame.receiver.to_value())))
        .build_dynamic()
        .into();
    let mut ctx = EvalContext::new();

    object.force(false, true, &mut ctx).unwrap();
    assert!(object.is_forced());
    assert!(object.has_cached_value(&MemberKey::property("me")));
}

#[test]
fn test_typed_object_equality_and_hash() {
    let class = Arc::new(Class::new("Point", "file:///geo.pkl").with_superclass(base().object.clone()));
    let make = |x: i64, y: i64| -> ObjectRef {
        ObjectBuilder::new()
            .property("x", ObjectMember::constant(x))
            .property("y", ObjectMember::constant(y))
            .build_typed(class.clone())
            .into()
    };
    let mut ctx = EvalContext::new();
    let a = make(1, 2);
    let b = make(1, 2);
    let c = make(2, 1);

    assert!(a.equals(&b, &mut ctx).unwrap());
    assert!(!a.equals(&c, &mut ctx).unwrap());
    assert_eq!(a.hash_code(&mut ctx).unwrap(), b.hash_code(&mut ctx).unwrap());
    assert!(a.class().is_subclass_of(&base().object));
    assert!(!a.class().is_subclass_of(&base().listing));
}

#[test]
fn test_objects_as_map_keys() {
    let key = ObjectBuilder::new()
        .property("id", ObjectMember::constant(1i64))
        .build_dynamic();
    let same = ObjectBuilder::new()
        .property("id", ObjectMember::constant(1i64))
        .build_dynamic();
    let mut ctx = EvalContext::new();
    let map = Value::map(
        vec![
            (Value::Dynamic(key), Value::string("first")),
            (Value::Dynamic(same), Value::string("second")),
        ],
        &mut ctx,
    )
    .unwrap();
    match map {
        Value::Map(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries.values().next(), Some(&Value::string("second")));
        }
        other => panic!("expected map, got {:?}", other),
    }
}
