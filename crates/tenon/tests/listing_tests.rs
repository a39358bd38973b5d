//! Listing, mapping and surrogate tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tenon::*;

fn ints(values: &[i64]) -> Arc<Listing> {
    Listing::from_values(values.iter().map(|n| Value::Int(*n)))
}

fn check(class: &Arc<Class>) -> Arc<dyn TypeCheck> {
    Arc::new(ClassCheck::new(class.clone()))
}

#[test]
fn test_length_does_not_force() {
    let counter = Arc::new(AtomicUsize::new(0));
    let member = {
        let counter = counter.clone();
        move || {
            let counter = counter.clone();
            ObjectMember::thunk(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            })
        }
    };
    let listing = ObjectBuilder::new()
        .element(member())
        .element(member())
        .element(member())
        .build_listing();

    assert_eq!(listing.length(), 3);
    assert!(!listing.is_empty());
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_listing_equality() {
    let mut ctx = EvalContext::new();
    let a = Value::Listing(ints(&[1, 2, 3]));
    let b = Value::Listing(ints(&[1, 2, 3]));
    let longer = Value::Listing(ints(&[1, 2, 3, 4]));
    let different = Value::Listing(ints(&[1, 2, 4]));

    assert!(a.equals(&b, &mut ctx).unwrap());
    assert!(!a.equals(&longer, &mut ctx).unwrap());
    assert!(!a.equals(&different, &mut ctx).unwrap());
    assert_eq!(a.hash_code(&mut ctx).unwrap(), b.hash_code(&mut ctx).unwrap());
    assert!(!longer.as_object().unwrap().is_forced());
}

#[test]
fn test_listing_hash_is_positional() {
    let mut ctx = EvalContext::new();
    let a = Value::Listing(ints(&[1, 2]));
    let b = Value::Listing(ints(&[2, 1]));
    assert_ne!(a.hash_code(&mut ctx).unwrap(), b.hash_code(&mut ctx).unwrap());
}

#[test]
fn test_listing_hash_fold_starts_at_zero() {
    let mut ctx = EvalContext::new();
    let seven = Value::Int(7).hash_code(&mut ctx).unwrap();
    let eight = Value::Int(8).hash_code(&mut ctx).unwrap();

    let single = Value::Listing(ints(&[7]));
    assert_eq!(single.hash_code(&mut ctx).unwrap(), seven);

    let pair = Value::Listing(ints(&[7, 8]));
    assert_eq!(
        pair.hash_code(&mut ctx).unwrap(),
        seven.wrapping_mul(31).wrapping_add(eight)
    );

    let empty = Value::Listing(Listing::from_values([]));
    assert_eq!(empty.hash_code(&mut ctx).unwrap(), 0);
}

#[test]
fn test_export_scenario() {
    let listing = ints(&[1, 2, 3]);
    let mut ctx = EvalContext::new();

    let object = ObjectRef::Listing(listing.clone());
    object.force(false, true, &mut ctx).unwrap();
    assert_eq!(
        object.export(&mut ctx).unwrap(),
        Exported::List(vec![Exported::Int(1), Exported::Int(2), Exported::Int(3)])
    );

    let as_ints = listing
        .with_type_check(check(&base().int), CapturedScope::empty(), &mut ctx)
        .unwrap();
    assert_eq!(as_ints.length(), 3);
    assert_eq!(as_ints.get(0, &mut ctx).unwrap(), Value::Int(1));

    let as_strings = listing
        .with_type_check(check(&base().string), CapturedScope::empty(), &mut ctx)
        .unwrap();
    match as_strings.get(0, &mut ctx).unwrap_err() {
        EvalError::TypeMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, "String");
            assert_eq!(actual, Value::Int(1));
        }
        other => panic!("expected type mismatch, got {:?}", other),
    }
}

#[test]
fn test_surrogates_check_from_the_base_outward() {
    let mut ctx = EvalContext::new();
    let base_listing = ints(&[1]);

    let inner = base_listing
        .with_type_check(check(&base().int), CapturedScope::empty(), &mut ctx)
        .unwrap();
    let outer = inner
        .with_type_check(check(&base().string), CapturedScope::empty(), &mut ctx)
        .unwrap();
    let err = outer.get(0, &mut ctx).unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch { ref expected, .. } if expected == "String"));
    // the inner level passed and kept its value
    assert_eq!(inner.get(0, &mut ctx).unwrap(), Value::Int(1));

    // when both levels reject, the one nearest the base is reported
    let inner = base_listing
        .with_type_check(check(&base().string), CapturedScope::empty(), &mut ctx)
        .unwrap();
    let outer = inner
        .with_type_check(check(&base().boolean), CapturedScope::empty(), &mut ctx)
        .unwrap();
    let err = outer.get(0, &mut ctx).unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch { ref expected, .. } if expected == "String"));
}

#[test]
fn test_surrogate_failure_points_at_member() {
    let location = SourceLocation::new("file:///app.pkl", 4, 3);
    let listing = ObjectBuilder::new()
        .element(ObjectMember::constant("x").at(location.clone()))
        .build_listing();
    let mut ctx = EvalContext::new();
    let checked = listing
        .with_type_check(check(&base().int), CapturedScope::empty(), &mut ctx)
        .unwrap();
    let err = checked.get(0, &mut ctx).unwrap_err();
    assert_eq!(err.location(), Some(&location));
    assert_eq!(err.to_string(), "Expected value of type `Int`, but got \"x\".");
}

#[test]
fn test_eager_type_checks_fail_at_creation() {
    let mut ctx = EvalContext::with_options(EvalOptions {
        eager_type_checks: true,
        ..Default::default()
    });
    let listing = Listing::from_values([Value::Int(1), Value::string("two")]);
    let result = listing.with_type_check(check(&base().int), CapturedScope::empty(), &mut ctx);
    assert!(matches!(result, Err(EvalError::TypeMismatch { .. })));
}

#[test]
fn test_predicate_check_on_listing() {
    let mut ctx = EvalContext::new();
    let positive: Arc<dyn TypeCheck> = Arc::new(PredicateCheck::new(
        ClassCheck::new(base().int.clone()),
        "isPositive",
        |value, _, _| Ok(value.as_int().is_some_and(|n| n > 0)),
    ));
    let listing = ints(&[3, -1]);
    let checked = listing
        .with_type_check(positive, CapturedScope::empty(), &mut ctx)
        .unwrap();
    assert_eq!(checked.get(0, &mut ctx).unwrap(), Value::Int(3));
    let err = checked.get(1, &mut ctx).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected value of type `Int(isPositive)`, but got -1."
    );
}

#[test]
fn test_default_element_through_surrogate() {
    let default = FunctionValue::new(1, |args, _| {
        Ok(Value::string(format!("item{}", args[0])))
    });
    let listing = ObjectBuilder::new()
        .member(MemberKey::element(1), ObjectMember::constant("explicit"))
        .default_member(ObjectMember::constant(Value::Function(Arc::new(default))))
        .build_listing();
    let mut ctx = EvalContext::new();
    let checked = listing
        .with_type_check(check(&base().string), CapturedScope::empty(), &mut ctx)
        .unwrap();
    assert_eq!(
        checked.elements(&mut ctx).unwrap(),
        vec![Value::string("item0"), Value::string("explicit")]
    );

    // the default member itself is not an element and is not exported
    let object = ObjectRef::Listing(checked);
    object.force(false, true, &mut ctx).unwrap();
    assert_eq!(
        object.export(&mut ctx).unwrap(),
        Exported::List(vec![
            Exported::String("item0".into()),
            Exported::String("explicit".into())
        ])
    );
}

#[test]
fn test_default_must_be_a_function() {
    let listing = ObjectBuilder::new()
        .member(MemberKey::element(0), ObjectMember::constant(1i64))
        .member(MemberKey::element(1), ObjectMember::undefined())
        .build_listing();
    let mut ctx = EvalContext::new();
    assert!(listing.get(1, &mut ctx).unwrap_err().is_undefined_value());

    let listing = ObjectBuilder::new()
        .member(MemberKey::element(1), ObjectMember::constant(1i64))
        .default_member(ObjectMember::constant(5i64))
        .build_listing();
    let err = listing.get(0, &mut ctx).unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch { ref expected, .. } if expected == "(Int) -> Any"));
}

#[test]
fn test_mapping_entries_and_equality() {
    let mut ctx = EvalContext::new();
    let a = ObjectBuilder::new()
        .entry("x", ObjectMember::constant(1i64))
        .entry(2i64, ObjectMember::constant("two"))
        .build_mapping();
    let b = ObjectBuilder::new()
        .entry(2i64, ObjectMember::constant("two"))
        .entry("x", ObjectMember::constant(1i64))
        .build_mapping();

    assert_eq!(a.entry_count(), 2);
    assert_eq!(a.get(&Value::Int(2), &mut ctx).unwrap(), Value::string("two"));
    let (a, b) = (Value::Mapping(a), Value::Mapping(b));
    assert!(a.equals(&b, &mut ctx).unwrap());
    assert_eq!(a.hash_code(&mut ctx).unwrap(), b.hash_code(&mut ctx).unwrap());

    let exported = a.export(&mut ctx).unwrap();
    assert_eq!(
        exported,
        Exported::Map(vec![
            (Exported::String("x".into()), Exported::Int(1)),
            (Exported::Int(2), Exported::String("two".into())),
        ])
    );
}

#[test]
fn test_mapping_surrogate_checks_entry_values() {
    let mut ctx = EvalContext::new();
    let mapping = ObjectBuilder::new()
        .entry("port", ObjectMember::constant(8080i64))
        .entry("host", ObjectMember::constant("localhost"))
        .build_mapping();
    let checked = mapping
        .with_type_check(check(&base().int), CapturedScope::empty(), &mut ctx)
        .unwrap();
    assert_eq!(checked.entry_count(), 2);
    assert_eq!(
        checked.get(&Value::string("port"), &mut ctx).unwrap(),
        Value::Int(8080)
    );
    assert!(matches!(
        checked.get(&Value::string("host"), &mut ctx),
        Err(EvalError::TypeMismatch { .. })
    ));
}
