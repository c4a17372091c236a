use spark_observe::{
    del, observe, property_dep, set, subscriber, with_config, with_tracking, Array, Config,
    FnSubscriber, Object, ReactiveError, Value,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn counter() -> (Rc<FnSubscriber>, Rc<Cell<usize>>) {
    let runs = Rc::new(Cell::new(0));
    let runs_clone = runs.clone();
    let sub = subscriber(move || runs_clone.set(runs_clone.get() + 1));
    (sub, runs)
}

fn collecting_config() -> (Config, Rc<RefCell<Vec<String>>>) {
    let messages = Rc::new(RefCell::new(Vec::new()));
    let sink = messages.clone();
    let cfg = Config::default().with_warn_handler(move |m| sink.borrow_mut().push(m.to_string()));
    (cfg, messages)
}

#[test]
fn test_dynamic_add_is_trackable() {
    let nested = Object::new();
    let data = Object::from_iter([("nested", nested.clone())]);
    observe(&Value::from(data.clone()), true).unwrap();

    let (render, runs) = counter();
    with_tracking(render.clone(), || data.get("nested"));

    set(&Value::from(nested.clone()), "added", 1).unwrap();
    assert_eq!(runs.get(), 1, "owner dep notified");

    let (reader, reads) = counter();
    with_tracking(reader.clone(), || nested.get("added"));
    nested.set("added", 2);
    assert_eq!(reads.get(), 1, "added key is reactive");
}

#[test]
fn test_root_data_guard_warns_and_leaves_data_alone() {
    let (cfg, messages) = collecting_config();
    let data = Object::from_iter([("a", 1)]);
    let root = Value::from(data.clone());
    observe(&root, true).unwrap();

    with_config(cfg, || {
        assert_eq!(set(&root, "b", 2).unwrap().as_number(), Some(2.0));
        del(&root, "a").unwrap();
    });

    assert!(!data.has_own("b"));
    assert!(data.has_own("a"));
    assert_eq!(messages.borrow().len(), 2);
}

#[test]
fn test_existing_root_key_can_still_be_set() {
    let data = Object::from_iter([("a", 1)]);
    let root = Value::from(data.clone());
    observe(&root, true).unwrap();

    set(&root, "a", 7).unwrap();
    assert_eq!(data.get("a").as_number(), Some(7.0));
}

#[test]
fn test_production_suppresses_warnings() {
    let messages = Rc::new(RefCell::new(Vec::<String>::new()));
    let sink = messages.clone();
    let cfg = Config {
        production: true,
        ..Config::default().with_warn_handler(move |m| sink.borrow_mut().push(m.to_string()))
    };

    with_config(cfg, || {
        assert!(set(&Value::Undefined, "k", 1).is_err());
    });
    assert!(messages.borrow().is_empty());
}

#[test]
fn test_primitive_target_is_an_error() {
    let (cfg, _messages) = collecting_config();
    with_config(cfg, || {
        let err = set(&Value::from(true), "k", 1).unwrap_err();
        assert_eq!(err, ReactiveError::InvalidTarget { kind: "boolean" });
        assert_eq!(err.to_string(), "cannot operate on boolean target");
    });
}

#[test]
fn test_del_notifies_owner_only_when_key_existed() {
    let data = Object::from_iter([("a", 1)]);
    let value = Value::from(data.clone());
    observe(&value, false).unwrap();

    let (render, runs) = counter();
    with_tracking(render.clone(), || data.depend());

    del(&value, "nope").unwrap();
    assert_eq!(runs.get(), 0);
    del(&value, "a").unwrap();
    assert_eq!(runs.get(), 1);
    assert!(property_dep(&data, "a").is_none());
}

#[test]
fn test_set_and_del_on_arrays() {
    let list = Array::from_vec(vec![Value::from("a"), Value::from("b")]);
    let value = Value::from(list.clone());
    observe(&value, false).unwrap();

    let (render, runs) = counter();
    with_tracking(render.clone(), || list.depend());

    set(&value, 0usize, "z").unwrap();
    assert_eq!(list.get(0).as_str(), Some("z"));
    del(&value, "1").unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(runs.get(), 2);

    assert!(matches!(
        del(&value, "first"),
        Err(ReactiveError::InvalidKey { .. })
    ));
}

#[test]
fn test_plain_object_gets_plain_property() {
    let data = Object::new();
    let value = Value::from(data.clone());
    set(&value, "k", 1).unwrap();
    assert_eq!(data.get("k").as_number(), Some(1.0));
    assert!(property_dep(&data, "k").is_none());

    del(&value, "k").unwrap();
    assert!(!data.has_own("k"));
}

#[test]
fn test_component_instance_guard_on_del() {
    let (cfg, messages) = collecting_config();
    let vm = Object::component_instance();
    vm.set("x", 1);
    let target = Value::from(vm.clone());

    with_config(cfg, || {
        del(&target, "x").unwrap();
        set(&target, "y", 2).unwrap();
    });

    assert!(vm.has_own("x"));
    assert_eq!(vm.get("x").as_number(), Some(1.0));
    assert!(!vm.has_own("y"));
    let messages = messages.borrow();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("Avoid deleting properties"));
    assert!(messages[1].starts_with("Avoid adding reactive properties"));
}

#[test]
fn test_huge_array_index_is_rejected() {
    let list = Array::from_vec(vec![Value::from(1)]);
    let value = Value::from(list.clone());
    observe(&value, false).unwrap();

    let (render, runs) = counter();
    with_tracking(render.clone(), || list.depend());

    assert!(matches!(
        set(&value, usize::MAX, 1),
        Err(ReactiveError::InvalidKey { .. })
    ));
    assert_eq!(list.len(), 1);
    assert_eq!(runs.get(), 0);
}
