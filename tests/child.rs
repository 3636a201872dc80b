use ferrous_inject::{injectable, ErrorKind, Injector, InjectorOptions, Key, Module, Resolver};
use std::sync::Arc;

#[derive(Debug)]
pub struct Global {
    region: &'static str,
}
injectable!(Global);

#[derive(Debug)]
pub struct Request {
    global: Arc<Global>,
    id: u32,
}
injectable!(Request);

fn parent() -> Injector {
    let mut module = Module::new();
    module.bind::<Global>().to_singleton(Global { region: "eu-west" });
    Injector::new([module]).unwrap()
}

fn request_module(id: u32) -> Module {
    let mut module = Module::new();
    module
        .bind::<Request>()
        .to_constructor(move |global: Arc<Global>| Ok::<_, std::io::Error>(Request { global, id }));
    module
}

#[test]
fn test_child_resolves_parent_and_own_keys() {
    let parent = parent();
    let child = parent.child([request_module(7)]).unwrap();

    let request = child.get::<Request>().unwrap();
    assert_eq!(request.id, 7);
    assert_eq!(request.global.region, "eu-west");
    assert!(Arc::ptr_eq(&request.global, &parent.get::<Global>().unwrap()));
    assert!(child.contains(&Key::of::<Global>()));
    assert_eq!(child.len(), 1);
    assert!(child.parent().is_some());
}

#[test]
fn test_child_cannot_redeclare_parent_key() {
    let parent = parent();
    let mut module = Module::new();
    module.bind::<Global>().to_singleton(Global { region: "us-east" });

    let err = parent.child([module]).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AlreadyBound));

    // The parent is unaffected.
    assert_eq!(parent.get::<Global>().unwrap().region, "eu-west");
}

#[test]
fn test_parent_does_not_see_child_keys() {
    let parent = parent();
    let first = parent.child([request_module(1)]).unwrap();
    let second = parent.child([request_module(2)]).unwrap();

    assert_eq!(first.get::<Request>().unwrap().id, 1);
    assert_eq!(second.get::<Request>().unwrap().id, 2);
    assert_eq!(
        parent.get::<Request>().unwrap_err().kind(),
        Some(ErrorKind::NoBinding)
    );
    assert!(!parent.contains(&Key::of::<Request>()));
}

#[test]
fn test_grandchild_sees_every_ancestor() {
    let parent = parent();
    let child = parent.child([request_module(3)]).unwrap();

    let mut module = Module::new();
    module.bind_tagged_u32("retries").to_singleton(5u32);
    let grandchild = child
        .child_with_options(InjectorOptions::new().resolve_eager(false), [module])
        .unwrap();

    assert_eq!(grandchild.get::<Request>().unwrap().id, 3);
    assert_eq!(grandchild.get_tagged_u32("retries").unwrap(), 5);
    assert!(!grandchild.options().resolves_eager());
    assert!(child.options().resolves_eager());
}

#[test]
fn test_child_inputs_are_validated_against_parent() {
    let empty = Injector::new(Vec::new()).unwrap();
    let err = empty.child([request_module(9)]).unwrap_err();
    let err = err.as_binding().unwrap();
    assert_eq!(err.kind(), ErrorKind::NoBinding);
    assert_eq!(err.tag_value("key"), Some(Key::of::<Global>().to_string().as_str()));
}
