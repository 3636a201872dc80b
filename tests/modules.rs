use ferrous_inject::{
    injectable, interface, BindingKind, Configure, ErrorKind, Injector, Key, Module, Override,
    Resolver,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub trait Mailer: Send + Sync {
    fn transport(&self) -> &'static str;
}
interface!(dyn Mailer);

pub struct Smtp;
impl Mailer for Smtp {
    fn transport(&self) -> &'static str {
        "smtp"
    }
}
injectable!(Smtp: dyn Mailer);

pub struct InMemory;
impl Mailer for InMemory {
    fn transport(&self) -> &'static str {
        "memory"
    }
}
injectable!(InMemory: dyn Mailer);

pub struct Signup {
    mailer: Arc<dyn Mailer>,
}
injectable!(Signup);

fn production() -> Module {
    let mut module = Module::new();
    module.bind::<dyn Mailer>().to_singleton(Smtp);
    module
        .bind::<Signup>()
        .to_constructor(|mailer: Arc<dyn Mailer>| Ok::<_, std::io::Error>(Signup { mailer }));
    module
}

#[test]
fn test_override_substitutes_a_dependency() {
    let source = production();
    let mut doubles = Module::new();
    doubles.bind::<dyn Mailer>().to_singleton(InMemory);
    let untouched = Module::new();

    let merged = Override::of(&source).with([&doubles, &untouched]);
    let injector = Injector::new([merged]).unwrap();
    assert_eq!(injector.get::<Signup>().unwrap().mailer.transport(), "memory");

    // The source module is unchanged and still usable.
    let original = Injector::new([source]).unwrap();
    assert_eq!(original.get::<Signup>().unwrap().mailer.transport(), "smtp");
}

#[test]
fn test_last_override_wins() {
    let source = production();
    let mut first = Module::new();
    first.bind::<dyn Mailer>().to_singleton(InMemory);
    let mut second = Module::new();
    second.bind::<dyn Mailer>().to_singleton(Smtp);

    let merged = Module::override_with(&source).with([&first, &second]);
    let injector = Injector::new([merged]).unwrap();
    assert_eq!(injector.get::<dyn Mailer>().unwrap().transport(), "smtp");
}

#[test]
fn test_override_keeps_keys_unique_to_either_side() {
    let source = production();
    let mut extra = Module::new();
    extra.bind_tagged::<dyn Mailer>("audit").to_singleton(InMemory);

    let merged = Override::of(&source).with([&extra]);
    assert_eq!(merged.len(), 3);
    assert_eq!(merged.binding_kind(&Key::of::<Signup>()), Some(BindingKind::Constructor));

    let injector = Injector::new([merged]).unwrap();
    assert_eq!(injector.get_tagged::<dyn Mailer>("audit").unwrap().transport(), "memory");
    assert_eq!(injector.get::<dyn Mailer>().unwrap().transport(), "smtp");
}

#[test]
fn test_duplicate_key_in_one_module_is_already_bound() {
    let mut module = Module::new();
    module.bind::<dyn Mailer>().to_singleton(Smtp);
    module.bind::<dyn Mailer>().to_singleton(InMemory);

    let err = Injector::new([module]).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AlreadyBound));
}

#[test]
fn test_duplicate_key_across_modules_is_already_bound() {
    let mut other = Module::new();
    other.bind::<dyn Mailer>().to_singleton(InMemory);

    let err = Injector::new([production(), other]).unwrap_err();
    let err = err.as_binding().unwrap();
    assert_eq!(err.kind(), ErrorKind::AlreadyBound);
    assert_eq!(err.tag_value("module"), Some("1"));
    assert_eq!(err.tag_value("key"), Some(Key::of::<dyn Mailer>().to_string().as_str()));
}

#[test]
fn test_dangling_alias_has_no_final_binding() {
    let mut module = Module::new();
    module.bind::<dyn Mailer>().to::<Smtp>();

    let err = Injector::new([module]).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NoFinalBinding));
}

#[test]
fn test_alias_target_in_another_module_is_not_final() {
    let mut values = Module::new();
    values.bind::<Smtp>().to_singleton(Smtp);
    let mut aliases = Module::new();
    aliases.bind::<dyn Mailer>().to::<Smtp>();

    let err = Injector::new([values, aliases]).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NoFinalBinding));
}

#[test]
fn test_alias_chain_through_tagged_key() {
    let mut module = Module::new();
    module.bind::<Smtp>().to_singleton(Smtp);
    module.bind::<dyn Mailer>().to::<Smtp>();
    module.bind_tagged::<dyn Mailer>("outbound").to::<dyn Mailer>();

    let injector = Injector::new([module]).unwrap();
    let mailer = injector.get_tagged::<dyn Mailer>("outbound").unwrap();
    assert_eq!(mailer.transport(), "smtp");
}

#[test]
fn test_declaration_errors_are_aggregated_per_module() {
    let mut module = Module::new();
    module.bind::<dyn Mailer>().to_singleton(Signup {
        mailer: Arc::new(Smtp),
    });
    module.bind_tagged::<Smtp>("").to_singleton(Smtp);
    module.builder().to_singleton(Smtp);

    let err = Injector::new([Module::new(), module]).unwrap_err();
    let err = err.as_binding().unwrap();
    assert_eq!(err.kind(), ErrorKind::AggregateDeclarationErrors);
    assert_eq!(err.tag_value("module"), Some("1"));

    let kinds: Vec<ErrorKind> = err.errors().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![ErrorKind::DoesNotImplement, ErrorKind::TagEmpty, ErrorKind::Nil]
    );
}

#[test]
fn test_declaration_error_names_the_tagged_key() {
    let mut module = Module::new();
    module.bind_tagged::<dyn Mailer>("x").to_singleton(Signup {
        mailer: Arc::new(Smtp),
    });

    let err = &module.errors()[0];
    assert_eq!(err.kind(), ErrorKind::DoesNotImplement);
    let expected = Key::tagged::<dyn Mailer>("x").to_string();
    assert_eq!(err.tag_value("key"), Some(expected.as_str()));
    assert!(expected.contains("(tag=x)"));
    assert_eq!(err.tags().iter().filter(|(name, _)| name == "key").count(), 1);
}

#[test]
fn test_key_marked_eager_twice_is_resolved_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let declare = |calls: &Arc<AtomicUsize>| {
        let counted = Arc::clone(calls);
        let mut module = Module::new();
        module.bind::<dyn Mailer>().eager().to_constructor(move || {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(Smtp)
        });
        module
    };

    let source = declare(&calls);
    let replacement = declare(&calls);
    let merged = Override::of(&source).with([&replacement]);
    assert_eq!(merged.eager_keys().len(), 2);

    let _injector = Injector::new([merged]).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

struct MailModule {
    testing: bool,
}

impl Configure for MailModule {
    fn configure(self, module: &mut Module) {
        if self.testing {
            module.bind::<dyn Mailer>().to_singleton(InMemory);
        } else {
            module.bind::<dyn Mailer>().to_singleton(Smtp);
        }
    }
}

#[test]
fn test_configure_units() {
    let module = Module::from_config(MailModule { testing: true });
    let injector = Injector::new([module]).unwrap();
    assert_eq!(injector.get::<dyn Mailer>().unwrap().transport(), "memory");

    let mut module = Module::new();
    module.configure(MailModule { testing: false }).configure(|m: &mut Module| {
        m.bind::<Signup>().to_singleton_constructor(|mailer: Arc<dyn Mailer>| {
            Ok::<_, std::io::Error>(Signup { mailer })
        });
    });
    let injector = Injector::new([module]).unwrap();
    assert_eq!(injector.get::<Signup>().unwrap().mailer.transport(), "smtp");
}
