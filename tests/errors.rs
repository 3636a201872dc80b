use ferrous_inject::{
    injectable, ErrorKind, InjectError, Injector, InjectorOptions, Key, Module, Resolver,
};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, PartialEq)]
struct QuotaExceeded {
    limit: u32,
}

impl fmt::Display for QuotaExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quota of {} exceeded", self.limit)
    }
}

impl std::error::Error for QuotaExceeded {}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug)]
pub struct Session;
injectable!(Session);

#[derive(Debug)]
pub struct Database;
injectable!(Database);

pub struct Repository {
    _db: Arc<Database>,
}
injectable!(Repository);

#[test]
fn test_producer_error_is_returned_unchanged() {
    let mut module = Module::new();
    module
        .bind::<Session>()
        .to_constructor(|| Err::<Session, _>(QuotaExceeded { limit: 3 }));

    let injector = Injector::new([module]).unwrap();
    let err = injector.get::<Session>().unwrap_err();
    assert_eq!(err.kind(), None);
    assert!(err.as_binding().is_none());
    assert_eq!(
        err.producer_error().unwrap().downcast_ref::<QuotaExceeded>(),
        Some(&QuotaExceeded { limit: 3 })
    );
    assert_eq!(err.to_string(), "quota of 3 exceeded");
}

#[test]
fn test_forwarded_inject_error_is_not_nested() {
    let mut module = Module::new();
    module.bind::<Session>().to_constructor(|| {
        Err::<Session, _>(InjectError::from(
            ferrous_inject::BindingError::new(ErrorKind::NotSupportedYet).tag("feature", "pooling"),
        ))
    });

    let injector = Injector::new([module]).unwrap();
    let err = injector.get::<Session>().unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotSupportedYet));
    assert_eq!(err.as_binding().unwrap().tag_value("feature"), Some("pooling"));
}

#[test]
fn test_unbound_input_names_the_dependent() {
    init_tracing();
    let mut module = Module::new();
    module
        .bind::<Repository>()
        .to_constructor(|db: Arc<Database>| Ok::<_, std::io::Error>(Repository { _db: db }));

    let err = Injector::new([module]).unwrap_err();
    let err = err.as_binding().unwrap();
    assert_eq!(err.kind(), ErrorKind::NoBinding);
    assert_eq!(err.tag_value("key"), Some(Key::of::<Database>().to_string().as_str()));
    assert_eq!(
        err.tag_value("required_by"),
        Some(Key::of::<Repository>().to_string().as_str())
    );
    assert!(err.to_string().starts_with("inject: NoBinding tags{"));
}

#[test]
fn test_query_for_unknown_key() {
    let injector = Injector::new(Vec::new()).unwrap();
    let err = injector.get_tagged::<Database>("replica").unwrap_err();
    let err = err.as_binding().unwrap();
    assert_eq!(err.kind(), ErrorKind::NoBinding);
    assert_eq!(
        err.to_string(),
        format!("inject: NoBinding tags{{key:{}(tag=replica)}}", std::any::type_name::<Database>())
    );
}

#[test]
fn test_empty_tag_in_query() {
    let injector = Injector::new(Vec::new()).unwrap();
    assert_eq!(
        injector.get_tagged::<Database>("").unwrap_err().kind(),
        Some(ErrorKind::TagEmpty)
    );
    assert_eq!(
        injector.get_tagged_string("").unwrap_err().kind(),
        Some(ErrorKind::TagEmpty)
    );
}

#[test]
fn test_eager_failure_aborts_construction() {
    init_tracing();
    let mut module = Module::new();
    module
        .bind::<Session>()
        .eager()
        .to_singleton_constructor(|| Err::<Session, _>(QuotaExceeded { limit: 1 }));

    let err = Injector::new([module.clone()]).unwrap_err();
    assert!(err.producer_error().unwrap().is::<QuotaExceeded>());

    let options = InjectorOptions::new().resolve_eager(false);
    let injector = Injector::with_options(options, [module]).unwrap();
    assert!(injector.get::<Session>().is_err());
}

#[test]
fn test_construction_failure_runs_no_producer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let mut module = Module::new();
    module.bind::<Database>().eager().to_singleton_constructor(move || {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok::<_, std::io::Error>(Database)
    });
    module
        .bind::<Repository>()
        .to_constructor(|db: Arc<Database>| Ok::<_, std::io::Error>(Repository { _db: db }));
    module.bind::<Repository>().to_singleton(Repository {
        _db: Arc::new(Database),
    });

    let err = Injector::new([module]).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AlreadyBound));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_aggregate_display_lists_inner_errors() {
    let mut module = Module::new();
    module.bind_tagged::<Session>("").to_singleton(Session);
    module.builder().to_singleton(Session);

    let err = Injector::new([module]).unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.starts_with("inject: AggregateDeclarationErrors tags{"));
    assert!(rendered.contains("count:2"));
    assert!(rendered.contains("errors[inject: TagEmpty"));
    assert!(rendered.contains("; inject: Nil"));
}
