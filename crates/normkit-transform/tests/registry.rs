//! Tests for the capability registry and environments.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

use normkit_model::{NormkitError, Value};
use normkit_transform::{Loader, Provider, Registry, builtin};

#[test]
fn registered_provider_is_visible_immediately() {
    let registry = Registry::new();
    registry.register([Arc::new(builtin::text())]);

    let env = registry.instantiate(None);
    assert!(env.unit("strip").is_ok());
    assert_eq!(env.capability("strip").unwrap().provider(), "text");
}

#[test]
fn unregistered_names_are_not_defined() {
    let registry = Registry::new();
    let text = Arc::new(builtin::text());
    registry.register([Arc::clone(&text)]);
    registry.unregister([text]);

    let err = registry.instantiate(None).unit("strip").unwrap_err();
    assert!(matches!(err, NormkitError::UnitNotDefined { ref name } if name == "strip"));
}

#[test]
fn registering_twice_changes_nothing() {
    let registry = Registry::new();
    let text = Arc::new(builtin::text());

    registry.register([Arc::clone(&text)]);
    let once = registry.current();
    registry.register([Arc::clone(&text), Arc::clone(&text)]);
    let twice = registry.current();

    assert_eq!(once.provider_names(), twice.provider_names());
    assert_eq!(once.capability_names(), twice.capability_names());
}

#[test]
fn existing_environments_keep_their_snapshot() {
    let registry = Registry::new();
    let before = registry.instantiate(None);

    registry.register([Arc::new(builtin::text())]);
    let after = registry.instantiate(None);

    assert!(before.unit("strip").is_err());
    assert!(after.unit("strip").is_ok());

    registry.unregister([Arc::new(Provider::new("text"))]);
    assert!(after.unit("strip").is_ok(), "unregistering does not reach back");
    assert!(registry.instantiate(None).unit("strip").is_err());
}

#[test]
fn environment_display() {
    let registry = Registry::new();
    registry.register([Arc::new(builtin::text()), Arc::new(builtin::list())]);

    insta::assert_snapshot!(registry.instantiate(None).to_string(), @"#<Environment [list, text]>");
    let with_block = registry.instantiate(Some(normkit_transform::process(|value, _| Ok(value))));
    insta::assert_snapshot!(with_block.to_string(), @"#<Environment [list, text] with a block>");
}

#[test]
fn requirements_load_once_across_units() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let mut provider = Provider::new("legacy").with_loader(move |name: &str| -> anyhow::Result<()> {
        assert_eq!(name, "nkf");
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    provider.requires(["nkf"]);
    let upcase = provider.forward("upcase");
    let downcase = provider.forward("downcase");

    for _ in 0..3 {
        let resolved = (upcase.as_transform() | downcase.as_transform())
            .resolve()
            .unwrap();
        assert_eq!(resolved.call(Value::from("Ab")).unwrap(), Value::from("ab"));
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_load_surfaces_at_resolve() {
    let mut provider = Provider::new("legacy").with_loader(|name: &str| -> anyhow::Result<()> {
        anyhow::bail!("cannot load `{name}'")
    });
    provider.requires(["nkf"]);
    let upcase = provider.forward("upcase");

    let err = upcase.as_transform().resolve().unwrap_err();
    assert!(matches!(err, NormkitError::Load(_)));
    assert_eq!(err.to_string(), "cannot load `nkf'");
    assert!(!provider.requirements().is_loaded());
}

#[test]
fn loader_can_resolve_units_of_its_own_provider() {
    let mut provider = Provider::new("warm");
    provider.requires(["cache"]);
    let upcase = provider.forward("upcase").as_transform();
    let downcase = provider.forward("downcase").as_transform();

    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let sibling = upcase.clone();
    let loader: Arc<dyn Loader> = Arc::new(move |_: &str| -> anyhow::Result<()> {
        let warmed = sibling.resolve()?.call(Value::from("warm"))?;
        assert_eq!(warmed, Value::from("WARM"));
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    provider.requirements().set_loader(loader);

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = downcase
            .resolve()
            .and_then(|resolved| resolved.call(Value::from("AbC")));
        let _ = tx.send(result.map_err(|err| err.to_string()));
    });
    let result = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("resolve returned");

    assert_eq!(result, Ok(Value::from("abc")));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(upcase.resolve().is_ok());
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_resolves_load_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let mut provider = Provider::new("slow").with_loader(move |_: &str| -> anyhow::Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::yield_now();
        Ok(())
    });
    provider.requires(["a", "b"]);
    let strip = provider.forward("strip").as_transform();

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let strip = strip.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                strip.resolve().map(|_| ())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked").unwrap();
    }

    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test]
fn concurrent_registration_never_tears() {
    let registry = Arc::new(Registry::new());
    let writers: Vec<_> = (0..4)
        .map(|idx| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut provider = Provider::new(format!("p{idx}"));
                provider.forward(format!("op{idx}"));
                let provider = Arc::new(provider);
                for _ in 0..50 {
                    registry.register([Arc::clone(&provider)]);
                    let current = registry.current();
                    // a snapshot's table always matches its provider list
                    for name in current.provider_names() {
                        let op = format!("op{}", &name[1..]);
                        assert!(current.contains(&op));
                    }
                    registry.unregister([Arc::clone(&provider)]);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("thread panicked");
    }
    assert!(registry.current().provider_names().is_empty());
}
